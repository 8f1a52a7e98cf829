//! Forward kinematics and velocity Jacobians for a [KinematicTree].
//!
//! [KinematicTree::update_state] propagates the joint commands from the root of the tree to
//! the leaves and stores the pose of every link in the base frame. The Jacobian and the
//! inverse dynamics read those poses, so they have to be calculated after an update with the
//! configuration of interest.

use nalgebra::Vector3;

use crate::{
    joint_state::{commanded_state, JointCommands, JointState},
    linear_algebra::matrix::{Matrix, MatrixViewMut},
    model_elements::{
        frame_elements::{JointID, JointType, LinkID, Transform},
        model::KinematicTree,
    },
    Error,
};

#[cfg(test)]
#[path = "kinematics_tests.rs"]
mod kinematics_tests;

/// Returns the linear and angular velocity contribution of a joint with a unit velocity.
///
/// ## Parameters
///
/// * 'joint_type' - The degree-of-freedom of the joint
/// * 'axis' - The joint axis in the base frame
/// * 'arm' - The vector from the joint origin to the end effector in the base frame
fn jacobian_column(
    joint_type: JointType,
    axis: Vector3<f64>,
    arm: Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    match joint_type {
        JointType::RevoluteX | JointType::RevoluteY | JointType::RevoluteZ => {
            (axis.cross(&arm), axis)
        }
        JointType::PrismaticX | JointType::PrismaticY | JointType::PrismaticZ => {
            (axis, Vector3::zeros())
        }
        JointType::Fixed => (Vector3::zeros(), Vector3::zeros()),
    }
}

impl KinematicTree {
    /// Calculates the 6xN Jacobian of the end effector for the given chain of joints.
    ///
    /// Column `i` belongs to `chain[i]`. Rows 0 to 2 hold the linear velocity of the end
    /// effector origin and rows 3 to 5 the angular velocity, both in the base frame. The
    /// Jacobian is calculated for the configuration of the last [KinematicTree::update_state]
    /// call.
    ///
    /// ## Parameters
    ///
    /// * 'end_effector' - The link whose velocity is described
    /// * 'chain' - The movable joints, usually obtained from [KinematicTree::predecessors]
    pub fn jacobian(&self, end_effector: LinkID, chain: &[JointID]) -> Matrix {
        let end_effector_position = self.link(end_effector).state().pos;

        let mut jacobian = Matrix::zeros(6, chain.len());
        for (column, id) in chain.iter().enumerate() {
            let joint = self.joint(*id);
            let frame = self.link(joint.child()).state();

            let axis = frame.rot * joint.joint_type().axis();
            let (linear, angular) = jacobian_column(
                joint.joint_type(),
                axis,
                end_effector_position - frame.pos,
            );

            jacobian.block_mut(0, column, 3, 1).insert(&linear);
            jacobian.block_mut(3, column, 3, 1).insert(&angular);
        }

        jacobian
    }

    /// Captures the current position, velocity and acceleration of the joints in the chain.
    pub fn joint_commands(&self, chain: &[JointID]) -> JointCommands {
        chain
            .iter()
            .map(|id| {
                let joint = self.joint(*id);
                (
                    joint.name().to_string(),
                    JointState::new(joint.position(), joint.velocity(), joint.acceleration()),
                )
            })
            .collect()
    }

    /// Returns the pose in the base frame of the link with the given name, as calculated by the
    /// last forward kinematics update.
    ///
    /// ## Errors
    ///
    /// * [Error::UnknownLink] - Returned when no link with the given name exists.
    pub fn link_state(&self, name: &str) -> Result<&Transform, Error> {
        let id = self.find_link(name)?;
        Ok(self.link(id).state())
    }

    /// Returns the movable joints between the root and the given link, ordered from the root
    /// towards the link.
    ///
    /// The order defines the column order of [KinematicTree::jacobian] and the row order of the
    /// joint torques.
    pub fn predecessors(&self, link: LinkID) -> Vec<JointID> {
        let mut chain = Vec::new();
        let mut current = self.parent(link);
        while let Some(id) = current {
            let joint = self.joint(id);
            if joint.joint_type().is_movable() {
                chain.push(id);
            }

            current = self.parent(joint.parent());
        }

        chain.reverse();
        chain
    }

    /// Propagates the joint commands through the tree and updates the pose of every link.
    ///
    /// Movable joints that are not commanded are moved to the zero state. Fixed joints ignore
    /// any command.
    pub fn update_state(&mut self, commands: &JointCommands) {
        let root = self.root();
        self.link_mut(root).state = Transform::identity();
        self.update_link_state(root, commands);
    }

    fn update_link_state(&mut self, link: LinkID, commands: &JointCommands) {
        let state = *self.link(link).state();

        let children = self.children(link).to_vec();
        for id in children {
            let joint = self.joint_mut(id);
            if joint.joint_type().is_movable() {
                let command = commanded_state(commands, joint.name());
                joint.position = command.position();
                joint.velocity = command.velocity();
                joint.acceleration = command.acceleration();
            }

            joint.local = joint
                .trans()
                .compose(&joint.joint_type().motion(joint.position));

            let child = joint.child();
            let local = joint.local;
            self.link_mut(child).state = state.compose(&local);
            self.update_link_state(child, commands);
        }
    }
}
