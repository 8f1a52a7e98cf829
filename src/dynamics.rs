//! Inverse dynamics for a [KinematicTree] based on the recursive Newton-Euler algorithm.
//!
//! The outward pass (velocities and accelerations from the root to the leaves) and the inward
//! pass (forces and torques from the leaves to the root) are combined in a single recursion.
//! All quantities of a link are expressed in the frame of that link.
//!
//! ## References
//!
//! * Roy Featherstone, Rigid Body Dynamics Algorithms, Springer 2008, chapter 5.3

use nalgebra::Vector3;
use tracing::trace;

use crate::{
    joint_state::JointCommands,
    linear_algebra::matrix::Matrix,
    model_elements::{
        frame_elements::{JointID, JointType, LinkID},
        model::KinematicTree,
    },
};

#[cfg(test)]
#[path = "dynamics_tests.rs"]
mod dynamics_tests;

impl KinematicTree {
    /// Calculates the torque, or force for prismatic joints, required at every movable joint to
    /// produce the joint velocities and accelerations of the last forward kinematics update.
    ///
    /// Gravity is included by accelerating the base in the opposite direction, e.g.
    /// `[0, 0, 9.81]` for gravity along the negative Z-axis of the base frame.
    ///
    /// The results are stored on the joints and can be read with [KinematicTree::read_torques].
    pub fn inverse_dynamics(&mut self, base_acceleration: Vector3<f64>) {
        let root = self.root();
        let (force, torque) = self.newton_euler(
            root,
            Vector3::zeros(),
            Vector3::zeros(),
            base_acceleration,
        );
        trace!(
            "Base reaction force {:?} and torque {:?}",
            force.as_slice(),
            torque.as_slice()
        );
    }

    /// Returns the torques of the chain as an Nx1 matrix in chain order.
    pub fn read_torques(&self, chain: &[JointID]) -> Matrix {
        Matrix::from_vec(chain.iter().map(|id| self.joint(*id).tau()).collect())
    }

    /// Updates the joint states with 'commands' and calculates the joint torques for gravity
    /// along the negative Z-axis of the base frame.
    pub fn rnea(&mut self, commands: &JointCommands, gravity: f64) {
        self.update_state(commands);
        self.update_dynamics(gravity);
    }

    /// Calculates the joint torques for gravity along the negative Z-axis of the base frame.
    pub fn update_dynamics(&mut self, gravity: f64) {
        self.inverse_dynamics(Vector3::new(0.0, 0.0, gravity));
    }

    /// Returns the force and the torque around the link origin that the parent joint exerts on
    /// the given link and its descendants.
    ///
    /// ## Parameters
    ///
    /// * 'link' - The link
    /// * 'w' - The angular velocity of the link
    /// * 'dw' - The angular acceleration of the link
    /// * 'a' - The linear acceleration of the link origin
    fn newton_euler(
        &mut self,
        link: LinkID,
        w: Vector3<f64>,
        dw: Vector3<f64>,
        a: Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let dynamics = *self.link(link).dynamics();
        let rc = *dynamics.center_of_mass();
        let inertia = *dynamics.moment_of_inertia();

        let a_c = a + dw.cross(&rc) + w.cross(&w.cross(&rc));
        let inertial_force = a_c * dynamics.mass_in_kg();

        let mut force = inertial_force;
        let mut torque = inertia * dw + w.cross(&(inertia * w)) + rc.cross(&inertial_force);

        let children = self.children(link).to_vec();
        for id in children {
            let joint = self.joint(id);
            let rot = joint.local().rot;
            let p = joint.local().pos;
            let z = joint.joint_type().axis();
            let qd = joint.velocity();
            let qdd = joint.acceleration();
            let child = joint.child();
            let joint_type = joint.joint_type();

            let w_parent = rot.inverse() * w;
            let mut w_child = w_parent;
            let mut dw_child = rot.inverse() * dw;
            let mut a_child = rot.inverse() * (a + dw.cross(&p) + w.cross(&w.cross(&p)));
            match joint_type {
                JointType::RevoluteX | JointType::RevoluteY | JointType::RevoluteZ => {
                    w_child += z * qd;
                    dw_child += z * qdd + w_parent.cross(&(z * qd));
                }
                JointType::PrismaticX | JointType::PrismaticY | JointType::PrismaticZ => {
                    a_child += z * qdd + w_parent.cross(&(z * qd)) * 2.0;
                }
                JointType::Fixed => {}
            }

            let (f, n) = self.newton_euler(child, w_child, dw_child, a_child);
            let f_parent = rot * f;
            force += f_parent;
            torque += rot * n + p.cross(&f_parent);
        }

        if let Some(parent) = self.parent(link) {
            let joint = self.joint_mut(parent);
            let z = joint.joint_type().axis();
            joint.tau = match joint.joint_type() {
                JointType::RevoluteX | JointType::RevoluteY | JointType::RevoluteZ => {
                    torque.dot(&z)
                }
                JointType::PrismaticX | JointType::PrismaticY | JointType::PrismaticZ => {
                    force.dot(&z)
                }
                JointType::Fixed => 0.0,
            };
        }

        (force, torque)
    }
}
