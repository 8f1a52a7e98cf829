//! Defines the different frame elements that are used to create a kinematic tree

extern crate nalgebra as na;

use std::fmt::Display;

use na::{Isometry3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};

#[cfg(test)]
#[path = "frame_elements_tests.rs"]
mod frame_elements_tests;

/// Defines the degree-of-freedom of a joint relative to its parent link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JointType {
    /// The child link is static relative to the parent link.
    Fixed,
    /// The child link rotates around the X-axis of the joint frame.
    RevoluteX,
    /// The child link rotates around the Y-axis of the joint frame.
    RevoluteY,
    /// The child link rotates around the Z-axis of the joint frame.
    RevoluteZ,
    /// The child link translates along the X-axis of the joint frame.
    PrismaticX,
    /// The child link translates along the Y-axis of the joint frame.
    PrismaticY,
    /// The child link translates along the Z-axis of the joint frame.
    PrismaticZ,
}

impl JointType {
    /// Returns the unit vector of the axis of motion in the joint frame. Returns a zero
    /// vector for [JointType::Fixed].
    pub fn axis(&self) -> Vector3<f64> {
        match self.axis_index() {
            Some(index) => {
                let mut axis = Vector3::zeros();
                axis[index] = 1.0;
                axis
            }
            None => Vector3::zeros(),
        }
    }

    /// Returns the index of the principal axis of motion, or `None` for a fixed joint.
    pub fn axis_index(&self) -> Option<usize> {
        match self {
            JointType::Fixed => None,
            JointType::RevoluteX | JointType::PrismaticX => Some(0),
            JointType::RevoluteY | JointType::PrismaticY => Some(1),
            JointType::RevoluteZ | JointType::PrismaticZ => Some(2),
        }
    }

    /// Classifies a joint from the type string of its description and the index of its axis.
    ///
    /// `revolute` and `prismatic` select the variant along 'axis', any other type string
    /// results in [JointType::Fixed].
    ///
    /// ## Panics
    ///
    /// Panics if the joint is movable and 'axis' is not 0, 1 or 2.
    pub fn from_description(kind: &str, axis: usize) -> Self {
        let select = |x, y, z| match axis {
            0 => x,
            1 => y,
            2 => z,
            _ => panic!("JointType: axis index {} is not a principal axis", axis),
        };

        match kind {
            "revolute" => select(
                JointType::RevoluteX,
                JointType::RevoluteY,
                JointType::RevoluteZ,
            ),
            "prismatic" => select(
                JointType::PrismaticX,
                JointType::PrismaticY,
                JointType::PrismaticZ,
            ),
            _ => JointType::Fixed,
        }
    }

    /// Returns a value indicating if the joint has a degree-of-freedom.
    pub fn is_movable(&self) -> bool {
        *self != JointType::Fixed
    }

    /// Returns a value indicating if the joint translates along its axis.
    pub fn is_prismatic(&self) -> bool {
        matches!(
            self,
            JointType::PrismaticX | JointType::PrismaticY | JointType::PrismaticZ
        )
    }

    /// Returns a value indicating if the joint rotates around its axis.
    pub fn is_revolute(&self) -> bool {
        matches!(
            self,
            JointType::RevoluteX | JointType::RevoluteY | JointType::RevoluteZ
        )
    }

    /// Returns the transform generated by moving the joint to position 'q'.
    ///
    /// 'q' is an angle in radians for revolute joints and a distance in meters for
    /// prismatic joints. Fixed joints always return the identity.
    pub fn motion(&self, q: f64) -> Transform {
        match self {
            JointType::Fixed => Transform::identity(),
            JointType::RevoluteX => Transform::from_rotation(Rotation3::from_axis_angle(
                &Vector3::x_axis(),
                q,
            )),
            JointType::RevoluteY => Transform::from_rotation(Rotation3::from_axis_angle(
                &Vector3::y_axis(),
                q,
            )),
            JointType::RevoluteZ => Transform::from_rotation(Rotation3::from_axis_angle(
                &Vector3::z_axis(),
                q,
            )),
            JointType::PrismaticX | JointType::PrismaticY | JointType::PrismaticZ => {
                Transform::from_translation(self.axis() * q)
            }
        }
    }
}

/// A rigid pose, i.e. a rotation and a position, relative to a reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// The orientation relative to the reference frame.
    pub rot: Rotation3<f64>,

    /// The position relative to the reference frame.
    pub pos: Vector3<f64>,
}

impl Transform {
    /// Applies 'delta', expressed in the local frame of the current transform, to the current
    /// transform.
    pub fn apply(&mut self, delta: &Transform) {
        self.pos += self.rot * delta.pos;
        self.rot *= delta.rot;
    }

    /// Returns the transform obtained by applying 'delta' to the current transform.
    pub fn compose(&self, delta: &Transform) -> Transform {
        let mut result = *self;
        result.apply(delta);
        result
    }

    /// Creates a pure rotation.
    pub fn from_rotation(rot: Rotation3<f64>) -> Self {
        Self {
            rot,
            pos: Vector3::zeros(),
        }
    }

    /// Creates a pure translation.
    pub fn from_translation(pos: Vector3<f64>) -> Self {
        Self {
            rot: Rotation3::identity(),
            pos,
        }
    }

    /// Creates a transform from a position and the angles `[w, p, r]`.
    ///
    /// The rotation is composed as `Rz(r) * Ry(p) * Rx(w)`, i.e. yaw around X, pitch around Y
    /// and roll around Z.
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            rot: Rotation3::from_euler_angles(rpy[0], rpy[1], rpy[2]),
            pos: Vector3::new(xyz[0], xyz[1], xyz[2]),
        }
    }

    /// Returns the identity transform.
    pub fn identity() -> Self {
        Self {
            rot: Rotation3::identity(),
            pos: Vector3::zeros(),
        }
    }

    /// Returns the inverse transform.
    pub fn inverse(&self) -> Self {
        let rot = self.rot.inverse();
        Self {
            pos: -(rot * self.pos),
            rot,
        }
    }

    /// Creates a new transform.
    pub fn new(rot: Rotation3<f64>, pos: Vector3<f64>) -> Self {
        Self { rot, pos }
    }

    /// Returns the transform as a 4x4 homogeneous matrix.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut h = self.rot.to_homogeneous();
        h.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.pos);
        h
    }

    /// Returns the transform as an isometry.
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.pos),
            UnitQuaternion::from_rotation_matrix(&self.rot),
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Defines a unique ID for a [Link] within a kinematic tree.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LinkID {
    /// The position of the link in the tree storage.
    index: usize,
}

impl LinkID {
    /// Returns the position of the link in the tree storage.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Display for LinkID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinkID [{}]", self.index)
    }
}

/// Defines a unique ID for a [Joint] within a kinematic tree.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JointID {
    /// The position of the joint in the tree storage.
    index: usize,
}

impl JointID {
    /// Returns the position of the joint in the tree storage.
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }
}

impl Display for JointID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JointID [{}]", self.index)
    }
}

/// The inertial parameters of a link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkDynamics {
    /// Defines the mass of the link in kg.
    mass_in_kg: f64,
    /// Stores the location of the center of mass of the link, relative to the
    /// link frame.
    center_of_mass: Vector3<f64>,
    /// Stores the moments of inertia of the link around its center of mass.
    moment_of_inertia: Matrix3<f64>,
}

impl LinkDynamics {
    /// Returns the location of the center of mass, relative to the link frame.
    pub fn center_of_mass(&self) -> &Vector3<f64> {
        &self.center_of_mass
    }

    /// Creates the inertial parameters from the upper triangle of the inertia tensor, given
    /// as `[ixx, ixy, ixz, iyy, iyz, izz]`.
    pub fn from_upper_triangle(mass: f64, center_of_mass: [f64; 3], inertia: [f64; 6]) -> Self {
        let [ixx, ixy, ixz, iyy, iyz, izz] = inertia;
        Self::new(
            mass,
            Vector3::from(center_of_mass),
            Matrix3::new(ixx, ixy, ixz, ixy, iyy, iyz, ixz, iyz, izz),
        )
    }

    /// Returns the mass in kg.
    pub fn mass_in_kg(&self) -> f64 {
        self.mass_in_kg
    }

    /// Returns the moments of inertia around the center of mass.
    pub fn moment_of_inertia(&self) -> &Matrix3<f64> {
        &self.moment_of_inertia
    }

    /// Creates a new LinkDynamics.
    ///
    /// ## Parameters
    ///
    /// * 'mass' - The mass in kg of the link
    /// * 'center_of_mass' - The location of the center of mass relative to the link frame
    /// * 'moment_of_inertia' - The moment of inertia around the center of mass
    pub fn new(mass: f64, center_of_mass: Vector3<f64>, moment_of_inertia: Matrix3<f64>) -> Self {
        Self {
            mass_in_kg: mass,
            center_of_mass,
            moment_of_inertia,
        }
    }
}

/// Defines a rigid body in a kinematic tree.
#[derive(Clone, Debug)]
pub struct Link {
    /// The human readable name of the link.
    name: String,

    /// The joints that connect this link to its children.
    pub(crate) children: Vec<JointID>,

    /// The joint that connects this link to its parent, `None` for the root.
    pub(crate) parent: Option<JointID>,

    /// The pose of the link in the base frame.
    pub(crate) state: Transform,

    /// The inertial parameters.
    dynamics: LinkDynamics,
}

impl Link {
    /// Returns the joints that connect the link to its children.
    pub fn children(&self) -> &[JointID] {
        &self.children
    }

    /// Returns the inertial parameters of the link.
    pub fn dynamics(&self) -> &LinkDynamics {
        &self.dynamics
    }

    /// Returns the name of the link.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new link without a parent or children.
    pub fn new(name: String, dynamics: LinkDynamics) -> Self {
        Self {
            name,
            children: Vec::new(),
            parent: None,
            state: Transform::identity(),
            dynamics,
        }
    }

    /// Returns the joint that connects the link to its parent.
    pub fn parent(&self) -> Option<JointID> {
        self.parent
    }

    /// Returns the pose of the link in the base frame as computed by the last
    /// forward kinematics update.
    pub fn state(&self) -> &Transform {
        &self.state
    }
}

/// Defines a connection with at most one degree-of-freedom between two links.
#[derive(Clone, Debug)]
pub struct Joint {
    /// The human readable name of the joint.
    name: String,

    /// The degree-of-freedom of the joint.
    joint_type: JointType,

    /// The link the joint is attached to.
    parent: LinkID,

    /// The link the joint moves.
    child: LinkID,

    /// The pose of the joint frame relative to the parent link frame.
    trans: Transform,

    /// The constant transform composed with the current joint motion.
    pub(crate) local: Transform,

    /// The lower and upper limit of the joint motion.
    limits: (f64, f64),

    /// The zero offset used by the analytic 6 axis solver.
    deflection: Option<f64>,

    /// The angle or displacement of the last forward kinematics update.
    pub(crate) position: f64,

    /// The velocity of the last forward kinematics update.
    pub(crate) velocity: f64,

    /// The acceleration of the last forward kinematics update.
    pub(crate) acceleration: f64,

    /// The torque or force along the joint axis computed by the last dynamics update.
    pub(crate) tau: f64,
}

impl Joint {
    /// Returns the acceleration used in the last forward kinematics update.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Returns the link the joint moves.
    pub fn child(&self) -> LinkID {
        self.child
    }

    /// Returns the zero offset used by the analytic 6 axis solver, if one was described.
    pub fn deflection(&self) -> Option<f64> {
        self.deflection
    }

    /// Returns the degree-of-freedom of the joint.
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Returns the lower and upper limit of the joint motion.
    pub fn limits(&self) -> (f64, f64) {
        self.limits
    }

    /// Returns the pose of the child link relative to the parent link for the current
    /// joint position.
    pub fn local(&self) -> &Transform {
        &self.local
    }

    /// Returns the name of the joint.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new Joint.
    ///
    /// ## Parameters
    ///
    /// * 'name' - The name of the joint
    /// * 'joint_type' - The degree-of-freedom of the joint
    /// * 'parent' - The link the joint is attached to
    /// * 'child' - The link the joint moves
    /// * 'trans' - The pose of the joint frame relative to the parent link frame
    /// * 'limits' - The lower and upper limit of the joint motion
    /// * 'deflection' - The zero offset used by the analytic 6 axis solver
    pub fn new(
        name: String,
        joint_type: JointType,
        parent: LinkID,
        child: LinkID,
        trans: Transform,
        limits: (f64, f64),
        deflection: Option<f64>,
    ) -> Self {
        Self {
            name,
            joint_type,
            parent,
            child,
            trans,
            local: trans,
            limits,
            deflection,
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            tau: 0.0,
        }
    }

    /// Returns the link the joint is attached to.
    pub fn parent(&self) -> LinkID {
        self.parent
    }

    /// Returns the position used in the last forward kinematics update.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Returns the torque, or force for prismatic joints, along the joint axis computed by the
    /// last dynamics update.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Returns the constant pose of the joint frame relative to the parent link frame.
    pub fn trans(&self) -> &Transform {
        &self.trans
    }

    /// Returns the velocity used in the last forward kinematics update.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}
