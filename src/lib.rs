#![warn(missing_docs)]

//! Kinematics and dynamics for serial-link manipulators described as a kinematic tree.
//!
//! Provides forward kinematics, velocity Jacobians, inverse dynamics based on the recursive
//! Newton-Euler algorithm and a closed-form inverse kinematics solver for 6 axis arms with a
//! spherical wrist.

use thiserror::Error;

/// Defines a small dense matrix library with zero-copy views.
pub mod linear_algebra;

/// Defines the robot description contracts and the kinematic tree.
pub mod model_elements;

/// Defines the commanded state of the joints.
pub mod joint_state;

/// Provides forward kinematics and Jacobian calculations.
pub mod kinematics;

/// Provides inverse dynamics calculations.
pub mod dynamics;

/// Provides the closed-form inverse kinematics solver for 6 axis arms.
pub mod inverse_kinematics;

#[cfg(test)]
mod test_support;

/// Defines the different errors for the serial chain crate.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The robot description does not contain exactly one link without a parent joint.
    #[error("Expected exactly one root link, found {count}")]
    NoUniqueRoot {
        /// The number of links without a parent joint
        count: usize,
    },

    /// A joint refers to a link that does not exist.
    #[error("Joint '{joint}' refers to the unknown link '{link}'")]
    MissingLink {
        /// The name of the joint
        joint: String,
        /// The name of the missing link
        link: String,
    },

    /// More than one link uses the same name.
    #[error("A link with the name '{name}' already exists")]
    DuplicateLink {
        /// The duplicated name
        name: String,
    },

    /// More than one joint uses the same name.
    #[error("A joint with the name '{name}' already exists")]
    DuplicateJoint {
        /// The duplicated name
        name: String,
    },

    /// A link is the child of more than one joint.
    #[error("Link '{link}' has more than one parent joint")]
    LinkHasMultipleParents {
        /// The name of the link
        link: String,
    },

    /// A movable joint does not have a unit axis along one of the principal axes.
    #[error("Joint '{joint}' does not have a principal unit axis")]
    InvalidJointAxis {
        /// The name of the joint
        joint: String,
    },

    /// A link cannot be reached from the root link.
    #[error("Link '{link}' cannot be reached from the root link")]
    UnreachableLink {
        /// The name of the link
        link: String,
    },

    /// No link with the given name exists in the tree.
    #[error("Link not found: {name}")]
    UnknownLink {
        /// The name that was searched for
        name: String,
    },

    /// No joint with the given name exists in the tree.
    #[error("Joint not found: {name}")]
    UnknownJoint {
        /// The name that was searched for
        name: String,
    },

    /// The robot model file could not be read.
    #[error("Robot model file not found: {path}")]
    ModelFileNotFound {
        /// The path of the file
        path: String,
    },

    /// The robot model document could not be parsed.
    #[error("Failed to parse the robot model: {reason}")]
    FailedToParseModel {
        /// The reason reported by the parser
        reason: String,
    },

    /// The chain does not contain exactly six movable joints.
    #[error("The analytic solver requires 6 movable joints, the chain has {joints}")]
    UnsupportedIkChain {
        /// The number of movable joints in the chain
        joints: usize,
    },

    /// The chain geometry does not match the arrangement the analytic solver expects.
    #[error("The chain geometry is not supported by the analytic solver: {reason}")]
    IncompatibleIkGeometry {
        /// A description of the mismatch
        reason: String,
    },
}
