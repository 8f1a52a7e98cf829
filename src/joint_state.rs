//! Defines the commanded state of the joints of a kinematic tree.

use std::collections::HashMap;

#[cfg(test)]
#[path = "joint_state_tests.rs"]
mod joint_state_tests;

/// Stores the position and motion state for a given joint.
///
/// A joint has at most 1 degree-of-freedom, so the stored state refers to this
/// degree-of-freedom, i.e. if the joint has a revolute degree-of-freedom then the state
/// refers to a rotational position, velocity and acceleration. On the other hand if the joint
/// has a prismatic degree-of-freedom then the state refers to a linear position, velocity
/// and acceleration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JointState {
    /// The position of the joint.
    position: f64,

    /// The velocity of the joint.
    velocity: f64,

    /// The acceleration of the joint.
    acceleration: f64,
}

impl JointState {
    /// Returns the acceleration of the joint.
    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Creates a new [JointState] instance
    ///
    /// ## Parameters
    ///
    /// * 'position' - The position of the joint
    /// * 'velocity' - The velocity of the joint
    /// * 'acceleration' - The acceleration of the joint
    pub fn new(position: f64, velocity: f64, acceleration: f64) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// Returns the position of the joint.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Returns the velocity of the joint.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }
}

impl From<[f64; 3]> for JointState {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// Maps joint names to their commanded state.
///
/// Joints that are missing from the map are commanded to the zero state. Names that do not
/// belong to a movable joint of the tree are ignored.
pub type JointCommands = HashMap<String, JointState>;

/// Looks up the commanded state of a joint, defaulting to the zero state.
pub(crate) fn commanded_state(commands: &JointCommands, name: &str) -> JointState {
    commands.get(name).copied().unwrap_or_default()
}
