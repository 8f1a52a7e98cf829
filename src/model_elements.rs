/// Defines the contracts through which a robot description is read
pub mod description;

/// Defines the different frame elements that are used to create a kinematic tree
pub mod frame_elements;

/// Defines the kinematic tree.
pub mod model;
