//! Defines the contracts through which a robot description is consumed.
//!
//! The kinematic tree is built from any type that implements [RobotDescription]. The crate
//! provides [RobotModel], a plain set of link and joint records which can be created in
//! code or loaded from a TOML document.
//!
//! ## TOML layout
//!
//! ```toml
//! name = "arm"
//!
//! [[links]]
//! name = "base_link"
//! mass = 2.0
//! center_of_mass = [0.0, 0.0, 0.05]
//! inertia = [0.01, 0.0, 0.0, 0.01, 0.0, 0.01]
//!
//! [[links]]
//! name = "link1"
//!
//! [[joints]]
//! name = "joint1"
//! type = "revolute"
//! parent = "base_link"
//! child = "link1"
//! xyz = [0.0, 0.0, 0.1]
//! axis = [0.0, 0.0, 1.0]
//! limits = { lower = -3.0, upper = 3.0 }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;

#[cfg(test)]
#[path = "description_tests.rs"]
mod description_tests;

/// Provides access to the description of a single link.
pub trait LinkDescription {
    /// Returns the unique name of the link.
    fn name(&self) -> &str;

    /// Returns the mass of the link in kg.
    fn mass(&self) -> f64;

    /// Returns the location of the center of mass in the link frame.
    fn mass_center(&self) -> [f64; 3];

    /// Returns the upper triangle of the inertia tensor about the center of mass, in the order
    /// `[ixx, ixy, ixz, iyy, iyz, izz]`.
    fn inertia(&self) -> [f64; 6];
}

/// Provides access to the description of a single joint.
pub trait JointDescription {
    /// Returns the unique name of the joint.
    fn name(&self) -> &str;

    /// Returns the joint type, e.g. `revolute`, `prismatic` or `fixed`.
    fn joint_type(&self) -> &str;

    /// Returns the name of the parent link.
    fn parent_link(&self) -> &str;

    /// Returns the name of the child link.
    fn child_link(&self) -> &str;

    /// Returns the position of the joint frame in the parent link frame.
    fn xyz(&self) -> [f64; 3];

    /// Returns the orientation of the joint frame in the parent link frame as the angles
    /// `[w, p, r]` around the X, Y and Z axes.
    fn rpy(&self) -> [f64; 3];

    /// Returns the index of the one-hot axis vector, or `None` if the axis vector is
    /// not a positive unit vector along one of the principal axes.
    fn axis(&self) -> Option<usize>;

    /// Returns the lower and upper limit of the joint motion.
    fn limits(&self) -> (f64, f64);

    /// Returns the constant angle that aligns the zero position of an analytic 6 axis
    /// solver with the zero position of the joint, if one is defined.
    fn ik6_deflection(&self) -> Option<f64>;
}

/// Provides access to all the links and joints that make up a robot.
pub trait RobotDescription {
    /// The link description type.
    type Link: LinkDescription;

    /// The joint description type.
    type Joint: JointDescription;

    /// Returns all the link descriptions.
    fn links(&self) -> &[Self::Link];

    /// Returns all the joint descriptions.
    fn joints(&self) -> &[Self::Joint];
}

fn default_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn default_joint_type() -> String {
    "fixed".to_string()
}

/// The limits of the joint motion.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct JointLimits {
    /// The lower limit in radians or meters.
    pub lower: f64,

    /// The upper limit in radians or meters.
    pub upper: f64,
}

/// Describes a single link of a robot.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LinkRecord {
    /// The unique name of the link.
    pub name: String,

    /// The mass in kg.
    #[serde(default)]
    pub mass: f64,

    /// The center of mass relative to the link frame.
    #[serde(default)]
    pub center_of_mass: [f64; 3],

    /// The inertia tensor about the center of mass as `[ixx, ixy, ixz, iyy, iyz, izz]`.
    #[serde(default)]
    pub inertia: [f64; 6],
}

impl LinkRecord {
    /// Creates a new link without mass.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Returns the link with the given inertial parameters.
    pub fn with_inertial(mut self, mass: f64, center_of_mass: [f64; 3], inertia: [f64; 6]) -> Self {
        self.mass = mass;
        self.center_of_mass = center_of_mass;
        self.inertia = inertia;
        self
    }
}

impl LinkDescription for LinkRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn mass_center(&self) -> [f64; 3] {
        self.center_of_mass
    }

    fn inertia(&self) -> [f64; 6] {
        self.inertia
    }
}

/// Describes a single joint of a robot.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct JointRecord {
    /// The unique name of the joint.
    pub name: String,

    /// The joint type, i.e. `revolute`, `prismatic` or `fixed`.
    #[serde(rename = "type", default = "default_joint_type")]
    pub joint_type: String,

    /// The name of the parent link.
    pub parent: String,

    /// The name of the child link.
    pub child: String,

    /// The position of the joint frame in the parent link frame.
    #[serde(default)]
    pub xyz: [f64; 3],

    /// The orientation of the joint frame in the parent link frame.
    #[serde(default)]
    pub rpy: [f64; 3],

    /// The axis of motion in the joint frame.
    #[serde(default = "default_axis")]
    pub axis: [f64; 3],

    /// The limits of the joint motion.
    #[serde(default)]
    pub limits: JointLimits,

    /// The zero offset used by the analytic 6 axis solver.
    #[serde(default)]
    pub ik6_deflection: Option<f64>,
}

impl JointRecord {
    /// Creates a fixed joint between two links.
    pub fn fixed(name: &str, parent: &str, child: &str, xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            name: name.to_string(),
            joint_type: default_joint_type(),
            parent: parent.to_string(),
            child: child.to_string(),
            xyz,
            rpy,
            axis: default_axis(),
            limits: JointLimits::default(),
            ik6_deflection: None,
        }
    }

    /// Creates a prismatic joint that moves along the given axis.
    pub fn prismatic(name: &str, parent: &str, child: &str, xyz: [f64; 3], axis: [f64; 3]) -> Self {
        Self {
            joint_type: "prismatic".to_string(),
            axis,
            ..Self::fixed(name, parent, child, xyz, [0.0; 3])
        }
    }

    /// Creates a revolute joint that rotates around the given axis.
    pub fn revolute(name: &str, parent: &str, child: &str, xyz: [f64; 3], axis: [f64; 3]) -> Self {
        Self {
            joint_type: "revolute".to_string(),
            axis,
            ..Self::fixed(name, parent, child, xyz, [0.0; 3])
        }
    }

    /// Returns the joint with the given solver deflection.
    pub fn with_deflection(mut self, deflection: f64) -> Self {
        self.ik6_deflection = Some(deflection);
        self
    }

    /// Returns the joint with the given limits.
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Self {
        self.limits = JointLimits { lower, upper };
        self
    }

    /// Returns the joint with the given orientation relative to the parent link.
    pub fn with_rpy(mut self, rpy: [f64; 3]) -> Self {
        self.rpy = rpy;
        self
    }
}

impl JointDescription for JointRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn joint_type(&self) -> &str {
        &self.joint_type
    }

    fn parent_link(&self) -> &str {
        &self.parent
    }

    fn child_link(&self) -> &str {
        &self.child
    }

    fn xyz(&self) -> [f64; 3] {
        self.xyz
    }

    fn rpy(&self) -> [f64; 3] {
        self.rpy
    }

    fn axis(&self) -> Option<usize> {
        let ones: Vec<usize> = self
            .axis
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 1.0)
            .map(|(i, _)| i)
            .collect();
        let zeros = self.axis.iter().filter(|v| **v == 0.0).count();

        if ones.len() == 1 && zeros == 2 {
            Some(ones[0])
        } else {
            None
        }
    }

    fn limits(&self) -> (f64, f64) {
        (self.limits.lower, self.limits.upper)
    }

    fn ik6_deflection(&self) -> Option<f64> {
        self.ik6_deflection
    }
}

/// An in-memory robot description made up of link and joint records.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RobotModel {
    /// The human readable name of the robot.
    #[serde(default)]
    pub name: String,

    /// The links of the robot.
    #[serde(default)]
    pub links: Vec<LinkRecord>,

    /// The joints of the robot.
    #[serde(default)]
    pub joints: Vec<JointRecord>,
}

impl RobotModel {
    /// Parses a robot model from a TOML document.
    ///
    /// ## Errors
    ///
    /// * [Error::FailedToParseModel] - Returned when the document is not a valid robot model.
    pub fn from_toml_str(document: &str) -> Result<Self, Error> {
        toml::from_str(document).map_err(|e| Error::FailedToParseModel {
            reason: e.to_string(),
        })
    }

    /// Loads a robot model from a TOML file.
    ///
    /// ## Errors
    ///
    /// * [Error::ModelFileNotFound] - Returned when the file cannot be read.
    /// * [Error::FailedToParseModel] - Returned when the file is not a valid robot model.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let document = fs::read_to_string(path).map_err(|_| Error::ModelFileNotFound {
            path: path.display().to_string(),
        })?;

        let model = Self::from_toml_str(&document)?;
        debug!(
            "Loaded robot model '{}' with {} links and {} joints from {}",
            model.name,
            model.links.len(),
            model.joints.len(),
            path.display()
        );

        Ok(model)
    }

    /// Creates a new robot model from the given records.
    pub fn new(name: &str, links: Vec<LinkRecord>, joints: Vec<JointRecord>) -> Self {
        Self {
            name: name.to_string(),
            links,
            joints,
        }
    }
}

impl RobotDescription for RobotModel {
    type Link = LinkRecord;
    type Joint = JointRecord;

    fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    fn joints(&self) -> &[JointRecord] {
        &self.joints
    }
}
