//! Shared models and assertions for the unit tests.

use std::f64::consts::FRAC_PI_2;

use float_cmp::{ApproxEq, F64Margin};
use nalgebra::{Matrix3, Vector3};

use crate::{
    joint_state::JointCommands,
    model_elements::{
        description::{JointRecord, LinkRecord, RobotModel},
        model::KinematicTree,
    },
};

pub(crate) const MARGIN: F64Margin = F64Margin {
    ulps: 2,
    epsilon: 1e-6,
};

pub(crate) fn assert_close(expected: f64, actual: f64) {
    assert!(
        expected.approx_eq(actual, MARGIN),
        "Expected {:.8} and {:.8} to be equal within 2 ulps or 1e-6",
        expected,
        actual
    );
}

pub(crate) fn assert_vector_close(actual: &Vector3<f64>, expected: &Vector3<f64>) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (*a).approx_eq(*e, MARGIN),
            "Expected {:?} and {:?} to be equal within 2 ulps or 1e-6",
            actual.as_slice(),
            expected.as_slice()
        );
    }
}

pub(crate) fn assert_matrix_close(actual: &Matrix3<f64>, expected: &Matrix3<f64>) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (*a).approx_eq(*e, MARGIN),
            "Expected {} and {} to be equal within 2 ulps or 1e-6",
            actual,
            expected
        );
    }
}

pub(crate) fn commands(names: &[&str], positions: &[f64]) -> JointCommands {
    names
        .iter()
        .zip(positions.iter())
        .map(|(name, q)| (name.to_string(), [*q, 0.0, 0.0].into()))
        .collect()
}

pub(crate) const ARM_JOINTS: [&str; 6] = [
    "joint1", "joint2", "joint3", "joint4", "joint5", "joint6",
];

/// The arm shipped in the models directory. The wrist and forearm axes line up with the base
/// axes at the zero position.
pub(crate) fn six_axis_arm() -> RobotModel {
    match RobotModel::from_toml_str(include_str!("../models/six_axis_arm.toml")) {
        Ok(model) => model,
        Err(e) => panic!("The sample model should parse. Error was: {}", e),
    }
}

pub(crate) fn six_axis_arm_tree() -> KinematicTree {
    match KinematicTree::from_description(&six_axis_arm()) {
        Ok(tree) => tree,
        Err(e) => panic!("The sample model should build. Error was: {}", e),
    }
}

/// An arm with the same dimensions as [six_axis_arm], but with the forearm pointing forward
/// at the zero position and the wrist axes along X, as is common for industrial arms.
pub(crate) fn forward_wrist_arm(flip_joint5: bool) -> RobotModel {
    let links = [
        "base_link",
        "link1",
        "link2",
        "link3",
        "link4",
        "link5",
        "link6",
        "tool0",
    ]
    .iter()
    .map(|name| LinkRecord::new(name))
    .collect();

    let x = [1.0, 0.0, 0.0];
    let y = [0.0, 1.0, 0.0];
    let z = [0.0, 0.0, 1.0];
    let joint5_rpy = if flip_joint5 {
        [std::f64::consts::PI, 0.0, 0.0]
    } else {
        [0.0; 3]
    };
    let joints = vec![
        JointRecord::revolute("joint1", "base_link", "link1", [0.0, 0.0, 0.2], z),
        JointRecord::revolute("joint2", "link1", "link2", [0.05, 0.0, 0.13], y),
        JointRecord::revolute("joint3", "link2", "link3", [0.0, 0.02, 0.33], y)
            .with_deflection(FRAC_PI_2),
        JointRecord::revolute("joint4", "link3", "link4", [0.2, 0.0, -0.035], x),
        JointRecord::revolute("joint5", "link4", "link5", [0.135, 0.0, 0.0], y)
            .with_rpy(joint5_rpy),
        JointRecord::revolute("joint6", "link5", "link6", [0.05, 0.0, 0.0], x),
        JointRecord::fixed("tool_joint", "link6", "tool0", [0.03, 0.0, 0.0], [0.0; 3]),
    ];

    RobotModel::new("forward_wrist_arm", links, joints)
}

pub(crate) fn forward_wrist_arm_tree(flip_joint5: bool) -> KinematicTree {
    match KinematicTree::from_description(&forward_wrist_arm(flip_joint5)) {
        Ok(tree) => tree,
        Err(e) => panic!("The forward wrist model should build. Error was: {}", e),
    }
}

/// A point mass at 'length' below a revolute joint around the X-axis.
pub(crate) fn pendulum(mass: f64, length: f64) -> KinematicTree {
    let model = RobotModel::new(
        "pendulum",
        vec![
            LinkRecord::new("base"),
            LinkRecord::new("bob").with_inertial(mass, [0.0, 0.0, -length], [0.0; 6]),
        ],
        vec![JointRecord::revolute(
            "hinge",
            "base",
            "bob",
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
        )],
    );

    match KinematicTree::from_description(&model) {
        Ok(tree) => tree,
        Err(e) => panic!("The pendulum should build. Error was: {}", e),
    }
}
