//! Closed-form inverse kinematics for 6 axis arms with a spherical wrist.
//!
//! The solver uses the ortho-parallel decomposition of the arm. In the base frame of the
//! solver, joint 1 rotates around Z, joints 2, 3 and 5 around Y and joints 4 and 6 around the
//! forearm, which points along Z when all solver angles are zero. The dimensions of the arm are
//! described by seven parameters:
//!
//! ```text
//!              c4 | (tool)
//!                 o  joint 5, joint 6      (wrist centre)
//!              c3 |
//!          a2     |
//!     o------------  joint 4
//!     |  joint 3
//!  c2 |
//!     o  joint 2              b: offset of the wrist centre along Y
//!  a1 |
//!  ---o  joint 1
//!  c1 |
//! ```
//!
//! The parameters, the base frame and the offsets between the solver angles and the joint
//! positions of the tree are derived from the tree itself, so any tree with the ortho-parallel
//! arrangement can be solved, independent of the orientation of its link frames.
//!
//! ## References
//!
//! * Mathias Brandstötter, Arthur Angerer and Michael Hofbaur, An analytical solution of the
//!   inverse kinematics problem of industrial serial manipulators with an ortho-parallel basis
//!   and a spherical wrist, Austrian Robotics Workshop 2014

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix3, Rotation3, Vector3};
use tracing::{debug, warn};

use crate::{
    joint_state::{commanded_state, JointCommands, JointState},
    linear_algebra::matrix::{Matrix, MatrixViewMut},
    model_elements::{
        frame_elements::{JointID, LinkID},
        model::KinematicTree,
    },
    Error,
};

#[cfg(test)]
#[path = "inverse_kinematics_tests.rs"]
mod inverse_kinematics_tests;

/// The number of candidate solutions produced for each target pose.
pub const NUMBER_OF_SOLUTIONS: usize = 8;

/// The tolerance used when checking the geometry of the arm.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// Reduces an angle into the range (-π, π]. NaN and infinite values yield NaN.
fn normalize_angle(angle: f64) -> f64 {
    let reduced = (angle + PI).rem_euclid(TAU) - PI;
    if reduced <= -PI {
        reduced + TAU
    } else {
        reduced
    }
}

/// Wraps an angle into the range (-2π, 2π]. NaN and infinite values yield NaN.
fn wrap_angle(angle: f64) -> f64 {
    angle % TAU
}

/// Returns the distance between a point and a line through 'origin' along the unit vector
/// 'direction'.
fn distance_to_line(point: &Vector3<f64>, origin: &Vector3<f64>, direction: &Vector3<f64>) -> f64 {
    let offset = point - origin;
    (offset - direction * offset.dot(direction)).norm()
}

fn incompatible(reason: String) -> Error {
    Error::IncompatibleIkGeometry { reason }
}

/// The dimensions of an ortho-parallel arm with a spherical wrist.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ik6Geometry {
    /// The offset of joint 2 from the axis of joint 1.
    pub a1: f64,

    /// The offset of the wrist centre from the axis of joint 3, along the upper arm normal.
    pub a2: f64,

    /// The lateral offset of the wrist centre.
    pub b: f64,

    /// The height of joint 2 above the origin of joint 1.
    pub c1: f64,

    /// The length of the upper arm, between joint 2 and joint 3.
    pub c2: f64,

    /// The length of the forearm, between joint 3 and the wrist centre.
    pub c3: f64,

    /// The distance between the wrist centre and the end effector along the flange axis.
    pub c4: f64,
}

/// The candidate joint positions for a target pose.
///
/// Each of the [NUMBER_OF_SOLUTIONS] columns holds one candidate, the rows are in chain order.
/// Columns 0 to 3 combine the two shoulder and the two elbow configurations, columns 4 to 7
/// hold the same arm configurations with the wrist flipped. Configurations that cannot reach
/// the target contain NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct Ik6Solutions {
    angles: Matrix,
}

impl Ik6Solutions {
    /// Returns all candidates as a 6x8 matrix.
    pub fn angles(&self) -> &Matrix {
        &self.angles
    }

    /// Returns the index of the candidate with the smallest summed absolute difference to
    /// 'reference', or `None` if no candidate is feasible.
    ///
    /// Candidates that contain NaN are never selected. If two candidates are equally close the
    /// one with the lowest index is returned.
    pub fn closest(&self, reference: &[f64; 6]) -> Option<usize> {
        let mut best = None;
        let mut best_score = f64::INFINITY;
        for column in 0..NUMBER_OF_SOLUTIONS {
            let score: f64 = self
                .column(column)
                .iter()
                .zip(reference.iter())
                .map(|(q, r)| (q - r).abs())
                .sum();
            let score = if score.is_nan() { f64::INFINITY } else { score };

            if score < best_score {
                best_score = score;
                best = Some(column);
            }
        }

        best
    }

    /// Returns the joint positions of the given candidate in chain order.
    ///
    /// ## Panics
    ///
    /// Panics if 'index' is not smaller than [NUMBER_OF_SOLUTIONS].
    pub fn column(&self, index: usize) -> [f64; 6] {
        let mut result = [0.0; 6];
        for (row, value) in result.iter_mut().enumerate() {
            *value = self.angles.get(row, index);
        }
        result
    }

    /// Returns a value indicating if the given candidate reaches the target.
    pub fn is_feasible(&self, index: usize) -> bool {
        self.column(index).iter().all(|q| !q.is_nan())
    }

    /// Creates the solutions from a 6x8 matrix of joint positions.
    ///
    /// ## Panics
    ///
    /// Panics if 'angles' is not a 6x8 matrix.
    pub fn new(angles: Matrix) -> Self {
        assert!(
            angles.nrows() == 6 && angles.ncols() == NUMBER_OF_SOLUTIONS,
            "Ik6Solutions: expected a 6x{} matrix, got {}x{}",
            NUMBER_OF_SOLUTIONS,
            angles.nrows(),
            angles.ncols()
        );
        Self { angles }
    }
}

/// Solves the inverse kinematics of a 6 axis chain in closed form.
///
/// The solver captures the geometry of the chain once. It does not keep a reference to the
/// tree and may be shared between threads.
#[derive(Clone, Debug)]
pub struct Ik6Solver {
    geometry: Ik6Geometry,

    /// The joints of the chain, from the base to the end effector.
    chain: Vec<JointID>,
    names: Vec<String>,

    /// The tree position of every joint is `sign * angle - deflection`.
    deflection: [f64; 6],
    sign: [f64; 6],

    /// The orientation of the solver base frame relative to the tree base frame.
    base: Rotation3<f64>,

    /// The origin of the solver base frame, i.e. the origin of joint 1, in the tree base frame.
    origin: Vector3<f64>,

    /// The end effector position relative to the wrist centre in the solver base frame, with
    /// all solver angles at zero.
    tool_offset: Vector3<f64>,

    /// The end effector orientation in the solver base frame with all solver angles at zero.
    tool_rotation: Rotation3<f64>,
}

impl Ik6Solver {
    /// Returns the names of the joints of the chain, from the base to the end effector.
    pub fn joint_names(&self) -> &[String] {
        &self.names
    }

    /// Returns the joints of the chain, from the base to the end effector.
    pub fn chain(&self) -> &[JointID] {
        &self.chain
    }

    /// Returns the index of the candidate closest to the joint positions in 'commands'. Joints
    /// missing from 'commands' are taken to be at zero.
    pub fn closest_to(&self, solutions: &Ik6Solutions, commands: &JointCommands) -> Option<usize> {
        let mut reference = [0.0; 6];
        for (value, name) in reference.iter_mut().zip(self.names.iter()) {
            *value = commanded_state(commands, name).position();
        }
        solutions.closest(&reference)
    }

    /// Derives the solver for the chain between the root of the tree and 'end_effector'.
    ///
    /// The geometry is measured at the reference configuration, where every joint is at the
    /// negative of its deflection. The state of 'tree' is not changed.
    ///
    /// ## Errors
    ///
    /// * [Error::UnsupportedIkChain] - Returned when the chain does not have exactly 6
    ///   movable joints.
    /// * [Error::IncompatibleIkGeometry] - Returned when the joints are not all revolute, when
    ///   the joint axes do not have the ortho-parallel arrangement or when the wrist axes do not
    ///   intersect.
    pub fn from_tree(tree: &KinematicTree, end_effector: LinkID) -> Result<Self, Error> {
        let chain = tree.predecessors(end_effector);
        if chain.len() != 6 {
            return Err(Error::UnsupportedIkChain {
                joints: chain.len(),
            });
        }

        let mut names = Vec::with_capacity(6);
        let mut deflection = [0.0; 6];
        let mut reference = JointCommands::new();
        for (i, id) in chain.iter().enumerate() {
            let joint = tree.joint(*id);
            if !joint.joint_type().is_revolute() {
                return Err(incompatible(format!(
                    "joint '{}' is not revolute",
                    joint.name()
                )));
            }

            deflection[i] = joint.deflection().unwrap_or(0.0);
            names.push(joint.name().to_string());
            reference.insert(
                joint.name().to_string(),
                JointState::new(-deflection[i], 0.0, 0.0),
            );
        }

        let mut posed = tree.clone();
        posed.update_state(&reference);

        let mut points = [Vector3::zeros(); 6];
        let mut axes = [Vector3::zeros(); 6];
        for (i, id) in chain.iter().enumerate() {
            let joint = posed.joint(*id);
            let frame = posed.link(joint.child()).state();
            points[i] = frame.pos;
            axes[i] = frame.rot * joint.joint_type().axis();
        }

        let z = axes[0];
        let y = axes[1];
        if z.dot(&y).abs() > GEOMETRY_TOLERANCE {
            return Err(incompatible(format!(
                "the axes of '{}' and '{}' are not perpendicular",
                names[0], names[1]
            )));
        }
        let x = y.cross(&z);
        let base = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]));
        let origin = points[0];

        let expected = [
            Vector3::z(),
            Vector3::y(),
            Vector3::y(),
            Vector3::z(),
            Vector3::y(),
            Vector3::z(),
        ];
        let mut sign = [1.0; 6];
        for i in 0..6 {
            let alignment = (base.inverse() * axes[i]).dot(&expected[i]);
            if alignment.abs() < 1.0 - GEOMETRY_TOLERANCE {
                return Err(incompatible(format!(
                    "the axis of '{}' is not aligned with the ortho-parallel arrangement",
                    names[i]
                )));
            }
            sign[i] = alignment.signum();
        }

        // The axes of joint 4 and joint 5 are perpendicular, so the point on the axis of joint 4
        // closest to the axis of joint 5 is found by projection.
        let wrist_centre = points[3] + axes[3] * (points[4] - points[3]).dot(&axes[3]);
        for i in [4, 5] {
            if distance_to_line(&wrist_centre, &points[i], &axes[i]) > GEOMETRY_TOLERANCE {
                return Err(incompatible(format!(
                    "the axis of '{}' does not pass through the wrist centre",
                    names[i]
                )));
            }
        }

        let canonical = |p: &Vector3<f64>| base.inverse() * (p - origin);
        let shoulder = canonical(&points[1]);
        let elbow = canonical(&points[2]);
        let wrist = canonical(&wrist_centre);
        if (elbow.x - shoulder.x).abs() > GEOMETRY_TOLERANCE {
            return Err(incompatible(format!(
                "the upper arm between '{}' and '{}' is not parallel to the axis of '{}'",
                names[1], names[2], names[0]
            )));
        }

        let tool = posed.link(end_effector).state();
        let tool_offset = base.inverse() * (tool.pos - wrist_centre);
        let tool_rotation = base.inverse() * tool.rot;

        let geometry = Ik6Geometry {
            a1: shoulder.x,
            a2: wrist.x - elbow.x,
            b: wrist.y,
            c1: shoulder.z,
            c2: elbow.z - shoulder.z,
            c3: wrist.z - elbow.z,
            c4: tool_offset.z,
        };
        debug!(
            "Derived 6 axis solver geometry {:?} with axis signs {:?} and deflections {:?}",
            geometry, sign, deflection
        );

        Ok(Self {
            geometry,
            chain,
            names,
            deflection,
            sign,
            base,
            origin,
            tool_offset,
            tool_rotation,
        })
    }

    /// Returns the dimensions of the arm.
    pub fn geometry(&self) -> &Ik6Geometry {
        &self.geometry
    }

    /// Calculates the candidate joint positions that place the end effector at 'pos' with
    /// orientation 'rot', both given in the base frame of the tree.
    ///
    /// Every solver angle is reduced into (-π, π] before the deflection and the axis direction
    /// of its joint are applied. The resulting joint positions are wrapped into (-2π, 2π], so a
    /// joint without deflection always lies in (-π, π].
    pub fn ik_full(&self, rot: &Rotation3<f64>, pos: &Vector3<f64>) -> Ik6Solutions {
        let g = &self.geometry;

        let r = (self.base.inverse() * rot * self.tool_rotation.inverse()).into_inner();
        let target = self.base.inverse() * (pos - self.origin);
        let c = target - r * self.tool_offset;

        let nx1 = (c.x * c.x + c.y * c.y - g.b * g.b).sqrt() - g.a1;
        let height = c.z - g.c1;
        let s1_2 = nx1 * nx1 + height * height;
        let s2_2 = (nx1 + 2.0 * g.a1) * (nx1 + 2.0 * g.a1) + height * height;
        let k_2 = g.a2 * g.a2 + g.c3 * g.c3;
        let psi3 = g.a2.atan2(g.c3);

        let theta1_i = c.y.atan2(c.x) - g.b.atan2(nx1 + g.a1);
        let theta1_ii = c.y.atan2(c.x) + g.b.atan2(nx1 + g.a1) - PI;

        let shoulder_i = ((s1_2 + g.c2 * g.c2 - k_2) / (2.0 * s1_2.sqrt() * g.c2)).acos();
        let shoulder_ii = ((s2_2 + g.c2 * g.c2 - k_2) / (2.0 * s2_2.sqrt() * g.c2)).acos();
        let theta2 = [
            -shoulder_i + nx1.atan2(height),
            shoulder_i + nx1.atan2(height),
            -shoulder_ii - (nx1 + 2.0 * g.a1).atan2(height),
            shoulder_ii - (nx1 + 2.0 * g.a1).atan2(height),
        ];

        let elbow_i = ((s1_2 - g.c2 * g.c2 - k_2) / (2.0 * g.c2 * k_2.sqrt())).acos();
        let elbow_ii = ((s2_2 - g.c2 * g.c2 - k_2) / (2.0 * g.c2 * k_2.sqrt())).acos();
        let theta3 = [
            elbow_i - psi3,
            -elbow_i - psi3,
            elbow_ii - psi3,
            -elbow_ii - psi3,
        ];
        let theta1 = [theta1_i, theta1_i, theta1_ii, theta1_ii];

        let mut angles = Matrix::zeros(6, NUMBER_OF_SOLUTIONS);
        for arm in 0..4 {
            let (s1, c1) = theta1[arm].sin_cos();
            let (s23, c23) = (theta2[arm] + theta3[arm]).sin_cos();

            let theta4 = (r[(1, 2)] * c1 - r[(0, 2)] * s1)
                .atan2(r[(0, 2)] * c23 * c1 + r[(1, 2)] * c23 * s1 - r[(2, 2)] * s23);

            // A rotation matrix element, only outside [-1, 1] by rounding.
            let m = (r[(0, 2)] * s23 * c1 + r[(1, 2)] * s23 * s1 + r[(2, 2)] * c23)
                .clamp(-1.0, 1.0);
            let theta5 = (1.0 - m * m).sqrt().atan2(m);

            let theta6 = (r[(0, 1)] * s23 * c1 + r[(1, 1)] * s23 * s1 + r[(2, 1)] * c23)
                .atan2(-r[(0, 0)] * s23 * c1 - r[(1, 0)] * s23 * s1 - r[(2, 0)] * c23);

            let wrist = [
                [theta4, theta5, theta6],
                [theta4 + PI, -theta5, theta6 - PI],
            ];
            for (flip, [t4, t5, t6]) in wrist.iter().enumerate() {
                let solver_angles = [theta1[arm], theta2[arm], theta3[arm], *t4, *t5, *t6];

                let mut column = Matrix::zeros(6, 1);
                for (i, angle) in solver_angles.iter().enumerate() {
                    column.vset(
                        i,
                        wrap_angle(self.sign[i] * normalize_angle(*angle) - self.deflection[i]),
                    );
                }
                angles.col_mut(arm + 4 * flip).insert(&column);
            }
        }

        let solutions = Ik6Solutions::new(angles);
        if solutions.closest(&[0.0; 6]).is_none() {
            warn!(
                "No feasible joint positions for the target position {:?}",
                pos.as_slice()
            );
        }

        solutions
    }

    /// Returns the joint commands that move the chain to the given candidate, with zero
    /// velocity and acceleration.
    ///
    /// ## Panics
    ///
    /// Panics if 'index' is not smaller than [NUMBER_OF_SOLUTIONS].
    pub fn solution_commands(&self, solutions: &Ik6Solutions, index: usize) -> JointCommands {
        self.names
            .iter()
            .zip(solutions.column(index).iter())
            .map(|(name, q)| (name.clone(), JointState::new(*q, 0.0, 0.0)))
            .collect()
    }
}
