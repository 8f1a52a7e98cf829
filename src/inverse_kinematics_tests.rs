use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Rotation3, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    joint_state::{JointCommands, JointState},
    linear_algebra::matrix::Matrix,
    model_elements::model::KinematicTree,
    test_support::{
        assert_close, assert_matrix_close, assert_vector_close, commands, forward_wrist_arm_tree,
        pendulum, six_axis_arm, six_axis_arm_tree, ARM_JOINTS,
    },
    Error,
};

use super::*;

fn is_same_angle(a: f64, b: f64) -> bool {
    let difference = (a - b).rem_euclid(TAU);
    difference < 1e-6 || TAU - difference < 1e-6
}

fn solver_for(tree: &KinematicTree) -> Ik6Solver {
    let tool = tree.find_link("tool0").unwrap();
    match Ik6Solver::from_tree(tree, tool) {
        Ok(solver) => solver,
        Err(e) => panic!("Expected a solver for the arm. Error was: {}", e),
    }
}

fn assert_round_trip(mut tree: KinematicTree, q: [f64; 6]) {
    let solver = solver_for(&tree);
    let tool = tree.find_link("tool0").unwrap();

    tree.update_state(&commands(&ARM_JOINTS, &q));
    let target = *tree.link(tool).state();
    let solutions = solver.ik_full(&target.rot, &target.pos);

    let matching: Vec<usize> = (0..NUMBER_OF_SOLUTIONS)
        .filter(|i| {
            solutions.is_feasible(*i)
                && solutions
                    .column(*i)
                    .iter()
                    .zip(q.iter())
                    .all(|(a, b)| is_same_angle(*a, *b))
        })
        .collect();
    assert!(
        !matching.is_empty(),
        "Expected a solution matching {:?}, got\n{}",
        q,
        solutions.angles()
    );

    let closest = solutions.closest(&q);
    assert!(closest.is_some());
    assert!(matching.contains(&closest.unwrap()));
}

/// Checks the round trip for random configurations away from the singular arm positions.
///
/// The samples are limited to configurations where every solver angle lies within (-π, π),
/// the range in which a solution column reproduces the joint positions exactly.
fn assert_random_round_trips(tree: KinematicTree, seed: u64) {
    let solver = solver_for(&tree);
    let psi3 = solver.geometry().a2.atan2(solver.geometry().c3);
    let wrist = tree.find_link("link5").unwrap();
    let ranges: [f64; 6] = [3.0, 1.9, 2.5, 3.0, 2.0, 3.0];

    let mut rng = StdRng::seed_from_u64(seed);
    let mut checked = 0;
    while checked < 200 {
        let q = ranges.map(|limit| rng.gen_range(-limit..limit));
        let theta: Vec<f64> = (0..6)
            .map(|i| solver.sign[i] * (q[i] + solver.deflection[i]))
            .collect();
        if theta.iter().any(|t| t.abs() > PI - 0.05)
            || theta[4].abs() < 0.2
            || (theta[2] + psi3).abs() < 0.15
        {
            continue;
        }

        let mut posed = tree.clone();
        posed.update_state(&commands(&ARM_JOINTS, &q));
        let centre = posed.link(wrist).state().pos;
        if centre.x.hypot(centre.y) < 0.1 {
            continue;
        }

        assert_round_trip(tree.clone(), q);
        checked += 1;
    }
}

fn solutions_with(columns: &[(usize, [f64; 6])]) -> Ik6Solutions {
    let mut angles = Matrix::constant(6, NUMBER_OF_SOLUTIONS, f64::NAN);
    for (index, values) in columns {
        for (row, value) in values.iter().enumerate() {
            angles.set(row, *index, *value);
        }
    }
    Ik6Solutions::new(angles)
}

// Geometry

#[test]
fn when_deriving_the_geometry_of_the_sample_arm_it_should_measure_the_links() {
    let tree = six_axis_arm_tree();

    let solver = solver_for(&tree);

    let g = solver.geometry();
    assert_close(0.05, g.a1);
    assert_close(0.035, g.a2);
    assert_close(0.02, g.b);
    assert_close(0.13, g.c1);
    assert_close(0.33, g.c2);
    assert_close(0.335, g.c3);
    assert_close(0.08, g.c4);
    assert_eq!(solver.joint_names().to_vec(), ARM_JOINTS.to_vec());
    assert_eq!(solver.chain().len(), 6);
}

#[test]
fn when_deriving_the_geometry_of_a_deflected_arm_it_should_use_the_reference_configuration() {
    let canonical = solver_for(&six_axis_arm_tree());

    let deflected = solver_for(&forward_wrist_arm_tree(false));

    let (a, b) = (canonical.geometry(), deflected.geometry());
    for (x, y) in [
        (a.a1, b.a1),
        (a.a2, b.a2),
        (a.b, b.b),
        (a.c1, b.c1),
        (a.c2, b.c2),
        (a.c3, b.c3),
        (a.c4, b.c4),
    ] {
        assert_close(x, y);
    }
}

#[test]
fn when_deriving_the_geometry_it_should_not_change_the_tree_state() {
    let mut tree = forward_wrist_arm_tree(false);
    tree.update_state(&commands(&ARM_JOINTS, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));
    let tool = tree.find_link("tool0").unwrap();
    let before = *tree.link(tool).state();

    let _ = solver_for(&tree);

    assert_eq!(*tree.link(tool).state(), before);
    assert_eq!(tree.joint(tree.find_joint("joint3").unwrap()).position(), 0.3);
}

#[test]
fn when_the_chain_does_not_have_six_joints_it_should_return_an_error() {
    let tree = pendulum(1.0, 1.0);
    let bob = tree.find_link("bob").unwrap();

    let result = Ik6Solver::from_tree(&tree, bob);

    assert_eq!(result.err(), Some(Error::UnsupportedIkChain { joints: 1 }));
}

#[test]
fn when_the_chain_has_a_prismatic_joint_it_should_return_an_error() {
    let mut model = six_axis_arm();
    model.joints[5].joint_type = "prismatic".to_string();
    let tree = KinematicTree::from_description(&model).unwrap();

    let result = Ik6Solver::from_tree(&tree, tree.find_link("tool0").unwrap());

    assert!(matches!(result, Err(Error::IncompatibleIkGeometry { .. })));
}

#[test]
fn when_the_wrist_axes_do_not_intersect_it_should_return_an_error() {
    let mut model = six_axis_arm();
    model.joints[4].xyz = [0.01, 0.0, 0.135];
    let tree = KinematicTree::from_description(&model).unwrap();

    let result = Ik6Solver::from_tree(&tree, tree.find_link("tool0").unwrap());

    assert!(matches!(result, Err(Error::IncompatibleIkGeometry { .. })));
}

#[test]
fn when_the_axes_are_not_ortho_parallel_it_should_return_an_error() {
    let mut model = six_axis_arm();
    model.joints[1].axis = [1.0, 0.0, 0.0];
    model.joints[2].axis = [1.0, 0.0, 0.0];
    model.joints[4].axis = [1.0, 0.0, 0.0];
    model.joints[3].axis = [0.0, 1.0, 0.0];
    let tree = KinematicTree::from_description(&model).unwrap();

    let result = Ik6Solver::from_tree(&tree, tree.find_link("tool0").unwrap());

    assert!(matches!(result, Err(Error::IncompatibleIkGeometry { .. })));
}

// Solving

#[test]
fn when_solving_for_a_reachable_pose_of_the_sample_arm_it_should_find_the_configuration() {
    assert_round_trip(six_axis_arm_tree(), [0.3, -0.4, 0.5, 0.6, 0.7, -0.8]);
    assert_round_trip(six_axis_arm_tree(), [-2.0, 0.9, -1.2, -1.5, 1.1, 2.5]);
}

#[test]
fn when_solving_for_an_arm_with_a_deflected_joint_it_should_find_the_configuration() {
    assert_round_trip(forward_wrist_arm_tree(false), [0.3, -0.4, -0.9, 0.6, 0.7, -0.8]);
    assert_round_trip(forward_wrist_arm_tree(false), [1.2, 0.5, -1.9, -0.3, 1.4, 0.2]);
}

#[test]
fn when_solving_for_an_arm_with_a_reversed_joint_axis_it_should_find_the_configuration() {
    assert_round_trip(forward_wrist_arm_tree(true), [0.3, -0.4, -0.9, 0.6, 0.7, -0.8]);
}

#[test]
fn when_the_wrist_angles_are_negative_it_should_select_the_matching_column() {
    assert_round_trip(
        six_axis_arm_tree(),
        [-0.7136, -0.4123, -1.8836, -2.4633, -1.1130, 0.2547],
    );
}

#[test]
fn when_solving_random_poses_of_the_sample_arm_it_should_select_the_configuration() {
    assert_random_round_trips(six_axis_arm_tree(), 11);
}

#[test]
fn when_solving_random_poses_of_a_deflected_arm_it_should_select_the_configuration() {
    assert_random_round_trips(forward_wrist_arm_tree(false), 23);
}

#[test]
fn when_solving_random_poses_of_a_reversed_axis_arm_it_should_select_the_configuration() {
    assert_random_round_trips(forward_wrist_arm_tree(true), 37);
}

#[test]
fn when_solving_every_feasible_solution_should_reach_the_target() {
    let mut tree = six_axis_arm_tree();
    let solver = solver_for(&tree);
    let tool = tree.find_link("tool0").unwrap();

    tree.update_state(&commands(&ARM_JOINTS, &[0.3, -0.4, 0.5, 0.6, 0.7, -0.8]));
    let target = *tree.link(tool).state();
    let solutions = solver.ik_full(&target.rot, &target.pos);

    let mut feasible = 0;
    for i in 0..NUMBER_OF_SOLUTIONS {
        if !solutions.is_feasible(i) {
            continue;
        }

        feasible += 1;
        tree.update_state(&solver.solution_commands(&solutions, i));
        let reached = tree.link(tool).state();
        assert_vector_close(&reached.pos, &target.pos);
        assert_matrix_close(reached.rot.matrix(), target.rot.matrix());
    }

    assert!(feasible >= 2);
}

#[test]
fn when_solving_it_should_wrap_the_angles() {
    let mut tree = six_axis_arm_tree();
    let solver = solver_for(&tree);
    let tool = tree.find_link("tool0").unwrap();

    tree.update_state(&commands(&ARM_JOINTS, &[2.5, 0.3, 0.4, 3.0, -1.0, 3.1]));
    let target = *tree.link(tool).state();
    let solutions = solver.ik_full(&target.rot, &target.pos);

    for i in 0..NUMBER_OF_SOLUTIONS {
        for q in solutions.column(i) {
            assert!(q.is_nan() || (q > -TAU && q <= TAU), "{} is not wrapped", q);
        }
    }
}

#[test]
fn when_normalizing_an_angle_it_should_reduce_it_to_half_a_turn() {
    assert_close(-FRAC_PI_2, normalize_angle(3.0 * FRAC_PI_2));
    assert_close(PI, normalize_angle(-PI));
    assert_close(PI, normalize_angle(PI));
    assert_close(0.5, normalize_angle(0.5 - 4.0 * TAU));
    assert!(normalize_angle(f64::NAN).is_nan());
}

#[test]
fn when_wrapping_a_huge_angle_it_should_return_a_wrapped_value() {
    let wrapped = wrap_angle(1.0e17);
    assert!(wrapped > -TAU && wrapped <= TAU);

    assert_close(0.5, wrap_angle(0.5 + 3.0 * TAU));
    assert_close(-0.5, wrap_angle(-0.5 - 3.0 * TAU));
    assert!(wrap_angle(f64::INFINITY).is_nan());
    assert!(wrap_angle(f64::NEG_INFINITY).is_nan());
}

#[test]
fn when_a_joint_has_a_huge_deflection_solving_should_still_wrap_the_angles() {
    let mut model = six_axis_arm();
    model.joints[5].ik6_deflection = Some(1.0e17);
    let mut tree = KinematicTree::from_description(&model).unwrap();
    let solver = solver_for(&tree);
    let tool = tree.find_link("tool0").unwrap();

    tree.update_state(&commands(&ARM_JOINTS, &[0.3, -0.4, 0.5, 0.6, 0.7, -0.8]));
    let target = *tree.link(tool).state();
    let solutions = solver.ik_full(&target.rot, &target.pos);

    for i in 0..NUMBER_OF_SOLUTIONS {
        for q in solutions.column(i) {
            assert!(q.is_nan() || (q > -TAU && q <= TAU), "{} is not wrapped", q);
        }
    }
}

#[test]
fn when_the_target_is_out_of_reach_there_should_be_no_feasible_solution() {
    let tree = six_axis_arm_tree();
    let solver = solver_for(&tree);

    let solutions = solver.ik_full(&Rotation3::identity(), &Vector3::new(5.0, 0.0, 0.2));

    assert!((0..NUMBER_OF_SOLUTIONS).all(|i| !solutions.is_feasible(i)));
    assert_eq!(solutions.closest(&[0.0; 6]), None);
}

// Selecting

#[test]
fn when_every_solution_is_infeasible_closest_should_return_none() {
    let solutions = solutions_with(&[]);

    assert_eq!(solutions.closest(&[0.0; 6]), None);
    assert_eq!(solutions.closest(&[1.0, -1.0, 2.0, 0.5, 0.0, 3.0]), None);
}

#[test]
fn when_selecting_the_closest_solution_it_should_skip_infeasible_columns() {
    let mut partial = [0.0; 6];
    partial[3] = f64::NAN;
    let solutions = solutions_with(&[(1, partial), (6, [0.5; 6])]);

    assert_eq!(solutions.closest(&[0.0; 6]), Some(6));
}

#[test]
fn when_solutions_are_equally_close_it_should_select_the_lowest_index() {
    let solutions = solutions_with(&[(5, [1.0; 6]), (2, [-1.0; 6]), (7, [1.0; 6])]);

    assert_eq!(solutions.closest(&[0.0; 6]), Some(2));
}

#[test]
fn when_selecting_the_closest_solution_it_should_sum_the_absolute_differences() {
    let solutions = solutions_with(&[
        (0, [0.0, 0.0, 0.0, 0.0, 0.0, 2.0]),
        (1, [0.5, 0.5, 0.5, 0.0, 0.0, 0.0]),
    ]);

    assert_eq!(solutions.closest(&[0.0; 6]), Some(1));
}

#[test]
fn when_selecting_with_joint_commands_it_should_use_the_joint_positions() {
    let solver = solver_for(&six_axis_arm_tree());
    let solutions = solutions_with(&[(0, [0.0; 6]), (3, [1.0, 1.0, 1.0, 0.0, 0.0, 0.0])]);
    let mut current = JointCommands::new();
    for name in ["joint1", "joint2", "joint3"] {
        current.insert(name.to_string(), JointState::new(0.9, 0.1, 0.0));
    }

    assert_eq!(solver.closest_to(&solutions, &current), Some(3));
    assert_eq!(solver.closest_to(&solutions, &JointCommands::new()), Some(0));
}

#[test]
fn when_converting_a_solution_to_commands_it_should_name_every_joint() {
    let solver = solver_for(&six_axis_arm_tree());
    let solutions = solutions_with(&[(4, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6])]);

    let commands = solver.solution_commands(&solutions, 4);

    assert_eq!(commands.len(), 6);
    assert_eq!(commands["joint3"], JointState::new(0.3, 0.0, 0.0));
    assert_eq!(commands["joint6"], JointState::new(0.6, 0.0, 0.0));
}

#[test]
#[should_panic(expected = "expected a 6x8 matrix")]
fn when_creating_solutions_with_the_wrong_shape_it_should_panic() {
    let _ = Ik6Solutions::new(Matrix::zeros(6, 4));
}

#[test]
fn when_wrapping_angles_it_should_keep_them_in_the_half_open_range() {
    assert_close(PI, wrap_angle(3.0 * PI));
    assert_close(0.0, wrap_angle(-TAU));
    assert_eq!(wrap_angle(TAU), TAU);
    assert_close(-PI, wrap_angle(-3.0 * PI));
    assert!(wrap_angle(f64::NAN).is_nan());
}
