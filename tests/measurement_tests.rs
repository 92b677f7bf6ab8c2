mod common;

use hrc_cosim::adapters::outbound::WorkcellSimulator;
use hrc_cosim::common::{BackendError, FixedPoint};
use hrc_cosim::config::{Config, HumanConfig, RobotConfig};
use hrc_cosim::domains::operations::{
    Agent, DurationMeasurer, GripperAction, HumanStrategy, HumanTask, OperationStrategy,
    OperationSynthesizer, RobotStrategy, CLOSE_WAYPOINT, OPEN_WAYPOINT, WAYPOINT_COUNT,
};
use hrc_cosim::domains::scene::{apply_layout, Pose, SimulationBackend, Vec3};
use std::f64::consts::PI;

async fn laid_out_workcell() -> WorkcellSimulator {
    let mut sim = WorkcellSimulator::seeded(&Config::default());
    apply_layout(&mut sim, &common::layout(4), &common::identifiers())
        .await
        .unwrap();
    sim
}

#[tokio::test]
async fn robot_duration_is_repeatable_and_scene_is_restored() {
    let mut sim = laid_out_workcell().await;
    let strategy = RobotStrategy::new(RobotConfig::default());
    let mut operation = strategy
        .synthesize(&mut sim, 1, &common::identifiers())
        .await
        .unwrap();

    let cube_before = sim.pose_of("YAOSC_cube1").unwrap();
    let tcp_before = sim.pose_of("tf_tcp_1").unwrap();
    let measurer = DurationMeasurer::new(FixedPoint::new(3, 1000));

    let first = measurer.measure(&mut sim, &mut operation).await.unwrap();
    assert_eq!(sim.pose_of("YAOSC_cube1").unwrap(), cube_before);
    assert_eq!(sim.pose_of("tf_tcp_1").unwrap(), tcp_before);

    let second = measurer.measure(&mut sim, &mut operation).await.unwrap();
    assert_eq!(sim.pose_of("YAOSC_cube1").unwrap(), cube_before);
    assert_eq!(sim.pose_of("tf_tcp_1").unwrap(), tcp_before);

    assert!((first.seconds - second.seconds).abs() < 1e-9);
    assert_eq!(first.encoded, second.encoded);
    assert_eq!(operation.duration_seconds, Some(second.seconds));
    assert_eq!(sim.call_count("rewind"), 2);
}

#[tokio::test]
async fn robot_duration_follows_path_and_actuation() {
    let mut sim = laid_out_workcell().await;
    let settings = RobotConfig::default();
    let mut operation = RobotStrategy::new(settings.clone())
        .synthesize(&mut sim, 2, &common::identifiers())
        .await
        .unwrap();

    let waypoints = sim.robot_waypoints("RobotOp2").unwrap();
    let path: f64 = waypoints
        .windows(2)
        .map(|w| {
            let a = w[0].pose.unwrap().position;
            let b = w[1].pose.unwrap().position;
            a.distance(&b)
        })
        .sum();
    let expected = path / settings.speed + 2.0 * 0.5;

    let measured = DurationMeasurer::new(FixedPoint::new(3, 1000))
        .measure(&mut sim, &mut operation)
        .await
        .unwrap();
    assert!((measured.seconds - expected).abs() < 1e-9);
}

#[tokio::test]
async fn playback_carries_the_cube_until_rewind() {
    let mut sim = laid_out_workcell().await;
    let operation = RobotStrategy::new(RobotConfig::default())
        .synthesize(&mut sim, 3, &common::identifiers())
        .await
        .unwrap();
    let before = sim.pose_of("YAOSC_cube3").unwrap();
    let tray = sim.pose_of("NewTray").unwrap();

    sim.set_current_operation(operation.handle).await.unwrap();
    sim.play_silently().await.unwrap();
    assert_eq!(sim.pose_of("YAOSC_cube3").unwrap().position, tray.position);
    // The grasp frame rides along with its cube.
    assert_eq!(
        sim.pose_of("fr_cube3").unwrap().position,
        tray.position.add(&Vec3::new(0.0, 0.0, 25.0))
    );

    sim.rewind().await.unwrap();
    assert_eq!(sim.pose_of("YAOSC_cube3").unwrap(), before);
}

#[tokio::test]
async fn failed_duration_read_still_rewinds() {
    let mut sim = laid_out_workcell().await;
    let mut operation = RobotStrategy::new(RobotConfig::default())
        .synthesize(&mut sim, 1, &common::identifiers())
        .await
        .unwrap();
    let before = sim.pose_of("YAOSC_cube1").unwrap();
    sim.fail_on("get_duration");

    let outcome = DurationMeasurer::new(FixedPoint::new(3, 1000))
        .measure(&mut sim, &mut operation)
        .await;
    match outcome {
        Err(BackendError::Measurement { operation: name, .. }) => assert_eq!(name, "RobotOp1"),
        other => panic!("expected measurement error, got {:?}", other),
    }
    assert_eq!(sim.call_count("rewind"), 1);
    assert_eq!(sim.pose_of("YAOSC_cube1").unwrap(), before);
    assert_eq!(operation.duration_seconds, None);
}

#[tokio::test]
async fn robot_operation_shape() {
    let mut sim = laid_out_workcell().await;
    RobotStrategy::new(RobotConfig::default())
        .synthesize(&mut sim, 4, &common::identifiers())
        .await
        .unwrap();

    let waypoints = sim.robot_waypoints("RobotOp4").unwrap();
    assert_eq!(waypoints.len(), WAYPOINT_COUNT);
    assert_eq!(waypoints[0].name, "point1op4");
    assert_eq!(waypoints[7].name, "point8op4");
    for (i, w) in waypoints.iter().enumerate() {
        assert_eq!(w.params.as_ref().unwrap().motion_type, "MoveL");
        let expected = match i {
            CLOSE_WAYPOINT => Some(GripperAction::Close),
            OPEN_WAYPOINT => Some(GripperAction::Open),
            _ => None,
        };
        assert_eq!(w.gripper, expected);
    }
    let cube = sim.pose_of("YAOSC_cube4").unwrap().position;
    let descend = waypoints[CLOSE_WAYPOINT].pose.unwrap();
    assert_eq!(descend.position, cube);
    assert_eq!(descend.rotation, Vec3::new(PI, 0.0, 0.0));
}

#[tokio::test]
async fn human_duration_is_the_sum_of_its_steps() {
    let mut sim = laid_out_workcell().await;
    let settings = HumanConfig::default();
    let ids = common::identifiers();
    let mut operation = HumanStrategy::new(settings.clone())
        .synthesize(&mut sim, 2, &ids)
        .await
        .unwrap();

    let steps = sim.human_tasks("HumanOp2").unwrap();
    assert_eq!(steps.len(), 4);
    let human = sim.pose_of("Jack").unwrap().position;
    let cube = sim.pose_of("YAOSC_cube2").unwrap().position;
    let (grasp, place) = match (&steps[0], &steps[2]) {
        (HumanTask::Get { grasp_target, .. }, HumanTask::Put { target, .. }) => {
            (grasp_target.position, target.position)
        }
        other => panic!("unexpected task graph {:?}", other),
    };
    let expected = human.distance(&grasp) / 500.0
        + 0.4
        + settings.pose_duration_s
        + cube.distance(&place) / 500.0
        + 0.3
        + settings.pose_duration_s;

    let measured = DurationMeasurer::new(FixedPoint::new(3, 1000))
        .measure(&mut sim, &mut operation)
        .await
        .unwrap();
    assert!((measured.seconds - expected).abs() < 1e-9);
    assert_eq!(sim.call_count("play_silently"), 0);
    assert_eq!(sim.current_posture("Jack"), Some("UserHome"));
}

#[tokio::test]
async fn missing_object_fails_synthesis() {
    let mut sim = laid_out_workcell().await;
    let synthesizer = OperationSynthesizer::new(HumanConfig::default(), RobotConfig::default());
    let outcome = synthesizer
        .synthesize(&mut sim, Agent::Robot, 9, &common::identifiers())
        .await;
    assert_eq!(
        outcome.map(|op| op.name),
        Err(BackendError::ObjectLookup {
            name: "YAOSC_cube9".to_string()
        })
    );
    assert_eq!(sim.call_count("create_robot_operation"), 0);
}

#[tokio::test]
async fn unencodable_duration_is_a_measurement_error() {
    let mut sim = laid_out_workcell().await;
    let mut operation = HumanStrategy::new(HumanConfig::default())
        .synthesize(&mut sim, 1, &common::identifiers())
        .await
        .unwrap();

    // A few seconds scaled by i32::MAX cannot fit the wire integer.
    let outcome = DurationMeasurer::new(FixedPoint::new(3, i32::MAX))
        .measure(&mut sim, &mut operation)
        .await;
    match outcome {
        Err(BackendError::Measurement { operation: name, reason }) => {
            assert_eq!(name, "HumanOp1");
            assert!(reason.contains("does not fit an i32"), "{}", reason);
        }
        other => panic!("expected measurement error, got {:?}", other),
    }
    assert_eq!(operation.duration_seconds, None);
}

#[tokio::test]
async fn layout_orients_then_positions_and_refreshes_per_item() {
    let mut sim = WorkcellSimulator::seeded(&Config::default());
    apply_layout(&mut sim, &common::layout(3), &common::identifiers())
        .await
        .unwrap();

    assert_eq!(sim.refresh_count(), 3);
    let placements: Vec<&str> = sim
        .calls()
        .iter()
        .map(|(method, _)| *method)
        .filter(|m| *m != "find_object")
        .collect();
    assert_eq!(
        placements,
        ["set_absolute_pose", "set_relative_position"].repeat(3)
    );
    assert_eq!(
        sim.pose_of("YAOSC_cube2").unwrap().position,
        Vec3::new(520.0, -120.0, 0.0)
    );
}

#[tokio::test]
async fn home_waypoints_ignore_the_working_frame() {
    let mut sim = laid_out_workcell().await;
    sim.set_working_frame(Pose::from_translation(Vec3::new(100.0, -40.0, 50.0)));
    RobotStrategy::new(RobotConfig::default())
        .synthesize(&mut sim, 1, &common::identifiers())
        .await
        .unwrap();

    let tcp = sim.pose_of("tf_tcp_1").unwrap();
    let waypoints = sim.robot_waypoints("RobotOp1").unwrap();
    assert_eq!(waypoints[0].pose, Some(tcp));
    assert_eq!(waypoints[WAYPOINT_COUNT - 1].pose, Some(tcp));
}
