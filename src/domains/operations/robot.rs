use super::synthesizer::OperationStrategy;
use super::types::{Agent, DeviceCommand, GripperAction, MotionParameters, Operation, WaypointSpec};
use crate::common::{BackendError, BackendResult};
use crate::config::RobotConfig;
use crate::domains::scene::ports::SimulationBackend;
use crate::domains::scene::types::{Pose, Vec3};
use crate::domains::session::params::Identifiers;
use async_trait::async_trait;

pub const WAYPOINT_COUNT: usize = 8;
/// Descend-to-pick waypoint (third point), where the gripper closes.
pub const CLOSE_WAYPOINT: usize = 2;
/// Descend-to-place waypoint (sixth point), where the gripper opens.
pub const OPEN_WAYPOINT: usize = 5;

/// TCP, approach/descend/retreat over the pick, the same over the place, TCP.
pub fn plan_waypoints(
    task_index: usize,
    ids: &Identifiers,
    tcp: Pose,
    pick: Vec3,
    place: Vec3,
    approach_height: f64,
) -> Vec<WaypointSpec> {
    let above = |p: Vec3| Pose::tool_down(Vec3::new(p.x, p.y, p.z + approach_height));
    let at = |p: Vec3| Pose::tool_down(p);

    [tcp, above(pick), at(pick), above(pick), above(place), at(place), above(place), tcp]
        .into_iter()
        .enumerate()
        .map(|(i, pose)| WaypointSpec {
            name: ids.waypoint_name(i + 1, task_index),
            pose,
        })
        .collect()
}

pub struct RobotStrategy {
    settings: RobotConfig,
}

impl RobotStrategy {
    pub fn new(settings: RobotConfig) -> Self {
        Self { settings }
    }

    pub fn motion_parameters(&self) -> MotionParameters {
        MotionParameters {
            tool: self.settings.tool.clone(),
            motion_type: self.settings.motion_type.clone(),
            speed: self.settings.speed,
            acceleration: self.settings.acceleration,
            blend: self.settings.blend,
            coordinate_frame: self.settings.coordinate_frame.clone(),
        }
    }
}

#[async_trait]
impl OperationStrategy for RobotStrategy {
    fn agent(&self) -> Agent {
        Agent::Robot
    }

    async fn synthesize(
        &self,
        backend: &mut dyn SimulationBackend,
        task_index: usize,
        ids: &Identifiers,
    ) -> BackendResult<Operation> {
        let robot = backend.find_object(&ids.robot_name).await?;
        let tool_frame = backend.find_object(&self.settings.tcp_frame).await?;
        let object = backend.find_object(&ids.object_name(task_index)).await?;
        let target = backend.find_object(&ids.target_name).await?;

        // Every waypoint is placed absolutely, so the home pose is read absolutely too.
        let tcp = backend.absolute_pose(tool_frame).await?;
        let pick = backend.absolute_pose(object).await?.position;
        let place = backend.absolute_pose(target).await?.position;
        let plan = plan_waypoints(
            task_index,
            ids,
            tcp,
            pick,
            place,
            self.settings.approach_height,
        );

        let name = ids.operation_name(Agent::Robot, task_index);
        let handle = backend.create_robot_operation(&name).await?;
        let names: Vec<String> = plan.iter().map(|w| w.name.clone()).collect();
        let waypoints = backend.create_waypoint_sequence(handle, &names).await?;
        if waypoints.len() != WAYPOINT_COUNT {
            return Err(BackendError::Synthesis {
                operation: name,
                reason: format!(
                    "backend created {} waypoints, expected {}",
                    waypoints.len(),
                    WAYPOINT_COUNT
                ),
            });
        }

        for (waypoint, spec) in waypoints.iter().zip(&plan) {
            backend.set_waypoint_pose(*waypoint, spec.pose).await?;
        }

        backend.bind_robot(handle, robot).await?;

        let params = self.motion_parameters();
        for waypoint in &waypoints {
            backend.set_waypoint_motion_params(*waypoint, &params).await?;
        }

        let gripper = backend.find_object(&self.settings.gripper).await?;
        let closed = backend.find_object(&self.settings.close_pose).await?;
        let opened = backend.find_object(&self.settings.open_pose).await?;
        backend
            .attach_device_command(
                waypoints[CLOSE_WAYPOINT],
                &DeviceCommand::gripper(GripperAction::Close, gripper, closed, tool_frame),
            )
            .await?;
        backend
            .attach_device_command(
                waypoints[OPEN_WAYPOINT],
                &DeviceCommand::gripper(GripperAction::Open, gripper, opened, tool_frame),
            )
            .await?;

        tracing::debug!(operation = %name, "robot operation synthesized");
        Ok(Operation::new(name, task_index, Agent::Robot, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ids() -> Identifiers {
        let tokens: Vec<String> = ["cube", "H", "R", "tray", "fr", "Jack", "UR5e", "point"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        Identifiers::from_tokens(&tokens).unwrap()
    }

    #[test]
    fn waypoints_pin_tcp_and_bracket_pick_and_place() {
        let tcp = Pose::new(Vec3::new(0.0, 0.0, 600.0), Vec3::new(PI, 0.0, 0.3));
        let pick = Vec3::new(300.0, -150.0, 20.0);
        let place = Vec3::new(-100.0, 250.0, 40.0);
        let plan = plan_waypoints(3, &ids(), tcp, pick, place, 100.0);

        assert_eq!(plan.len(), WAYPOINT_COUNT);
        assert_eq!(plan[0].pose, tcp);
        assert_eq!(plan[7].pose, tcp);

        let z: Vec<f64> = plan[1..7].iter().map(|w| w.pose.position.z).collect();
        assert_eq!(z, vec![120.0, 20.0, 120.0, 140.0, 40.0, 140.0]);
        for w in &plan[1..4] {
            assert_eq!((w.pose.position.x, w.pose.position.y), (300.0, -150.0));
        }
        for w in &plan[4..7] {
            assert_eq!((w.pose.position.x, w.pose.position.y), (-100.0, 250.0));
        }
        for w in &plan[1..7] {
            assert_eq!(w.pose.rotation, Vec3::new(PI, 0.0, 0.0));
        }
    }

    #[test]
    fn waypoint_names_carry_point_and_task() {
        let plan = plan_waypoints(2, &ids(), Pose::identity(), Vec3::ZERO, Vec3::ZERO, 100.0);
        assert_eq!(plan[0].name, "point1op2");
        assert_eq!(plan[7].name, "point8op2");
    }

    #[test]
    fn gripper_commands_sit_on_descend_points() {
        let plan = plan_waypoints(
            1,
            &ids(),
            Pose::identity(),
            Vec3::new(1.0, 1.0, 5.0),
            Vec3::new(2.0, 2.0, 7.0),
            100.0,
        );
        assert_eq!(plan[CLOSE_WAYPOINT].pose.position.z, 5.0);
        assert_eq!(plan[OPEN_WAYPOINT].pose.position.z, 7.0);
    }

    #[test]
    fn motion_parameters_come_from_settings() {
        let strategy = RobotStrategy::new(RobotConfig::default());
        let params = strategy.motion_parameters();
        assert_eq!(params.tool, "tcp_1");
        assert_eq!(params.motion_type, "MoveL");
        assert_eq!(params.speed, 1000.0);
        assert_eq!(params.acceleration, 1200.0);
        assert_eq!(params.blend, 0.0);
        assert_eq!(params.coordinate_frame, "Cartesian");
    }
}
