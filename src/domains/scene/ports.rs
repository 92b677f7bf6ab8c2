use crate::common::BackendResult;
use crate::domains::operations::types::{DeviceCommand, HumanTask, MotionParameters};
use crate::domains::scene::types::{Pose, Vec3};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

handle!(ObjectHandle);
handle!(OperationHandle);
handle!(TaskHandle);
handle!(WaypointHandle);
handle!(CompositeHandle);
handle!(PostureHandle);

/// Port onto the external simulation engine.
///
/// Only `find_object` resolves names; everything after that is addressed by
/// the typed handles the backend hands out.
#[async_trait]
pub trait SimulationBackend: Send {
    async fn find_object(&mut self, name: &str) -> BackendResult<ObjectHandle>;
    async fn absolute_pose(&mut self, object: ObjectHandle) -> BackendResult<Pose>;
    async fn set_absolute_pose(&mut self, object: ObjectHandle, pose: Pose) -> BackendResult<()>;
    /// Moves the object to `position` in the backend's working frame, keeping its orientation.
    async fn set_relative_position(&mut self, object: ObjectHandle, position: Vec3)
        -> BackendResult<()>;

    /// Applies a named posture to the human and returns a snapshot of it.
    async fn capture_posture(&mut self, human: ObjectHandle, posture: &str)
        -> BackendResult<PostureHandle>;

    async fn create_human_operation(&mut self, name: &str) -> BackendResult<OperationHandle>;
    async fn create_task(
        &mut self,
        operation: OperationHandle,
        task: &HumanTask,
        predecessor: Option<TaskHandle>,
    ) -> BackendResult<TaskHandle>;
    async fn apply_task(&mut self, operation: OperationHandle, task: TaskHandle) -> BackendResult<()>;

    async fn create_robot_operation(&mut self, name: &str) -> BackendResult<OperationHandle>;
    /// Creates the waypoints in order, each one after the previous.
    async fn create_waypoint_sequence(
        &mut self,
        operation: OperationHandle,
        names: &[String],
    ) -> BackendResult<Vec<WaypointHandle>>;
    /// `pose` is absolute, not relative to the working frame.
    async fn set_waypoint_pose(&mut self, waypoint: WaypointHandle, pose: Pose) -> BackendResult<()>;
    async fn set_waypoint_motion_params(
        &mut self,
        waypoint: WaypointHandle,
        params: &MotionParameters,
    ) -> BackendResult<()>;
    async fn bind_robot(&mut self, operation: OperationHandle, robot: ObjectHandle) -> BackendResult<()>;
    async fn attach_device_command(
        &mut self,
        waypoint: WaypointHandle,
        command: &DeviceCommand,
    ) -> BackendResult<()>;

    async fn get_duration(&mut self, operation: OperationHandle) -> BackendResult<f64>;
    async fn set_current_operation(&mut self, operation: OperationHandle) -> BackendResult<()>;
    async fn play_silently(&mut self) -> BackendResult<()>;
    async fn rewind(&mut self) -> BackendResult<()>;

    async fn create_composite_operation(&mut self, name: &str) -> BackendResult<CompositeHandle>;
    async fn add_child(&mut self, composite: CompositeHandle, operation: OperationHandle)
        -> BackendResult<()>;
    async fn set_child_start_time(
        &mut self,
        composite: CompositeHandle,
        operation: OperationHandle,
        offset_seconds: f64,
    ) -> BackendResult<()>;

    async fn refresh_display(&mut self);
}
