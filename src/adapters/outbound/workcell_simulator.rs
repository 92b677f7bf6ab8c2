use crate::common::{BackendError, BackendResult};
use crate::config::Config;
use crate::domains::operations::types::{DeviceCommand, GripperAction, HumanTask, MotionParameters};
use crate::domains::scene::ports::{
    CompositeHandle, ObjectHandle, OperationHandle, PostureHandle, SimulationBackend, TaskHandle,
    WaypointHandle,
};
use crate::domains::scene::types::{Pose, Vec3};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Timing model of the in-memory workcell.
#[derive(Debug, Clone, PartialEq)]
pub struct SimTiming {
    /// Hand travel speed in mm/s.
    pub reach_speed: f64,
    pub grasp_seconds: f64,
    pub release_seconds: f64,
    /// Added per device command passed during playback.
    pub actuation_seconds: f64,
    /// Used when a waypoint carries no motion parameters.
    pub default_robot_speed: f64,
    /// An object this close to the close-gripper waypoint is carried along.
    pub grip_tolerance: f64,
}

impl Default for SimTiming {
    fn default() -> Self {
        Self {
            reach_speed: 500.0,
            grasp_seconds: 0.4,
            release_seconds: 0.3,
            actuation_seconds: 0.5,
            default_robot_speed: 250.0,
            grip_tolerance: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct SceneObject {
    name: String,
    pose: Pose,
    /// Parent object and offset along the parent's axes.
    attached_to: Option<(ObjectHandle, Vec3)>,
}

#[derive(Debug, Clone)]
struct Waypoint {
    name: String,
    pose: Option<Pose>,
    params: Option<MotionParameters>,
    command: Option<DeviceCommand>,
}

#[derive(Debug, Clone)]
struct HumanStep {
    handle: TaskHandle,
    task: HumanTask,
    seconds: Option<f64>,
}

#[derive(Debug, Clone)]
enum SimOperation {
    Human {
        name: String,
        steps: Vec<HumanStep>,
    },
    Robot {
        name: String,
        waypoints: Vec<WaypointHandle>,
        robot: Option<ObjectHandle>,
        played_seconds: Option<f64>,
    },
}

impl SimOperation {
    fn name(&self) -> &str {
        match self {
            SimOperation::Human { name, .. } | SimOperation::Robot { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Composite {
    name: String,
    children: Vec<(OperationHandle, Option<f64>)>,
}

/// A waypoint as stored in the workcell, for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointView {
    pub name: String,
    pub pose: Option<Pose>,
    pub params: Option<MotionParameters>,
    pub gripper: Option<GripperAction>,
}

/// A composite's children with their start offsets, for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeView {
    pub name: String,
    pub children: Vec<(String, Option<f64>)>,
}

/// Kinematics-free stand-in for the simulation engine.
///
/// Scene objects live in a flat name registry; frames may hang off other
/// objects. Human operations are timed per applied step from reach distance.
/// Robot operations are timed by playing their waypoint path, which moves the
/// tool frame and any gripped object until `rewind` restores the scene.
#[derive(Debug, Default)]
pub struct WorkcellSimulator {
    timing: SimTiming,
    next_id: u64,
    names: HashMap<String, ObjectHandle>,
    objects: HashMap<ObjectHandle, SceneObject>,
    working_frame: Pose,
    known_postures: HashSet<String>,
    postures: HashMap<PostureHandle, (ObjectHandle, String)>,
    human_posture: HashMap<ObjectHandle, String>,
    operations: HashMap<OperationHandle, SimOperation>,
    waypoints: HashMap<WaypointHandle, Waypoint>,
    composites: HashMap<CompositeHandle, Composite>,
    current: Option<OperationHandle>,
    tool_frame: Option<ObjectHandle>,
    scene_snapshot: Option<HashMap<ObjectHandle, Pose>>,
    failing: HashSet<String>,
    calls: Vec<(&'static str, String)>,
    refreshes: usize,
}

impl WorkcellSimulator {
    pub fn new(timing: SimTiming) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    /// A workcell matching the configured names: cubes in a row in front of
    /// the robot, one grasp frame above each, the tray to the side.
    pub fn seeded(config: &Config) -> Self {
        let mut sim = Self::new(SimTiming::default());
        let cell = &config.workcell;

        sim.add_object(&cell.robot, Pose::identity());
        sim.add_object(&cell.human, Pose::from_translation(Vec3::new(900.0, 0.0, 0.0)));
        sim.add_object(&cell.target, Pose::from_translation(Vec3::new(-300.0, 450.0, 0.0)));
        let tcp = sim.add_object(
            &config.robot.tcp_frame,
            Pose::tool_down(Vec3::new(0.0, 0.0, 600.0)),
        );
        sim.set_tool_frame(tcp);
        sim.add_object(&config.robot.gripper, Pose::identity());
        sim.add_object(&config.robot.close_pose, Pose::identity());
        sim.add_object(&config.robot.open_pose, Pose::identity());

        for i in 1..=cell.item_count {
            let y = if i % 2 == 0 { -150.0 } else { 150.0 };
            let cube = sim.add_object(
                &format!("{}{}", cell.object_prefix, i),
                Pose::from_translation(Vec3::new(300.0 + 100.0 * i as f64, y, 0.0)),
            );
            sim.attach_frame(
                &format!("{}{}", cell.frame_prefix, i),
                cube,
                Vec3::new(0.0, 0.0, 25.0),
            );
        }

        sim.add_posture(&config.human.leaned_posture);
        sim.add_posture(&config.human.home_posture);
        sim
    }

    fn next_handle(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_object(&mut self, name: &str, pose: Pose) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle());
        self.names.insert(name.to_string(), handle);
        self.objects.insert(
            handle,
            SceneObject {
                name: name.to_string(),
                pose,
                attached_to: None,
            },
        );
        handle
    }

    /// A frame that follows `parent` at `offset` along the parent's axes.
    pub fn attach_frame(&mut self, name: &str, parent: ObjectHandle, offset: Vec3) -> ObjectHandle {
        let handle = self.add_object(name, Pose::identity());
        if let Some(frame) = self.objects.get_mut(&handle) {
            frame.attached_to = Some((parent, offset));
        }
        handle
    }

    pub fn add_posture(&mut self, name: &str) {
        self.known_postures.insert(name.to_string());
    }

    /// The object moved by robot playback.
    pub fn set_tool_frame(&mut self, frame: ObjectHandle) {
        self.tool_frame = Some(frame);
    }

    pub fn set_working_frame(&mut self, frame: Pose) {
        self.working_frame = frame;
    }

    /// Makes every later call to `method` fail.
    pub fn fail_on(&mut self, method: &str) {
        self.failing.insert(method.to_string());
    }

    pub fn calls(&self) -> &[(&'static str, String)] {
        &self.calls
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.iter().filter(|(m, _)| *m == method).count()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes
    }

    pub fn pose_of(&self, name: &str) -> Option<Pose> {
        let handle = self.names.get(name)?;
        self.resolve(*handle).ok()
    }

    pub fn current_posture(&self, human: &str) -> Option<&str> {
        let handle = self.names.get(human)?;
        self.human_posture.get(handle).map(String::as_str)
    }

    /// Operations in creation order.
    pub fn operation_names(&self) -> Vec<String> {
        let mut handles: Vec<&OperationHandle> = self.operations.keys().collect();
        handles.sort();
        handles
            .into_iter()
            .filter_map(|h| self.operations.get(h))
            .map(|op| op.name().to_string())
            .collect()
    }

    fn operation_by_name(&self, name: &str) -> Option<&SimOperation> {
        let mut matches: Vec<(&OperationHandle, &SimOperation)> = self
            .operations
            .iter()
            .filter(|(_, op)| op.name() == name)
            .collect();
        matches.sort_by_key(|(h, _)| **h);
        matches.last().map(|(_, op)| *op)
    }

    /// Steps of the most recent human operation called `name`.
    pub fn human_tasks(&self, name: &str) -> Option<Vec<HumanTask>> {
        match self.operation_by_name(name)? {
            SimOperation::Human { steps, .. } => Some(steps.iter().map(|s| s.task.clone()).collect()),
            SimOperation::Robot { .. } => None,
        }
    }

    /// Waypoints of the most recent robot operation called `name`.
    pub fn robot_waypoints(&self, name: &str) -> Option<Vec<WaypointView>> {
        match self.operation_by_name(name)? {
            SimOperation::Robot { waypoints, .. } => Some(
                waypoints
                    .iter()
                    .filter_map(|h| self.waypoints.get(h))
                    .map(|w| WaypointView {
                        name: w.name.clone(),
                        pose: w.pose,
                        params: w.params.clone(),
                        gripper: w.command.as_ref().map(|c| c.action),
                    })
                    .collect(),
            ),
            SimOperation::Human { .. } => None,
        }
    }

    pub fn composite(&self, name: &str) -> Option<CompositeView> {
        let composite = self.composites.values().find(|c| c.name == name)?;
        Some(CompositeView {
            name: composite.name.clone(),
            children: composite
                .children
                .iter()
                .map(|(h, start)| {
                    let child = self
                        .operations
                        .get(h)
                        .map(|op| op.name().to_string())
                        .unwrap_or_default();
                    (child, *start)
                })
                .collect(),
        })
    }

    fn record(&mut self, method: &'static str, detail: String) -> BackendResult<()> {
        self.calls.push((method, detail));
        if self.failing.contains(method) {
            return Err(BackendError::Synthesis {
                operation: method.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn object(&self, handle: ObjectHandle) -> BackendResult<&SceneObject> {
        self.objects
            .get(&handle)
            .ok_or_else(|| BackendError::InvalidHandle(handle.to_string()))
    }

    fn resolve(&self, handle: ObjectHandle) -> BackendResult<Pose> {
        let object = self.object(handle)?;
        match object.attached_to {
            Some((parent, offset)) => {
                let base = self.resolve(parent)?;
                Ok(base.translated_local(offset))
            }
            None => Ok(object.pose),
        }
    }

    fn waypoint_mut(&mut self, handle: WaypointHandle) -> BackendResult<&mut Waypoint> {
        self.waypoints
            .get_mut(&handle)
            .ok_or_else(|| BackendError::InvalidHandle(handle.to_string()))
    }

    fn step_seconds(&self, task: &HumanTask) -> BackendResult<f64> {
        let t = &self.timing;
        Ok(match task {
            HumanTask::Get {
                human, grasp_target, ..
            } => {
                let from = self.resolve(*human)?.position;
                from.distance(&grasp_target.position) / t.reach_speed + t.grasp_seconds
            }
            HumanTask::Put { object, target, .. } => {
                let from = self.resolve(*object)?.position;
                from.distance(&target.position) / t.reach_speed + t.release_seconds
            }
            HumanTask::Pose { duration, .. } => *duration,
        })
    }

    /// Path length over speed per segment, plus actuation per device command.
    fn play_robot(&mut self, waypoints: &[WaypointHandle]) -> BackendResult<f64> {
        let mut path = Vec::with_capacity(waypoints.len());
        for handle in waypoints {
            let w = self
                .waypoints
                .get(handle)
                .ok_or_else(|| BackendError::InvalidHandle(handle.to_string()))?;
            let pose = w.pose.ok_or_else(|| BackendError::Measurement {
                operation: w.name.clone(),
                reason: "waypoint has no pose".to_string(),
            })?;
            let speed = w
                .params
                .as_ref()
                .map(|p| p.speed)
                .filter(|s| *s > 0.0)
                .unwrap_or(self.timing.default_robot_speed);
            path.push((pose, speed, w.command.as_ref().map(|c| c.action)));
        }

        let mut seconds = 0.0;
        let mut gripped: Option<(ObjectHandle, Vec3)> = None;
        for (i, (pose, speed, action)) in path.iter().enumerate() {
            if i > 0 {
                seconds += path[i - 1].0.position.distance(&pose.position) / speed;
            }
            if let Some((object, offset)) = gripped {
                self.place_object(object, pose.position.add(&offset));
            }
            match action {
                Some(GripperAction::Close) => {
                    seconds += self.timing.actuation_seconds;
                    gripped = self.nearest_free_object(pose.position).map(|o| {
                        let at = self.resolve(o).map(|p| p.position).unwrap_or(pose.position);
                        (o, at.sub(&pose.position))
                    });
                }
                Some(GripperAction::Open) => {
                    seconds += self.timing.actuation_seconds;
                    gripped = None;
                }
                None => {}
            }
        }

        if let (Some(tool), Some((last, _, _))) = (self.tool_frame, path.last()) {
            self.place_object(tool, last.position);
        }
        Ok(seconds)
    }

    fn nearest_free_object(&self, at: Vec3) -> Option<ObjectHandle> {
        self.objects
            .iter()
            .filter(|(h, o)| o.attached_to.is_none() && Some(**h) != self.tool_frame)
            .filter_map(|(h, _)| {
                let d = self.resolve(*h).ok()?.position.distance(&at);
                (d <= self.timing.grip_tolerance).then_some((*h, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    }

    fn place_object(&mut self, handle: ObjectHandle, position: Vec3) {
        if let Some(object) = self.objects.get_mut(&handle) {
            object.pose.position = position;
        }
    }
}

#[async_trait]
impl SimulationBackend for WorkcellSimulator {
    async fn find_object(&mut self, name: &str) -> BackendResult<ObjectHandle> {
        self.record("find_object", name.to_string())?;
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| BackendError::ObjectLookup {
                name: name.to_string(),
            })
    }

    async fn absolute_pose(&mut self, object: ObjectHandle) -> BackendResult<Pose> {
        self.record("absolute_pose", object.to_string())?;
        self.resolve(object)
    }

    async fn set_absolute_pose(&mut self, object: ObjectHandle, pose: Pose) -> BackendResult<()> {
        self.record("set_absolute_pose", object.to_string())?;
        let target = self
            .objects
            .get_mut(&object)
            .ok_or_else(|| BackendError::InvalidHandle(object.to_string()))?;
        target.pose = pose;
        target.attached_to = None;
        Ok(())
    }

    async fn set_relative_position(
        &mut self,
        object: ObjectHandle,
        position: Vec3,
    ) -> BackendResult<()> {
        self.record("set_relative_position", object.to_string())?;
        let absolute = self.working_frame.translated_local(position).position;
        let target = self
            .objects
            .get_mut(&object)
            .ok_or_else(|| BackendError::InvalidHandle(object.to_string()))?;
        target.pose.position = absolute;
        tracing::trace!(object = %target.name, x = absolute.x, y = absolute.y, z = absolute.z, "moved");
        Ok(())
    }

    async fn capture_posture(
        &mut self,
        human: ObjectHandle,
        posture: &str,
    ) -> BackendResult<PostureHandle> {
        self.record("capture_posture", posture.to_string())?;
        self.object(human)?;
        if !self.known_postures.contains(posture) {
            return Err(BackendError::ObjectLookup {
                name: posture.to_string(),
            });
        }
        self.human_posture.insert(human, posture.to_string());
        let handle = PostureHandle(self.next_handle());
        self.postures.insert(handle, (human, posture.to_string()));
        Ok(handle)
    }

    async fn create_human_operation(&mut self, name: &str) -> BackendResult<OperationHandle> {
        self.record("create_human_operation", name.to_string())?;
        let handle = OperationHandle(self.next_handle());
        self.operations.insert(
            handle,
            SimOperation::Human {
                name: name.to_string(),
                steps: Vec::new(),
            },
        );
        Ok(handle)
    }

    async fn create_task(
        &mut self,
        operation: OperationHandle,
        task: &HumanTask,
        predecessor: Option<TaskHandle>,
    ) -> BackendResult<TaskHandle> {
        self.record("create_task", task.label().to_string())?;
        if let HumanTask::Pose { posture, .. } = task {
            if !self.postures.contains_key(posture) {
                return Err(BackendError::InvalidHandle(posture.to_string()));
            }
        }
        let handle = TaskHandle(self.next_handle());
        match self.operations.get_mut(&operation) {
            Some(SimOperation::Human { steps, .. }) => {
                let last = steps.last().map(|s| s.handle);
                if last != predecessor {
                    return Err(BackendError::Synthesis {
                        operation: operation.to_string(),
                        reason: format!("task must follow {:?}, not {:?}", last, predecessor),
                    });
                }
                steps.push(HumanStep {
                    handle,
                    task: task.clone(),
                    seconds: None,
                });
                Ok(handle)
            }
            _ => Err(BackendError::InvalidHandle(operation.to_string())),
        }
    }

    async fn apply_task(&mut self, operation: OperationHandle, task: TaskHandle) -> BackendResult<()> {
        self.record("apply_task", task.to_string())?;
        let step = match self.operations.get(&operation) {
            Some(SimOperation::Human { steps, .. }) => steps
                .iter()
                .find(|s| s.handle == task)
                .map(|s| s.task.clone())
                .ok_or_else(|| BackendError::InvalidHandle(task.to_string()))?,
            _ => return Err(BackendError::InvalidHandle(operation.to_string())),
        };
        let seconds = self.step_seconds(&step)?;
        if let HumanTask::Pose { human, posture, .. } = &step {
            if let Some((_, name)) = self.postures.get(posture).cloned() {
                self.human_posture.insert(*human, name);
            }
        }
        if let Some(SimOperation::Human { steps, .. }) = self.operations.get_mut(&operation) {
            if let Some(s) = steps.iter_mut().find(|s| s.handle == task) {
                s.seconds = Some(seconds);
            }
        }
        Ok(())
    }

    async fn create_robot_operation(&mut self, name: &str) -> BackendResult<OperationHandle> {
        self.record("create_robot_operation", name.to_string())?;
        let handle = OperationHandle(self.next_handle());
        self.operations.insert(
            handle,
            SimOperation::Robot {
                name: name.to_string(),
                waypoints: Vec::new(),
                robot: None,
                played_seconds: None,
            },
        );
        Ok(handle)
    }

    async fn create_waypoint_sequence(
        &mut self,
        operation: OperationHandle,
        names: &[String],
    ) -> BackendResult<Vec<WaypointHandle>> {
        self.record("create_waypoint_sequence", names.join(","))?;
        if !matches!(self.operations.get(&operation), Some(SimOperation::Robot { .. })) {
            return Err(BackendError::InvalidHandle(operation.to_string()));
        }
        let mut created = Vec::with_capacity(names.len());
        for name in names {
            let handle = WaypointHandle(self.next_handle());
            self.waypoints.insert(
                handle,
                Waypoint {
                    name: name.clone(),
                    pose: None,
                    params: None,
                    command: None,
                },
            );
            created.push(handle);
        }
        if let Some(SimOperation::Robot { waypoints, .. }) = self.operations.get_mut(&operation) {
            waypoints.extend(created.iter().copied());
        }
        Ok(created)
    }

    async fn set_waypoint_pose(&mut self, waypoint: WaypointHandle, pose: Pose) -> BackendResult<()> {
        self.record("set_waypoint_pose", waypoint.to_string())?;
        self.waypoint_mut(waypoint)?.pose = Some(pose);
        Ok(())
    }

    async fn set_waypoint_motion_params(
        &mut self,
        waypoint: WaypointHandle,
        params: &MotionParameters,
    ) -> BackendResult<()> {
        self.record("set_waypoint_motion_params", waypoint.to_string())?;
        self.waypoint_mut(waypoint)?.params = Some(params.clone());
        Ok(())
    }

    async fn bind_robot(&mut self, operation: OperationHandle, robot: ObjectHandle) -> BackendResult<()> {
        self.record("bind_robot", operation.to_string())?;
        self.object(robot)?;
        match self.operations.get_mut(&operation) {
            Some(SimOperation::Robot { robot: bound, .. }) => {
                *bound = Some(robot);
                Ok(())
            }
            _ => Err(BackendError::InvalidHandle(operation.to_string())),
        }
    }

    async fn attach_device_command(
        &mut self,
        waypoint: WaypointHandle,
        command: &DeviceCommand,
    ) -> BackendResult<()> {
        self.record("attach_device_command", format!("{:?}", command.action))?;
        for element in &command.elements {
            self.object(element.target)?;
        }
        self.waypoint_mut(waypoint)?.command = Some(command.clone());
        Ok(())
    }

    async fn get_duration(&mut self, operation: OperationHandle) -> BackendResult<f64> {
        self.record("get_duration", operation.to_string())?;
        match self.operations.get(&operation) {
            Some(SimOperation::Human { name, steps }) => {
                steps.iter().map(|s| s.seconds).sum::<Option<f64>>().ok_or_else(|| {
                    BackendError::Measurement {
                        operation: name.clone(),
                        reason: "task graph has unapplied steps".to_string(),
                    }
                })
            }
            Some(SimOperation::Robot {
                name,
                played_seconds,
                ..
            }) => played_seconds.ok_or_else(|| BackendError::Measurement {
                operation: name.clone(),
                reason: "operation has not been played".to_string(),
            }),
            None => Err(BackendError::InvalidHandle(operation.to_string())),
        }
    }

    async fn set_current_operation(&mut self, operation: OperationHandle) -> BackendResult<()> {
        self.record("set_current_operation", operation.to_string())?;
        if !self.operations.contains_key(&operation) {
            return Err(BackendError::InvalidHandle(operation.to_string()));
        }
        self.current = Some(operation);
        Ok(())
    }

    async fn play_silently(&mut self) -> BackendResult<()> {
        self.record("play_silently", String::new())?;
        let current = self.current.ok_or_else(|| BackendError::Measurement {
            operation: "<none>".to_string(),
            reason: "no current operation".to_string(),
        })?;
        let (name, waypoints) = match self.operations.get(&current) {
            Some(SimOperation::Robot {
                name,
                waypoints,
                robot: Some(_),
                ..
            }) => (name.clone(), waypoints.clone()),
            Some(op) => {
                return Err(BackendError::Measurement {
                    operation: op.name().to_string(),
                    reason: "not a bound robot operation".to_string(),
                })
            }
            None => return Err(BackendError::InvalidHandle(current.to_string())),
        };

        if self.scene_snapshot.is_none() {
            self.scene_snapshot = Some(
                self.objects
                    .iter()
                    .map(|(h, o)| (*h, o.pose))
                    .collect(),
            );
        }
        let seconds = self.play_robot(&waypoints)?;
        if let Some(SimOperation::Robot { played_seconds, .. }) = self.operations.get_mut(&current) {
            *played_seconds = Some(seconds);
        }
        tracing::trace!(operation = %name, seconds, "playback finished");
        Ok(())
    }

    async fn rewind(&mut self) -> BackendResult<()> {
        self.record("rewind", String::new())?;
        if let Some(snapshot) = self.scene_snapshot.take() {
            for (handle, pose) in snapshot {
                if let Some(object) = self.objects.get_mut(&handle) {
                    object.pose = pose;
                }
            }
        }
        Ok(())
    }

    async fn create_composite_operation(&mut self, name: &str) -> BackendResult<CompositeHandle> {
        self.record("create_composite_operation", name.to_string())?;
        let handle = CompositeHandle(self.next_handle());
        self.composites.insert(
            handle,
            Composite {
                name: name.to_string(),
                children: Vec::new(),
            },
        );
        Ok(handle)
    }

    async fn add_child(
        &mut self,
        composite: CompositeHandle,
        operation: OperationHandle,
    ) -> BackendResult<()> {
        self.record("add_child", operation.to_string())?;
        if !self.operations.contains_key(&operation) {
            return Err(BackendError::InvalidHandle(operation.to_string()));
        }
        let target = self
            .composites
            .get_mut(&composite)
            .ok_or_else(|| BackendError::InvalidHandle(composite.to_string()))?;
        if target.children.iter().any(|(h, _)| *h == operation) {
            return Err(BackendError::Synthesis {
                operation: target.name.clone(),
                reason: format!("{} is already a child", operation),
            });
        }
        target.children.push((operation, None));
        Ok(())
    }

    async fn set_child_start_time(
        &mut self,
        composite: CompositeHandle,
        operation: OperationHandle,
        offset_seconds: f64,
    ) -> BackendResult<()> {
        self.record("set_child_start_time", format!("{} {}", operation, offset_seconds))?;
        let target = self
            .composites
            .get_mut(&composite)
            .ok_or_else(|| BackendError::InvalidHandle(composite.to_string()))?;
        let child = target
            .children
            .iter_mut()
            .find(|(h, _)| *h == operation)
            .ok_or_else(|| BackendError::InvalidHandle(operation.to_string()))?;
        child.1 = Some(offset_seconds);
        Ok(())
    }

    async fn refresh_display(&mut self) {
        self.refreshes += 1;
    }
}
