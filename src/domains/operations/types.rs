use crate::domains::scene::ports::{ObjectHandle, OperationHandle, PostureHandle};
use crate::domains::scene::types::Pose;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent tag as carried in the assignment frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Agent {
    Robot,
    Human,
}

impl Agent {
    pub fn from_tag(tag: i32) -> Option<Agent> {
        match tag {
            0 => Some(Agent::Robot),
            1 => Some(Agent::Human),
            _ => None,
        }
    }

    pub fn tag(&self) -> i32 {
        match self {
            Agent::Robot => 0,
            Agent::Human => 1,
        }
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Agent::Robot => write!(f, "robot"),
            Agent::Human => write!(f, "human"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    Right,
    Left,
}

impl Hand {
    /// Non-negative lateral coordinate grasps with the right hand, boundary included.
    pub fn for_lateral(y: f64) -> Hand {
        if y >= 0.0 {
            Hand::Right
        } else {
            Hand::Left
        }
    }
}

/// One synthesized unit of work, identified by `{strategyPrefix}{taskIndex}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    pub task_index: usize,
    pub agent: Agent,
    pub handle: OperationHandle,
    pub duration_seconds: Option<f64>,
}

impl Operation {
    pub fn new(name: String, task_index: usize, agent: Agent, handle: OperationHandle) -> Self {
        Self {
            name,
            task_index,
            agent,
            handle,
            duration_seconds: None,
        }
    }
}

/// One step of a Human task graph.
#[derive(Debug, Clone, PartialEq)]
pub enum HumanTask {
    Get {
        human: ObjectHandle,
        object: ObjectHandle,
        target: Pose,
        effector: Hand,
        grasp_target: Pose,
        keep_uninvolved_hand_still: bool,
    },
    Pose {
        human: ObjectHandle,
        posture: PostureHandle,
        duration: f64,
    },
    Put {
        human: ObjectHandle,
        object: ObjectHandle,
        target: Pose,
    },
}

impl HumanTask {
    pub fn label(&self) -> &'static str {
        match self {
            HumanTask::Get { .. } => "get",
            HumanTask::Pose { .. } => "pose",
            HumanTask::Put { .. } => "put",
        }
    }
}

/// Controller parameters applied to every waypoint of a Robot operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionParameters {
    pub tool: String,
    pub motion_type: String,
    pub speed: f64,
    pub acceleration: f64,
    pub blend: f64,
    pub coordinate_frame: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaypointSpec {
    pub name: String,
    pub pose: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GripperAction {
    Close,
    Open,
}

impl GripperAction {
    pub fn final_marker(&self) -> &'static str {
        match self {
            GripperAction::Close => "# Grip",
            GripperAction::Open => "# Release",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandElement {
    pub marker: &'static str,
    pub target: ObjectHandle,
}

/// Scripted device actuation attached to a waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub action: GripperAction,
    pub elements: Vec<CommandElement>,
}

impl DeviceCommand {
    /// Destination, drive, destination, wait-for-device, then grip or release.
    pub fn gripper(
        action: GripperAction,
        gripper: ObjectHandle,
        pose: ObjectHandle,
        tool_frame: ObjectHandle,
    ) -> Self {
        let elements = vec![
            CommandElement { marker: "# Destination", target: gripper },
            CommandElement { marker: "# Drive", target: pose },
            CommandElement { marker: "# Destination", target: gripper },
            CommandElement { marker: "# WaitDevice", target: pose },
            CommandElement { marker: action.final_marker(), target: tool_frame },
        ];
        Self { action, elements }
    }
}
