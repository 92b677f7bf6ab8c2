#![allow(dead_code)]

use hrc_cosim::adapters::outbound::{MemoryLogger, WorkcellSimulator};
use hrc_cosim::application::SessionService;
use hrc_cosim::domains::scene::{ItemPose, Layout, Pose, Vec3};
use hrc_cosim::domains::session::{Identifiers, SessionParameters, COORDINATES_PER_POSE};
use hrc_cosim::Config;
use std::sync::Arc;

pub fn config() -> Config {
    let mut config = Config::default();
    config.protocol.read_timeout_ms = 5_000;
    config
}

pub fn identifiers() -> Identifiers {
    let tokens: Vec<String> = [
        "YAOSC_cube",
        "HumanOp",
        "RobotOp",
        "NewTray",
        "fr_cube",
        "Jack",
        "UR5e",
        "point",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    Identifiers::from_tokens(&tokens).unwrap()
}

pub fn parameters(simulation_count: i32, tasks: usize) -> SessionParameters {
    SessionParameters {
        simulation_count,
        decimal_precision: 3,
        fixed_point_multiplier: 1000,
        task_count: tasks,
        item_count: tasks,
        coordinates_per_item: COORDINATES_PER_POSE,
    }
}

/// Items alternate left and right of the robot, spaced along X.
pub fn layout(items: usize) -> Layout {
    Layout {
        items: (1..=items)
            .map(|index| ItemPose {
                index,
                pose: Pose::from_translation(Vec3::new(
                    400.0 + 60.0 * index as f64,
                    if index % 2 == 0 { -120.0 } else { 120.0 },
                    0.0,
                )),
            })
            .collect(),
    }
}

pub fn service(config: Config) -> (SessionService<WorkcellSimulator>, Arc<MemoryLogger>) {
    let logger = MemoryLogger::new();
    let backend = WorkcellSimulator::seeded(&config);
    (SessionService::new(config, logger.clone(), backend), logger)
}
