use hrc_cosim::adapters::outbound::init_console_logger;
use hrc_cosim::application::{PlannerScript, PlannerStub};
use hrc_cosim::domains::session::{Identifiers, SessionParameters, COORDINATES_PER_POSE};
use hrc_cosim::Config;
use tokio::net::TcpStream;
use tracing::info;

/// Demo planner: `planner_stub [simulation_count] [seed]`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let simulation_count = args.next().map(|a| a.parse::<i32>()).transpose()?.unwrap_or(4);
    let seed = args.next().map(|a| a.parse::<u64>()).transpose()?.unwrap_or(42);

    let config = Config::load().await?;
    let cell = &config.workcell;
    let parameters = SessionParameters {
        simulation_count,
        decimal_precision: 3,
        fixed_point_multiplier: 1000,
        task_count: cell.item_count,
        item_count: cell.item_count,
        coordinates_per_item: COORDINATES_PER_POSE,
    };
    let identifiers = Identifiers {
        object_prefix: cell.object_prefix.clone(),
        human_operation_prefix: "HumanOp".to_string(),
        robot_operation_prefix: "RobotOp".to_string(),
        target_name: cell.target.clone(),
        frame_prefix: cell.frame_prefix.clone(),
        human_name: cell.human.clone(),
        robot_name: cell.robot.clone(),
        waypoint_prefix: "point".to_string(),
    };
    let script = PlannerScript::random(parameters, identifiers, seed);

    let address = config.server.address();
    let stream = TcpStream::connect(&address).await?;
    info!(%address, "connected to co-simulation service");

    let stub = PlannerStub::new(config.protocol.clone(), init_console_logger("planner"));
    for planned in stub.run(stream, &script).await? {
        info!(
            iteration = planned.iteration,
            durations = ?planned.durations,
            order = ?planned.order,
            offsets = ?planned.offsets,
            "iteration scheduled"
        );
    }
    Ok(())
}
