use hrc_cosim::adapters::inbound::PlannerListener;
use hrc_cosim::adapters::outbound::{logger_from_config, WorkcellSimulator};
use hrc_cosim::application::SessionService;
use hrc_cosim::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().await?;
    let logger = logger_from_config(&config.logging, "cosim");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling session");
            on_interrupt.cancel();
        }
    });

    let address = config.server.address();
    let listener = PlannerListener::bind(&address).await?;
    info!(%address, "waiting for planner");
    let (stream, _peer) = listener.accept(&cancel).await?;
    // One planner per process.
    drop(listener);

    let backend = WorkcellSimulator::seeded(&config);
    let mut service = SessionService::new(config.clone(), logger, backend);
    let report = service.run(stream, cancel).await?;

    if let Some(path) = &config.report.json_path {
        report.write_json(path).await?;
        info!(path = %path.display(), "session report written");
    }
    Ok(())
}
