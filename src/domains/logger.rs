use chrono::Utc;
use std::sync::Arc;

/// Session-level progress reporting port.
/// Infallible from the caller's side; adapters decide where lines end up.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// Forwards to the `log` facade, which `fast_log` routes into a rolling file.
/// Every line carries a UTC timestamp and the component that emitted it.
pub struct FileLogger {
    component: String,
}

impl FileLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Installs `fast_log` as the global `log` backend, writing to `path` only.
    /// Only the first call in a process can succeed.
    pub fn init(path: &str, level: log::LevelFilter) -> Result<(), Box<dyn std::error::Error>> {
        fast_log::init(fast_log::config::Config::new().file(path).level(level))?;
        Ok(())
    }

    fn line(&self, msg: &str) -> String {
        format!("{} [{}] {}", Utc::now().to_rfc3339(), self.component, msg)
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log::info!("{}", self.line(msg));
    }

    fn warn(&self, msg: &str) {
        log::warn!("{}", self.line(msg));
    }

    fn error(&self, msg: &str) {
        log::error!("{}", self.line(msg));
    }
}
