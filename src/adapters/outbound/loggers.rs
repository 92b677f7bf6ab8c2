use crate::config::LoggingConfig;
use crate::domains::logger::{DomainLogger, DynLogger, FileLogger};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct Console {
    component: String,
}

impl DomainLogger for Console {
    fn info(&self, msg: &str) {
        println!("[{}] {}", self.component, msg);
    }
    fn warn(&self, msg: &str) {
        println!("[{}] WARN: {}", self.component, msg);
    }
    fn error(&self, msg: &str) {
        eprintln!("[{}] ERROR: {}", self.component, msg);
    }
}

pub fn init_console_logger(component: &str) -> DynLogger {
    Arc::new(Console {
        component: component.to_string(),
    })
}

/// Installs `fast_log` and returns a logger writing through it.
pub fn init_file_logger(
    path: &str,
    level: log::LevelFilter,
    component: &str,
) -> Result<DynLogger, String> {
    FileLogger::init(path, level).map_err(|e| format!("Failed to initialize fast_log: {}", e))?;
    Ok(Arc::new(FileLogger::new(component)))
}

struct Silent;

impl DomainLogger for Silent {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

pub fn init_noop_logger() -> DynLogger {
    Arc::new(Silent)
}

/// Sends every line to each of its sinks in order.
pub struct FanoutLogger {
    sinks: Vec<DynLogger>,
}

impl FanoutLogger {
    pub fn new(sinks: Vec<DynLogger>) -> Self {
        Self { sinks }
    }
}

impl DomainLogger for FanoutLogger {
    fn info(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.info(msg));
    }
    fn warn(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.warn(msg));
    }
    fn error(&self, msg: &str) {
        self.sinks.iter().for_each(|s| s.error(msg));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// Keeps every line in memory. Handy for asserting on session progress.
#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, msg)| *l == level && msg.contains(needle))
    }

    fn push(&self, level: LogLevel, msg: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, msg.to_string()));
        }
    }
}

impl DomainLogger for MemoryLogger {
    fn info(&self, msg: &str) {
        self.push(LogLevel::Info, msg);
    }
    fn warn(&self, msg: &str) {
        self.push(LogLevel::Warn, msg);
    }
    fn error(&self, msg: &str) {
        self.push(LogLevel::Error, msg);
    }
}

/// Moves formatting and I/O off the session task. Lines are dropped when the
/// channel is full. Must be called inside a tokio runtime.
pub fn init_buffered_logger(sink: DynLogger, capacity: usize) -> DynLogger {
    let (tx, mut rx) = mpsc::channel::<(LogLevel, String)>(capacity.max(1));

    tokio::spawn(async move {
        while let Some((level, msg)) = rx.recv().await {
            match level {
                LogLevel::Info => sink.info(&msg),
                LogLevel::Warn => sink.warn(&msg),
                LogLevel::Error => sink.error(&msg),
            }
        }
    });

    struct Buffered {
        tx: mpsc::Sender<(LogLevel, String)>,
    }

    impl DomainLogger for Buffered {
        fn info(&self, msg: &str) {
            let _ = self.tx.try_send((LogLevel::Info, msg.to_string()));
        }
        fn warn(&self, msg: &str) {
            let _ = self.tx.try_send((LogLevel::Warn, msg.to_string()));
        }
        fn error(&self, msg: &str) {
            let _ = self.tx.try_send((LogLevel::Error, msg.to_string()));
        }
    }

    Arc::new(Buffered { tx })
}

/// Console always; file as well when configured and `fast_log` accepts it.
pub fn logger_from_config(config: &LoggingConfig, component: &str) -> DynLogger {
    let console = init_console_logger(component);
    let combined = match config.file.as_deref() {
        Some(path) => match init_file_logger(path, config.level_filter(), component) {
            Ok(file) => Arc::new(FanoutLogger::new(vec![file, console])) as DynLogger,
            Err(e) => {
                console.warn(&format!("{}, using console only", e));
                console
            }
        },
        None => console,
    };
    if config.buffered {
        init_buffered_logger(combined, config.buffer_capacity)
    } else {
        combined
    }
}
