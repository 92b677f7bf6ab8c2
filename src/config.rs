use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "HRC_COSIM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "cosim.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub protocol: ProtocolConfig,
    pub human: HumanConfig,
    pub robot: RobotConfig,
    pub timeline: TimelineConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
    pub workcell: WorkcellConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundFraming {
    /// Bare ASCII, no length header or terminator.
    LegacyCsv,
    /// int32 little-endian byte length, then the ASCII payload.
    LengthPrefixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// 0 disables the read timeout.
    pub read_timeout_ms: u64,
    pub max_frame_elements: usize,
    pub outbound_framing: OutboundFraming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanConfig {
    pub leaned_posture: String,
    pub home_posture: String,
    pub pose_duration_s: f64,
    pub grasp_offset: f64,
    pub place_z_offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub tcp_frame: String,
    pub tool: String,
    pub motion_type: String,
    pub speed: f64,
    pub acceleration: f64,
    pub blend: f64,
    pub coordinate_frame: String,
    pub approach_height: f64,
    pub gripper: String,
    pub close_pose: String,
    pub open_pose: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub composite_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Domain log file; console only when unset.
    pub file: Option<String>,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    pub buffered: bool,
    pub buffer_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub json_path: Option<PathBuf>,
}

/// Seed for the in-memory workcell used when no external engine is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkcellConfig {
    pub object_prefix: String,
    pub frame_prefix: String,
    pub item_count: usize,
    pub target: String,
    pub human: String,
    pub robot: String,
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// `$HRC_COSIM_CONFIG`, then `cosim.toml`, then defaults.
    pub async fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(path).await;
        }
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE).await;
        }
        Ok(Self::default())
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    /// Unknown names fall back to `info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl ProtocolConfig {
    pub fn read_timeout(&self) -> Option<Duration> {
        if self.read_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.read_timeout_ms))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 12345,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 600_000,
            max_frame_elements: 1 << 20,
            outbound_framing: OutboundFraming::LegacyCsv,
        }
    }
}

impl Default for HumanConfig {
    fn default() -> Self {
        Self {
            leaned_posture: "Leaned".to_string(),
            home_posture: "UserHome".to_string(),
            pose_duration_s: 0.7,
            grasp_offset: 30.0,
            place_z_offset: 20.0,
        }
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            tcp_frame: "tf_tcp_1".to_string(),
            tool: "tcp_1".to_string(),
            motion_type: "MoveL".to_string(),
            speed: 1000.0,
            acceleration: 1200.0,
            blend: 0.0,
            coordinate_frame: "Cartesian".to_string(),
            approach_height: 100.0,
            gripper: "Camozzi Gripper UR5e".to_string(),
            close_pose: "CLOSE".to_string(),
            open_pose: "OPEN".to_string(),
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            composite_prefix: "CompOp".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
            buffered: false,
            buffer_capacity: 256,
        }
    }
}

impl Default for WorkcellConfig {
    fn default() -> Self {
        Self {
            object_prefix: "YAOSC_cube".to_string(),
            frame_prefix: "fr_cube".to_string(),
            item_count: 4,
            target: "NewTray".to_string(),
            human: "Jack".to_string(),
            robot: "UR5e".to_string(),
        }
    }
}
