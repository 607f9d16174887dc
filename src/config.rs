//! Configuration types for flow-tape

use crate::flow::ExpiryPolicy;
use crate::store::DEFAULT_SNAPSHOT_LIMIT;
use crate::telemetry::LogFormat;
use crate::ws::{ExponentialBackoff, Immediate, ReconnectPolicy, WsConfig};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default upstream flow stream
pub const DEFAULT_STREAM_URL: &str = "wss://stream.optionstrat.com/flow/live";

/// Default location of the CSV tape
pub const DEFAULT_LOG_PATH: &str = "/tmp/optionstrat_flow.csv";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stream: StreamConfig,
    pub table: TableConfig,
    pub log: LogConfig,
    pub normalize: NormalizeConfig,
    pub ui: UiConfig,
    pub telemetry: TelemetryConfig,
}

/// Upstream stream configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub url: String,
    /// Inbound message channel capacity
    pub buffer_size: usize,
    pub ping_interval_secs: u64,
    pub pong_timeout_secs: u64,
    pub reconnect: ReconnectConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_STREAM_URL.to_string(),
            buffer_size: 256,
            ping_interval_secs: 30,
            pong_timeout_secs: 10,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl StreamConfig {
    /// Build the WebSocket client configuration
    pub fn ws_config(&self) -> WsConfig {
        WsConfig {
            url: self.url.clone(),
            reconnect: self.reconnect.policy(),
            ping_interval: Duration::from_secs(self.ping_interval_secs.max(1)),
            pong_timeout: Duration::from_secs(self.pong_timeout_secs.max(1)),
            buffer_size: self.buffer_size.max(1),
        }
    }
}

/// Reconnect strategy name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectStrategy {
    /// Retry at once, forever
    Immediate,
    /// Doubling delay between attempts
    #[default]
    Backoff,
}

/// Reconnect configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    pub strategy: ReconnectStrategy,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// 0 = retry forever; non-zero gives up after that many failures in a row
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectStrategy::Backoff,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            max_attempts: 0,
        }
    }
}

impl ReconnectConfig {
    pub fn policy(&self) -> Arc<dyn ReconnectPolicy> {
        match self.strategy {
            ReconnectStrategy::Immediate => Arc::new(Immediate),
            ReconnectStrategy::Backoff => Arc::new(ExponentialBackoff {
                initial_delay: Duration::from_millis(self.initial_delay_ms),
                max_delay: Duration::from_millis(self.max_delay_ms.max(self.initial_delay_ms)),
                max_attempts: self.max_attempts,
            }),
        }
    }
}

/// In-memory table configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Rows returned by a snapshot when no limit is given
    pub snapshot_limit: usize,
    /// Rows kept in memory (0 = unbounded)
    pub max_rows: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            max_rows: 0,
        }
    }
}

/// Durable log configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub path: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
        }
    }
}

/// Normalizer configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub expiry_policy: ExpiryPolicy,
}

/// Terminal view configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub refresh_interval_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 10,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Port for the Prometheus exporter; no exporter when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
