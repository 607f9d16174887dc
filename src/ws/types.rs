//! WebSocket types and configuration

use super::policy::{ExponentialBackoff, ReconnectPolicy};
use std::sync::Arc;
use std::time::Duration;

/// WebSocket client configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket URL to connect to
    pub url: String,
    /// Strategy deciding reconnect delays
    pub reconnect: Arc<dyn ReconnectPolicy>,
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// How long to wait for a pong before dropping the connection
    pub pong_timeout: Duration,
    /// Capacity of the message channel handed to the consumer
    pub buffer_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect: Arc::new(ExponentialBackoff::default()),
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
            buffer_size: 256,
        }
    }
}

impl WsConfig {
    /// Create a new config with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the reconnect strategy
    pub fn reconnect_policy(mut self, policy: impl ReconnectPolicy + 'static) -> Self {
        self.reconnect = Arc::new(policy);
        self
    }

    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set pong timeout
    pub fn pong_timeout(mut self, d: Duration) -> Self {
        self.pong_timeout = d;
        self
    }

    /// Set message channel capacity
    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n.max(1);
        self
    }
}

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// WebSocket message types
#[derive(Debug, Clone)]
pub enum WsMessage {
    /// Text message
    Text(String),
    /// Binary message
    Binary(Vec<u8>),
    /// Connection established
    Connected,
    /// Connection closed or failed
    Disconnected,
    /// Reconnecting after a close or failure
    Reconnecting { attempt: u32 },
}

/// WebSocket errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Connection closed by server")]
    Closed,
    #[error("Gave up after {attempts} reconnection attempts")]
    GaveUp { attempts: u32 },
    #[error("Send failed: {0}")]
    SendFailed(String),
}
