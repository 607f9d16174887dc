//! WebSocket client library
//!
//! Provides a long-lived WebSocket client that reconnects under a
//! pluggable [`ReconnectPolicy`], keeps the connection alive with
//! ping/pong, and publishes its [`ConnectionState`].

mod client;
mod policy;
mod types;

pub use client::WsClient;
pub use policy::{ExponentialBackoff, Immediate, ReconnectPolicy};
pub use types::{ConnectionState, WsConfig, WsError, WsMessage};
