//! Flow stream sources

use crate::ws::{ConnectionState, WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

/// Trait for flow stream implementations
#[async_trait]
pub trait FlowSource: Send + Sync {
    /// Start streaming and return the message receiver
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<WsMessage>>;
}

/// Live WebSocket flow stream
pub struct WsFlowSource {
    client: WsClient,
}

impl WsFlowSource {
    pub fn new(config: WsConfig) -> Self {
        Self {
            client: WsClient::new(config),
        }
    }

    pub fn url(&self) -> &str {
        self.client.url()
    }

    /// Connection state of the underlying client
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.client.state()
    }
}

#[async_trait]
impl FlowSource for WsFlowSource {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<WsMessage>> {
        tracing::info!(url = %self.client.url(), "Subscribing to flow stream");
        Ok(self.client.connect())
    }
}
