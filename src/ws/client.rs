//! WebSocket client with automatic reconnection

use super::types::{ConnectionState, WsConfig, WsError, WsMessage};
use crate::telemetry::{increment, CounterMetric};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// How a single connection session ended without a transport error
enum SessionEnd {
    /// Server sent a close frame
    Closed,
    /// Consumer dropped the message receiver
    ReceiverDropped,
}

/// Long-lived WebSocket client
///
/// Runs `Disconnected -> Connecting -> Connected -> Disconnected` in a loop on
/// a background task. Every close or error leads back to `Connecting` after
/// the delay chosen by the configured reconnect policy.
pub struct WsClient {
    config: WsConfig,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// Create a new client with just a URL using default config
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(WsConfig::new(url))
    }

    /// Get the configured URL
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Subscribe to connection state changes
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Connect and return a receiver for messages
    ///
    /// Spawns the connection loop. The loop stops when the receiver is
    /// dropped or the reconnect policy gives up.
    pub fn connect(&self) -> mpsc::Receiver<WsMessage> {
        let (tx, rx) = mpsc::channel(self.config.buffer_size.max(1));
        let config = self.config.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, tx, state).await {
                tracing::error!(error = %e, "WebSocket connection loop failed");
            }
        });

        rx
    }

    /// Run the connection loop with automatic reconnection
    async fn run_connection_loop(
        config: WsConfig,
        tx: mpsc::Sender<WsMessage>,
        state: Arc<watch::Sender<ConnectionState>>,
    ) -> Result<(), WsError> {
        let mut attempt: u32 = 0;

        loop {
            state.send_replace(ConnectionState::Connecting);

            let mut established = false;
            let result = Self::connect_and_stream(&config, &tx, &state, &mut established).await;
            state.send_replace(ConnectionState::Disconnected);

            match result {
                Ok(SessionEnd::ReceiverDropped) => {
                    tracing::debug!("Receiver dropped, stopping connection loop");
                    return Ok(());
                }
                Ok(SessionEnd::Closed) => {
                    tracing::info!("WebSocket connection closed by server");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "WebSocket connection error");
                }
            }

            if established {
                attempt = 0;
            }

            if tx.send(WsMessage::Disconnected).await.is_err() {
                return Ok(());
            }

            attempt = attempt.saturating_add(1);
            let Some(delay) = config.reconnect.next_delay(attempt) else {
                tracing::error!(attempts = attempt - 1, "Reconnect policy gave up");
                return Err(WsError::GaveUp {
                    attempts: attempt - 1,
                });
            };

            increment(CounterMetric::Reconnects);
            tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting..."
            );

            if tx
                .send(WsMessage::Reconnecting { attempt })
                .await
                .is_err()
            {
                return Ok(());
            }

            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                sleep(delay).await;
            }
        }
    }

    /// Connect to WebSocket and stream messages until the session ends
    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
        state: &watch::Sender<ConnectionState>,
        established: &mut bool,
    ) -> Result<SessionEnd, WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(config.url.as_str())
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        *established = true;
        state.send_replace(ConnectionState::Connected);
        tracing::info!(url = %config.url, "WebSocket connected");

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(SessionEnd::ReceiverDropped);
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick fires immediately; skip it so the first ping goes out after one interval
        ping_interval.tick().await;

        let mut pong_deadline: Option<Instant> = None;

        loop {
            let pong_wait = pong_deadline;
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                return Ok(SessionEnd::ReceiverDropped);
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if tx.send(WsMessage::Binary(data)).await.is_err() {
                                return Ok(SessionEnd::ReceiverDropped);
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            pong_deadline = None;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(frame = ?frame, "Received close frame");
                            return Ok(SessionEnd::Closed);
                        }
                        Some(Ok(Message::Frame(_))) => {}
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                    }
                }

                _ = ping_interval.tick() => {
                    write.send(Message::Ping(Vec::new())).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    if pong_deadline.is_none() {
                        pong_deadline = Some(Instant::now() + config.pong_timeout);
                    }
                }

                _ = async move {
                    match pong_wait {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending().await,
                    }
                } => {
                    return Err(WsError::ConnectionFailed("Pong timeout".into()));
                }
            }
        }
    }
}
