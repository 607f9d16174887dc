//! Frame-by-frame ingestion into the table and the tape

use super::types::{IngestOutcome, IngestStats};
use crate::flow::{FlowRow, Normalizer, Rejection};
use crate::store::{CsvLog, FlowTable};
use crate::telemetry::{increment, record_rejection, set_gauge, CounterMetric, GaugeMetric};
use crate::ws::WsMessage;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Normalizes inbound frames and appends the resulting rows
///
/// Frames are handled one at a time: a row is in the table and on the tape
/// before the next frame is looked at. A failure on one frame never stops
/// the loop.
#[derive(Clone)]
pub struct FlowIngestor {
    normalizer: Normalizer,
    table: FlowTable,
    log: CsvLog,
    stats: Arc<RwLock<IngestStats>>,
}

impl FlowIngestor {
    pub fn new(normalizer: Normalizer, table: FlowTable, log: CsvLog) -> Self {
        Self {
            normalizer,
            table,
            log,
            stats: Arc::new(RwLock::new(IngestStats::default())),
        }
    }

    pub fn table(&self) -> &FlowTable {
        &self.table
    }

    pub fn log(&self) -> &CsvLog {
        &self.log
    }

    /// Get current statistics
    pub async fn stats(&self) -> IngestStats {
        self.stats.read().await.clone()
    }

    /// Ingest a text frame
    pub async fn ingest_text(&self, text: &str) -> IngestOutcome {
        let received_at = Utc::now();
        let result = self.normalizer.normalize_text(text, received_at);
        self.ingest(result, received_at).await
    }

    /// Ingest a binary frame carrying UTF-8 JSON
    pub async fn ingest_bytes(&self, bytes: &[u8]) -> IngestOutcome {
        let received_at = Utc::now();
        let result = self.normalizer.normalize_bytes(bytes, received_at);
        self.ingest(result, received_at).await
    }

    /// Ingest an already decoded payload
    pub async fn ingest_value(&self, payload: &Value) -> IngestOutcome {
        let received_at = Utc::now();
        let result = self.normalizer.normalize(payload, received_at);
        self.ingest(result, received_at).await
    }

    async fn ingest(
        &self,
        result: Result<FlowRow, Rejection>,
        received_at: DateTime<Utc>,
    ) -> IngestOutcome {
        increment(CounterMetric::MessagesReceived);

        let row = match result {
            Ok(row) => row,
            Err(rejection) => {
                if rejection.is_silent() {
                    tracing::debug!(reason = rejection.reason(), "Ignoring non-flow message");
                } else {
                    tracing::warn!(error = %rejection, "Error parsing message");
                }
                record_rejection(rejection.reason());

                let mut s = self.stats.write().await;
                s.messages_received += 1;
                s.rejected += 1;
                return IngestOutcome::Rejected(rejection);
            }
        };

        let held = self.table.append(row.clone()).await;
        increment(CounterMetric::RowsAppended);
        set_gauge(GaugeMetric::TableRows, held as f64);

        // The row stays in the table even when the tape write fails
        let durable = match self.log.append(&row).await {
            Ok(()) => true,
            Err(e) => {
                increment(CounterMetric::LogWriteFailures);
                tracing::error!(
                    error = %e,
                    symbol = %row.symbol,
                    "Failed to append row to flow tape"
                );
                false
            }
        };

        tracing::debug!(
            symbol = %row.symbol,
            side = %row.side,
            premium = %row.premium,
            durable,
            "Flow row appended"
        );

        let mut s = self.stats.write().await;
        s.messages_received += 1;
        s.rows_appended += 1;
        if !durable {
            s.log_failures += 1;
        }
        s.last_row_at = Some(received_at);

        IngestOutcome::Appended { durable }
    }

    /// Consume stream messages until the channel closes
    pub async fn run(&self, mut ws_rx: mpsc::Receiver<WsMessage>) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    self.ingest_text(&text).await;
                }
                WsMessage::Binary(data) => {
                    self.ingest_bytes(&data).await;
                }
                WsMessage::Connected => {
                    tracing::info!("Connected to flow stream");
                    self.stats.write().await.connects += 1;
                }
                WsMessage::Disconnected => {
                    tracing::warn!("Flow stream connection closed");
                    self.stats.write().await.disconnects += 1;
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::info!(attempt, "Flow stream reconnecting...");
                }
            }
        }

        tracing::info!("Flow stream ended, ingestion stopped");
    }
}
