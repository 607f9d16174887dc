//! Pipeline wiring
//!
//! Creates the tape and the table, starts the stream, and runs ingestion on
//! a background task. Read access goes through [`FlowReader`].

use crate::config::Config;
use crate::flow::Normalizer;
use crate::ingest::{FlowIngestor, IngestStats};
use crate::reader::FlowReader;
use crate::source::FlowSource;
use crate::store::{CsvLog, FlowTable};
use anyhow::Context;
use tokio::task::JoinHandle;

/// Running ingestion pipeline
pub struct FlowService {
    reader: FlowReader,
    ingestor: FlowIngestor,
    task: JoinHandle<()>,
}

impl FlowService {
    /// Start the pipeline
    ///
    /// The tape exists (header at least) before the source is subscribed,
    /// so exports never see a missing file.
    pub async fn start(config: &Config, source: &dyn FlowSource) -> anyhow::Result<Self> {
        let log = CsvLog::new(&config.log.path);
        log.initialize()
            .await
            .with_context(|| format!("initializing flow tape {}", config.log.path.display()))?;

        let table = FlowTable::with_max_rows(config.table.max_rows);
        let normalizer = Normalizer::new(config.normalize.expiry_policy);
        let ingestor = FlowIngestor::new(normalizer, table.clone(), log.clone());

        let ws_rx = source
            .subscribe()
            .await
            .context("subscribing to flow stream")?;

        let runner = ingestor.clone();
        let task = tokio::spawn(async move {
            runner.run(ws_rx).await;
        });

        tracing::info!(
            tape = %config.log.path.display(),
            max_rows = config.table.max_rows,
            expiry_policy = ?config.normalize.expiry_policy,
            "Flow pipeline started"
        );

        Ok(Self {
            reader: FlowReader::new(table, log, config.table.snapshot_limit),
            ingestor,
            task,
        })
    }

    /// Handle for snapshot and export reads
    pub fn reader(&self) -> FlowReader {
        self.reader.clone()
    }

    /// Get current ingestion statistics
    pub async fn stats(&self) -> IngestStats {
        self.ingestor.stats().await
    }

    /// Whether ingestion has stopped (stream channel closed)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for ingestion to stop on its own
    pub async fn join(self) -> anyhow::Result<()> {
        self.task.await.context("ingestion task panicked")
    }

    /// Stop ingestion; dropping the stream receiver also ends the connection loop
    pub fn shutdown(self) {
        self.task.abort();
        tracing::info!("Flow pipeline stopped");
    }
}
