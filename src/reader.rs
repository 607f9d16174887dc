//! Read-side access for the presentation layer
//!
//! Snapshot and export reads never mutate state and never wait on the
//! stream loop beyond a single row append.

use crate::flow::FlowRow;
use crate::store::{CsvLog, FlowTable, LogError};
use std::path::{Path, PathBuf};

/// Contents of the CSV tape at the time of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Cheap-to-clone handle for snapshot and export reads
#[derive(Debug, Clone)]
pub struct FlowReader {
    table: FlowTable,
    log: CsvLog,
    default_limit: usize,
}

impl FlowReader {
    pub fn new(table: FlowTable, log: CsvLog, default_limit: usize) -> Self {
        Self {
            table,
            log,
            default_limit,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// The last `limit` rows, oldest first
    pub async fn recent_rows(&self, limit: usize) -> Vec<FlowRow> {
        self.table.snapshot(limit).await
    }

    /// The last `default_limit` rows
    pub async fn latest(&self) -> Vec<FlowRow> {
        self.table.snapshot(self.default_limit).await
    }

    /// Path of the CSV tape
    pub fn export_path(&self) -> &Path {
        self.log.path()
    }

    /// Everything durably written so far
    pub async fn export_file(&self) -> Result<ExportFile, LogError> {
        let bytes = self.log.read_all().await?;
        Ok(ExportFile {
            path: self.log.path().to_path_buf(),
            bytes,
        })
    }

    /// Copy the tape to `dest`
    pub async fn export_to(&self, dest: impl AsRef<Path>) -> Result<u64, LogError> {
        self.log.copy_to(dest).await
    }
}
