//! Ingestion types

use crate::flow::Rejection;
use chrono::{DateTime, Utc};

/// Result of ingesting one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Row appended to the table; `durable` is false when the tape write failed
    Appended { durable: bool },
    /// No row produced
    Rejected(Rejection),
}

impl IngestOutcome {
    pub fn is_appended(&self) -> bool {
        matches!(self, IngestOutcome::Appended { .. })
    }
}

/// Ingestion statistics
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub messages_received: u64,
    pub rows_appended: u64,
    pub rejected: u64,
    pub log_failures: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub last_row_at: Option<DateTime<Utc>>,
}
