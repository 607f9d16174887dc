//! In-memory flow table

use crate::flow::FlowRow;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Number of rows a snapshot returns when the caller has no preference
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 50;

#[derive(Debug, Default)]
struct TableInner {
    rows: VecDeque<FlowRow>,
    appended: u64,
}

/// Append-only table of normalized rows, in arrival order
///
/// Cloning yields another handle to the same table. Each append and each
/// snapshot holds the lock for the whole operation, so readers never see
/// a partially applied append. With a row cap the oldest rows are evicted
/// from memory; order of the remaining rows is unchanged.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    inner: Arc<RwLock<TableInner>>,
    max_rows: Option<usize>,
}

impl FlowTable {
    /// Unbounded table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding at most `max_rows` of the most recent rows (0 = unbounded)
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            inner: Arc::default(),
            max_rows: (max_rows > 0).then_some(max_rows),
        }
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    /// Append a row at the end; returns the number of rows now held
    pub async fn append(&self, row: FlowRow) -> usize {
        let mut inner = self.inner.write().await;
        inner.rows.push_back(row);
        inner.appended += 1;
        if let Some(max) = self.max_rows {
            while inner.rows.len() > max {
                inner.rows.pop_front();
            }
        }
        inner.rows.len()
    }

    /// The last `n` rows, oldest first
    pub async fn snapshot(&self, n: usize) -> Vec<FlowRow> {
        let inner = self.inner.read().await;
        let skip = inner.rows.len().saturating_sub(n);
        inner.rows.iter().skip(skip).cloned().collect()
    }

    /// Number of rows currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.rows.is_empty()
    }

    /// Rows appended since creation, including evicted ones
    pub async fn total_appended(&self) -> u64 {
        self.inner.read().await.appended
    }
}
