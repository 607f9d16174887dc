//! Flow storage
//!
//! The in-memory table backing live reads, and the CSV tape that mirrors it on disk

mod csv_log;
mod table;

pub use csv_log::{CsvLog, LogError};
pub use table::{FlowTable, DEFAULT_SNAPSHOT_LIMIT};
