//! Stream ingestion
//!
//! Drives each inbound frame through the normalizer into the table and the CSV tape

mod ingestor;
mod types;

pub use ingestor::FlowIngestor;
pub use types::{IngestOutcome, IngestStats};
