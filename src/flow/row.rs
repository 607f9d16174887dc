//! Normalized flow row

use serde::{Deserialize, Serialize};

/// Column names in tape order. The CSV header is exactly this sequence.
pub const COLUMNS: [&str; 8] = [
    "Time",
    "Symbol",
    "Buy/Sell",
    "Strike",
    "Call/Put",
    "Expiry",
    "Premium ($)",
    "Type",
];

/// A single normalized options flow print
///
/// Rows are built once by the normalizer and never mutated afterwards;
/// the table and the durable log both hold copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRow {
    /// Receipt time, UTC, `HH:MM:SS`
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    /// Capitalized side (`Buy` / `Sell`)
    #[serde(rename = "Buy/Sell")]
    pub side: String,
    /// Strike as received (number or string rendered as text)
    #[serde(rename = "Strike")]
    pub strike: String,
    #[serde(rename = "Call/Put")]
    pub option_type: String,
    /// Expiry as `Mon DD`
    #[serde(rename = "Expiry")]
    pub expiry: String,
    /// Premium as `$` + thousands-grouped integer
    #[serde(rename = "Premium ($)")]
    pub premium: String,
    /// Upper-cased action type (e.g. `SWEEP`, `BLOCK`)
    #[serde(rename = "Type")]
    pub action_type: String,
}

impl FlowRow {
    /// Field values in column order
    pub fn values(&self) -> [&str; 8] {
        [
            &self.time,
            &self.symbol,
            &self.side,
            &self.strike,
            &self.option_type,
            &self.expiry,
            &self.premium,
            &self.action_type,
        ]
    }
}
