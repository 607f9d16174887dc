//! Options flow records
//!
//! Normalizes raw flow events from the upstream stream into fixed-schema rows

mod normalize;
mod row;

pub use normalize::{format_premium, normalize, ExpiryPolicy, Normalizer, Rejection};
pub use row::{FlowRow, COLUMNS};
