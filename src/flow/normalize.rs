//! Raw flow event normalization
//!
//! Turns a decoded stream payload into a [`FlowRow`] or a [`Rejection`].
//! Normalization is a pure function of the payload and the receipt time.

use super::FlowRow;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Contract multiplier applied to `price * quantity`
const CONTRACT_MULTIPLIER: Decimal = Decimal::ONE_HUNDRED;

/// What to do with an `expiration` that is present but not `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryPolicy {
    /// Drop the whole message
    #[default]
    Reject,
    /// Keep the message with an empty Expiry
    Blank,
}

/// Why a payload produced no row
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("payload is not an object")]
    NotAnObject,
    #[error("payload has no symbol")]
    MissingSymbol,
    #[error("unparseable expiration {0:?}")]
    BadExpiry(String),
    #[error("non-numeric {field}: {value}")]
    BadNumber { field: &'static str, value: String },
    #[error("{0} is not a string")]
    NotAString(&'static str),
    #[error("premium out of range")]
    PremiumOverflow,
}

impl Rejection {
    /// Short label used for metrics and structured logs
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::InvalidJson(_) => "invalid_json",
            Rejection::NotAnObject => "not_an_object",
            Rejection::MissingSymbol => "missing_symbol",
            Rejection::BadExpiry(_) => "bad_expiry",
            Rejection::BadNumber { .. } => "bad_number",
            Rejection::NotAString(_) => "not_a_string",
            Rejection::PremiumOverflow => "premium_overflow",
        }
    }

    /// Whether this is plain non-flow traffic (acks, heartbeats) rather than a broken flow event
    pub fn is_silent(&self) -> bool {
        matches!(self, Rejection::NotAnObject | Rejection::MissingSymbol)
    }
}

/// Record normalizer with a configurable expiry policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    expiry_policy: ExpiryPolicy,
}

impl Normalizer {
    pub fn new(expiry_policy: ExpiryPolicy) -> Self {
        Self { expiry_policy }
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    /// Decode a text frame and normalize it
    pub fn normalize_text(
        &self,
        text: &str,
        received_at: DateTime<Utc>,
    ) -> Result<FlowRow, Rejection> {
        let payload: Value =
            serde_json::from_str(text).map_err(|e| Rejection::InvalidJson(e.to_string()))?;
        self.normalize(&payload, received_at)
    }

    /// Decode a binary frame (UTF-8 JSON) and normalize it
    pub fn normalize_bytes(
        &self,
        bytes: &[u8],
        received_at: DateTime<Utc>,
    ) -> Result<FlowRow, Rejection> {
        let payload: Value =
            serde_json::from_slice(bytes).map_err(|e| Rejection::InvalidJson(e.to_string()))?;
        self.normalize(&payload, received_at)
    }

    /// Normalize a decoded payload
    ///
    /// Only objects carrying a `symbol` key are eligible. Any field failure
    /// rejects the whole message; with [`ExpiryPolicy::Blank`] a malformed
    /// expiration degrades to an empty Expiry instead.
    pub fn normalize(
        &self,
        payload: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<FlowRow, Rejection> {
        let event = payload.as_object().ok_or(Rejection::NotAnObject)?;
        if !event.contains_key("symbol") {
            return Err(Rejection::MissingSymbol);
        }

        let expiry = self.expiry(event)?;
        let price = decimal_field(event, "price")?;
        let quantity = decimal_field(event, "quantity")?;
        let premium = premium(price, quantity)?;
        let side = string_field(event, "side")?;
        let action_type = string_field(event, "actionType")?;

        Ok(FlowRow {
            time: received_at.format("%H:%M:%S").to_string(),
            symbol: text_field(event, "symbol"),
            side: capitalize(&side),
            strike: text_field(event, "strikePrice"),
            option_type: text_field(event, "optionType"),
            expiry,
            premium: format_premium(premium),
            action_type: action_type.to_uppercase(),
        })
    }

    fn expiry(&self, event: &Map<String, Value>) -> Result<String, Rejection> {
        let raw = match event.get("expiration") {
            None | Some(Value::Null) => return Ok(String::new()),
            Some(Value::String(s)) if s.is_empty() => return Ok(String::new()),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Ok(date.format("%b %d").to_string()),
            Err(_) => match self.expiry_policy {
                ExpiryPolicy::Reject => Err(Rejection::BadExpiry(raw)),
                ExpiryPolicy::Blank => Ok(String::new()),
            },
        }
    }
}

/// Normalize with the default (reject) expiry policy
pub fn normalize(payload: &Value, received_at: DateTime<Utc>) -> Result<FlowRow, Rejection> {
    Normalizer::default().normalize(payload, received_at)
}

/// Format a whole-dollar premium as `$` + thousands-grouped digits
pub fn format_premium(amount: i128) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("${}{}", sign, grouped)
}

/// `round(price * quantity * 100)`, ties to even
fn premium(price: Decimal, quantity: Decimal) -> Result<i128, Rejection> {
    price
        .checked_mul(quantity)
        .and_then(|notional| notional.checked_mul(CONTRACT_MULTIPLIER))
        .map(|p| p.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven))
        .and_then(|p| p.to_i128())
        .ok_or(Rejection::PremiumOverflow)
}

/// Passthrough field rendered as text; absent or null is empty
fn text_field(event: &Map<String, Value>, key: &str) -> String {
    match event.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Field that must be a string when present
fn string_field(event: &Map<String, Value>, key: &'static str) -> Result<String, Rejection> {
    match event.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Rejection::NotAString(key)),
    }
}

/// Numeric field; absent or null is zero, numeric strings are accepted
fn decimal_field(event: &Map<String, Value>, key: &'static str) -> Result<Decimal, Rejection> {
    let raw = match event.get(key) {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => {
            return Err(Rejection::BadNumber {
                field: key,
                value: other.to_string(),
            })
        }
    };

    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| Rejection::BadNumber {
            field: key,
            value: raw,
        })
}

/// First character upper-cased, the rest lower-cased
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
