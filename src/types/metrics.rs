use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use super::book::OrderBookLevel;
use super::params::parse_numeric_prefix;
use crate::errors::{ClientError, ClientResult};

/// Latest payload pushed by the backend. Every field is optional; a new
/// message replaces the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    #[serde(default, deserialize_with = "lenient_number")]
    pub best_bid: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub best_ask: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mid_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub expected_slippage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub expected_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub market_impact: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub net_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub maker_taker: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub internal_latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_update: Option<String>,
    #[serde(default, deserialize_with = "lenient_levels")]
    pub asks: Vec<OrderBookLevel>,
    #[serde(default, deserialize_with = "lenient_levels")]
    pub bids: Vec<OrderBookLevel>,
}

impl MetricsSnapshot {
    /// A JSON document that is not an object carries no metrics and yields
    /// an empty snapshot.
    pub fn from_value(value: &Value) -> ClientResult<Self> {
        if !value.is_object() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value.clone())?)
    }
}

/// Numbers arrive either as JSON numbers or as numeric strings.
pub(crate) fn number_from_value(value: &Value) -> ClientResult<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_prefix(s),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(ClientError::Decode(format!("expected a number, got {}", value))),
    }
}

/// A value that is not a number is dropped on its own; the rest of the
/// message still renders.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => match number_from_value(&value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                debug!("Ignoring metric field: {}", e);
                Ok(None)
            }
        },
    }
}

/// Falsy values (`""`, `0`, `false`, null) are missing, like a `value || "N/A"`
/// fallback. A string is only falsy when empty, so `"0"` stays. Numbers keep
/// their JSON text. Arrays and objects are dropped.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Bool(true)) => Some("true".to_string()),
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v == 0.0 => None,
            _ => Some(n.to_string()),
        },
        Some(other) => {
            debug!("Ignoring non-text metric field: {}", other);
            None
        }
    };
    Ok(text.filter(|s| !s.is_empty()))
}

/// Rows that do not decode are skipped; a side that is not an array is empty.
fn lenient_levels<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<OrderBookLevel>, D::Error> {
    let rows = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            debug!("Ignoring order book side: {}", other);
            return Ok(Vec::new());
        }
    };

    Ok(rows
        .iter()
        .filter_map(|row| match OrderBookLevel::from_row(row) {
            Ok(level) => Some(level),
            Err(e) => {
                debug!("Skipping order book row {}: {}", row, e);
                None
            }
        })
        .collect())
}
