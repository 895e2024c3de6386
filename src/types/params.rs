use serde::{Serialize, Serializer};

/// Largest integer an IEEE double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Maker/taker fee rates, as fractions of notional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FeeTier {
    #[serde(serialize_with = "serialize_number")]
    pub maker: f64,
    #[serde(serialize_with = "serialize_number")]
    pub taker: f64,
}

/// Parameters sent to the backend whenever the session (re)connects or the
/// user asks for a resend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeParameters {
    #[serde(rename = "quantityUSD", serialize_with = "serialize_number")]
    pub quantity_usd: f64,
    #[serde(serialize_with = "serialize_number")]
    pub volatility: f64,
    #[serde(rename = "fee_tier_data")]
    pub fee_tier: FeeTier,
}

impl TradeParameters {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Writes numbers the way the backend's other clients do: integral values
/// without a fraction (`1000`, not `1000.0`) and non-finite values as null.
pub fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return serializer.serialize_none();
    }
    if value.fract() == 0.0 && value.abs() < MAX_SAFE_INTEGER {
        return serializer.serialize_i64(*value as i64);
    }
    serializer.serialize_f64(*value)
}

/// Numeric coercion for free-text inputs: parses the longest numeric prefix
/// after leading whitespace ("12.5abc" is 12.5) and falls back to zero when
/// there is none.
pub fn coerce_number(input: &str) -> f64 {
    match parse_numeric_prefix(input) {
        Some(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

pub fn parse_numeric_prefix(input: &str) -> Option<f64> {
    let trimmed = input.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let unsigned = &trimmed[end..];
    if unsigned.starts_with("Infinity") {
        let sign = if trimmed.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}
