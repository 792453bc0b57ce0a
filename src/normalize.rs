//! Canonicalization of tags, names and loosely-typed numbers.
//!
//! The war API is inconsistent about casing, whitespace and number encoding.
//! Everything passes through here exactly once, when API records are turned
//! into typed models; downstream code never sees raw shapes.

use serde_json::Value;

/// Trim and uppercase a tag. Absent input yields an empty tag, which never
/// matches any team.
pub fn normalize_tag(tag: Option<&str>) -> String {
    tag.map(|t| t.trim().to_uppercase()).unwrap_or_default()
}

/// Trim a display name. Absent input yields an empty name.
pub fn normalize_name(name: Option<&str>) -> String {
    name.map(|n| n.trim().to_string()).unwrap_or_default()
}

/// Parse a numeric-like value as an integer, falling back to `default`.
///
/// Accepts JSON integers, floats (truncated toward zero), booleans and
/// strings holding an integer.
pub fn coerce_int(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => default,
    }
}

/// Parse a numeric-like value as a float, falling back to `default`.
pub fn coerce_float(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(default)
}

/// Coerce to a non-negative count. Negative values clamp to zero.
pub fn coerce_count(value: Option<&Value>, default: u32) -> u32 {
    let n = coerce_int(value, i64::from(default));
    u32::try_from(n.max(0)).unwrap_or(u32::MAX)
}

/// Round to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
