//! Normalization helpers for loosely typed request fields.
//!
//! Callers send list-like fields either as JSON arrays or as delimited
//! strings such as `"{CPU utilization, CPU idle time}"`, and timestamps
//! either as UNIX seconds or milliseconds.

use serde_json::Value;

/// Timestamps above this value are treated as milliseconds.
pub const MILLISECONDS_THRESHOLD: i64 = 1_000_000_000_000;

/// Converts a UNIX timestamp in seconds or milliseconds to seconds.
pub fn normalize_timestamp(timestamp: i64) -> i64 {
    if timestamp > MILLISECONDS_THRESHOLD {
        timestamp / 1000
    } else {
        timestamp
    }
}

/// Reads an integer-like JSON value. Floats are truncated and strings must
/// hold an integer. Values outside the `i64` range are rejected.
pub fn parse_timestamp(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turns a list-like field into a sequence of strings.
///
/// Arrays are kept as they are (null elements dropped), strings are
/// brace-stripped and split on commas, other scalars become a single
/// element and absent fields become empty.
pub fn normalize_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(stringify)
            .collect(),
        Some(Value::String(s)) => split_delimited(s),
        Some(other) => vec![stringify(other)],
    }
}

fn split_delimited(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_matches(|c| c == '{' || c == '}')
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strings render as their content, everything else as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True when a field is absent or holds an empty value (null, `""`, `[]`,
/// `{}`, `0`, `false`).
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}
