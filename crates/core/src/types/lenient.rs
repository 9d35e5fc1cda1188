//! Tolerant field decoders for shipment API payloads.
//!
//! The shipment API is loose about field types: zips and quantities arrive as
//! numbers or strings, statuses may be `null`, timestamps may be epoch
//! numbers. A field of the wrong shape decodes as absent instead of failing
//! the whole payload.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::id::ResourceId;

/// Epoch values above this are taken as milliseconds (year 5138 in seconds).
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Text form of a scalar: strings as-is, numbers and booleans formatted.
#[must_use]
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer from a number or a numeric string.
#[must_use]
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Timestamp from RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC), or epoch seconds/milliseconds.
#[must_use]
pub fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let epoch = n.as_i64()?;
            if epoch.abs() >= EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            }
        }
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// serde `deserialize_with` adapters. Each reads any JSON value and never fails
// on shape.

pub(crate) fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(&Value::deserialize(d)?))
}

pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(opt_string(d)?.unwrap_or_default())
}

pub(crate) fn opt_integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(integer(&Value::deserialize(d)?))
}

pub(crate) fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ResourceId>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_i64().map(ResourceId::Numeric),
        Value::String(s) if !s.trim().is_empty() => Some(ResourceId::Text(s)),
        _ => None,
    })
}

pub(crate) fn opt_value<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Ok(Some(Value::deserialize(d)?).filter(|v| !v.is_null()))
}

pub(crate) fn opt_object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

pub(crate) fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(d)? {
        Value::Array(values) => Ok(values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_and_integer() {
        assert_eq!(text(&json!(10001)).as_deref(), Some("10001"));
        assert_eq!(text(&json!("10001")).as_deref(), Some("10001"));
        assert_eq!(text(&json!(null)), None);
        assert_eq!(integer(&json!("2")), Some(2));
        assert_eq!(integer(&json!(3)), Some(3));
        assert_eq!(integer(&json!("two")), None);
    }

    #[test]
    fn test_timestamp_shapes() {
        let expected = DateTime::parse_from_rfc3339("2026-01-05T08:00:00Z")
            .map(|dt| dt.with_timezone(&Utc))
            .ok();

        assert_eq!(timestamp(&json!("2026-01-05T08:00:00Z")), expected);
        assert_eq!(timestamp(&json!("2026-01-05 08:00:00")), expected);
        assert_eq!(timestamp(&json!(1_767_600_000)), expected);
        assert_eq!(timestamp(&json!(1_767_600_000_000_i64)), expected);
        assert_eq!(timestamp(&json!("yesterday")), None);
        assert_eq!(timestamp(&json!({ "at": 1 })), None);
    }
}
