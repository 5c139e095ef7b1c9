//! Timestamp normalization for documents crossing the store boundary.
//!
//! The store delivers timestamps in several historical shapes: RFC 3339 /
//! ISO-8601 strings, epoch-millisecond numbers, and structured
//! `{seconds, nanoseconds}` objects (older exports spell the keys
//! `_seconds` / `_nanoseconds`). Everything UI-facing expects one shape, so
//! store implementations run [`normalize_document`] over every document
//! before returning it.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde_json::Value;

/// Converts a single value into a UTC timestamp.
///
/// Returns `None` for any unrecognized shape; never panics. Unrecognized
/// shapes are logged at debug level so schema drift is visible without
/// spamming production logs.
pub fn normalize_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            // Offset-less ISO-8601; some exports wrote UTC wall-clock strings
            // without a zone designator.
            Err(_) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                Ok(naive) => Some(Utc.from_utc_datetime(&naive)),
                Err(_) => {
                    debug!("unparseable timestamp string: {s:?}");
                    None
                }
            },
        },
        Value::Number(n) => {
            let millis = if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                f as i64
            } else {
                debug!("unparseable timestamp number: {n}");
                return None;
            };
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            Utc.timestamp_opt(seconds, nanos as u32).single()
        }
        _ => None,
    }
}

/// True if the value is a structured timestamp object.
fn is_timestamp_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            (map.contains_key("seconds") || map.contains_key("_seconds"))
                && map.len() <= 2
                && map.keys().all(|k| {
                    matches!(
                        k.as_str(),
                        "seconds" | "nanoseconds" | "_seconds" | "_nanoseconds"
                    )
                })
        }
        _ => false,
    }
}

/// Recursively replaces every structured timestamp object in `value` with
/// its RFC 3339 string form, including inside nested objects and arrays.
///
/// Structured timestamp objects are not safe to hand to UI-facing code, so
/// this runs on every document a store implementation returns.
pub fn normalize_document(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                if is_timestamp_object(v) {
                    if let Some(dt) = normalize_value(v) {
                        *v = Value::String(dt.to_rfc3339());
                        continue;
                    }
                }
                normalize_document(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                if is_timestamp_object(item) {
                    if let Some(dt) = normalize_value(item) {
                        *item = Value::String(dt.to_rfc3339());
                        continue;
                    }
                }
                normalize_document(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_strings() {
        let dt = normalize_value(&json!("2026-03-01T10:30:00Z")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_offsetless_iso_strings_as_utc() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(normalize_value(&json!("2026-03-01T10:30:00")), Some(expected));
        assert_eq!(
            normalize_value(&json!("2026-03-01T10:30:00.000")),
            Some(expected)
        );
    }

    #[test]
    fn parses_epoch_milliseconds() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let dt = normalize_value(&json!(expected.timestamp_millis())).unwrap();
        assert_eq!(dt, expected);
    }

    #[test]
    fn parses_structured_pairs_both_spellings() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let secs = expected.timestamp();

        let dt = normalize_value(&json!({"seconds": secs, "nanoseconds": 0})).unwrap();
        assert_eq!(dt, expected);

        let dt = normalize_value(&json!({"_seconds": secs, "_nanoseconds": 0})).unwrap();
        assert_eq!(dt, expected);
    }

    #[test]
    fn unrecognized_shapes_return_none() {
        assert!(normalize_value(&json!("not a date")).is_none());
        assert!(normalize_value(&json!(true)).is_none());
        assert!(normalize_value(&json!(null)).is_none());
        assert!(normalize_value(&json!({"foo": 1})).is_none());
        assert!(normalize_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn normalizes_nested_documents_in_place() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap();
        let secs = expected.timestamp();
        let mut doc = json!({
            "lastAccessed": {"seconds": secs, "nanoseconds": 0},
            "history": [
                {"accessedAt": {"_seconds": secs, "_nanoseconds": 0}},
            ],
            "score": 82.5,
        });

        normalize_document(&mut doc);

        assert_eq!(doc["lastAccessed"], json!(expected.to_rfc3339()));
        assert_eq!(doc["history"][0]["accessedAt"], json!(expected.to_rfc3339()));
        assert_eq!(doc["score"], json!(82.5));
    }
}
