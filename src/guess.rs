// src/guess.rs
//
// Best-effort type recovery for decoded values. CSV hands us nothing but
// strings; guessing turns "42" into an integer, "true" into a bool and an
// RFC 3339 string into a timestamp so numeric accessors and JSON re-encoding
// produce natural types. Guessing is advisory and total: it never fails, and
// guessing an already-guessed value is a no-op.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

use crate::record::Record;
use crate::value::Value;

/// Timestamp layouts with a numeric zone offset, tried in order.
const ZONED_LAYOUTS: &[&str] = &[
    // Ruby date: "Mon Jan 02 15:04:05 -0700 2006"
    "%a %b %d %H:%M:%S %z %Y",
    // RFC 822 with numeric zone: "02 Jan 06 15:04 -0700"
    "%d %b %y %H:%M %z",
];

/// Zoneless layouts, interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    // ANSI C asctime: "Mon Jan  2 15:04:05 2006"
    "%a %b %e %H:%M:%S %Y",
    // RFC 850: "Monday, 02-Jan-06 15:04:05 GMT"
    "%A, %d-%b-%y %H:%M:%S GMT",
];

/// Re-type a value. Strings are classified, maps are guessed per field,
/// everything else passes through unchanged.
pub fn guess(value: Value) -> Value {
    match value {
        Value::String(s) => guess_str(&s),
        Value::Map(fields) => Value::Map(
            fields
                .into_iter()
                .map(|(key, value)| (key, guess(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Classify a raw string. Ordered, first match wins: literal null/bool
/// spellings, then integer, float, timestamp, and finally the string itself.
pub fn guess_str(s: &str) -> Value {
    match s {
        "" => return Value::String(String::new()),
        "null" | "nil" => return Value::Null,
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        _ => {}
    }

    if let Ok(i) = s.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if let Some(ts) = parse_timestamp(s) {
        return Value::Timestamp(ts);
    }

    Value::String(s.to_string())
}

/// Apply `guess` to every field of a record. Identity on dropped records.
pub fn guess_record(record: Record) -> Record {
    if record.is_dropped() {
        return record;
    }
    Record::new(Value::Map(
        record
            .into_fields()
            .into_iter()
            .map(|(key, value)| (key, guess(value)))
            .collect(),
    ))
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    // RFC 2822 covers the RFC 822/1123 family, named and numeric zones both.
    if let Ok(ts) = DateTime::parse_from_rfc2822(s) {
        return Some(ts);
    }
    for layout in ZONED_LAYOUTS {
        if let Ok(ts) = DateTime::parse_from_str(s, layout) {
            return Some(ts);
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    None
}
