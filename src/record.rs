// src/record.rs
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::Value;

const NULL: Value = Value::Null;

/// A single record flowing through a pipeline.
///
/// A record is either live, carrying an insertion-ordered field mapping, or
/// dropped: a tombstone with no usable values. Dropping is monotonic: once a
/// record is dropped nothing un-drops it. Accessors on a dropped record are a
/// caller bug and panic; route drop status through the pipeline's filter
/// stages instead of inspecting values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    values: IndexMap<String, Value>,
    dropped: bool,
}

impl Record {
    /// Construct from a decode result. Null becomes a dropped record, a map
    /// becomes a record of its fields, and any other value is wrapped under
    /// a single synthetic "value" field.
    pub fn new(value: Value) -> Record {
        match value {
            Value::Null => Record {
                values: IndexMap::new(),
                dropped: true,
            },
            Value::Map(fields) => Record {
                values: fields,
                dropped: false,
            },
            other => {
                let mut values = IndexMap::new();
                values.insert("value".to_string(), other);
                Record {
                    values,
                    dropped: false,
                }
            }
        }
    }

    /// A dropped tombstone record.
    pub fn tombstone() -> Record {
        Record {
            values: IndexMap::new(),
            dropped: true,
        }
    }

    pub fn is_dropped(&self) -> bool {
        self.dropped
    }

    /// True iff the key is present with a non-null, non-empty value.
    pub fn has(&self, key: &str) -> bool {
        self.assert_live("has");
        match self.values.get(key) {
            None => false,
            Some(value) => !value.is_vacant(),
        }
    }

    /// Insert or overwrite a field, returning the record.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Record {
        self.assert_live("set");
        self.values.insert(key.into(), value.into());
        self
    }

    /// Keep the record if the flag is set, otherwise drop it.
    pub fn keep(self, keep: bool) -> Record {
        if keep {
            self
        } else {
            Record::tombstone()
        }
    }

    /// Drop the record if the flag is set, discarding its values.
    pub fn drop_if(self, drop: bool) -> Record {
        if drop {
            Record::tombstone()
        } else {
            self
        }
    }

    /// The raw value under a key, or null when absent.
    pub fn value(&self, key: &str) -> &Value {
        self.assert_live("value");
        self.values.get(key).unwrap_or(&NULL)
    }

    /// Bool coercion of a field. Missing or unconvertible values are false.
    pub fn bool(&self, key: &str) -> bool {
        self.assert_live("bool");
        self.values.get(key).is_some_and(Value::coerce_bool)
    }

    /// Int coercion of a field. Missing or unconvertible values are 0.
    pub fn int(&self, key: &str) -> i64 {
        self.assert_live("int");
        self.values.get(key).map_or(0, Value::coerce_int)
    }

    /// String rendering of a field. Missing or unrenderable values are "".
    pub fn string(&self, key: &str) -> String {
        self.assert_live("string");
        self.values.get(key).map_or_else(String::new, Value::render)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.assert_live("keys");
        self.values.keys().map(String::as_str)
    }

    /// Take ownership of the field mapping.
    pub fn into_fields(self) -> IndexMap<String, Value> {
        self.assert_live("into_fields");
        self.values
    }

    fn assert_live(&self, accessor: &str) {
        if self.dropped {
            panic!("{} called on dropped record", accessor);
        }
    }
}

impl Serialize for Record {
    /// A live record serializes as its field mapping, a dropped one as null.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.dropped {
            return serializer.serialize_unit();
        }
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
