//! Typed field values as they appear on the wire
//!
//! The backend wraps every field in a single-key object naming its type:
//!
//! ```json
//! { "stringValue": "Lot A" }
//! { "integerValue": "42" }
//! { "doubleValue": 4.602 }
//! { "timestampValue": "2024-11-26T15:00:00Z" }
//! ```
//!
//! Integers travel as decimal strings (64-bit safe); decoding also accepts a
//! bare JSON number. Booleans, nulls, references, maps and arrays are carried
//! so that documents holding them still decode; the models never read them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentValue {
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "integerValue", with = "integer_string")]
    Integer(i64),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "mapValue")]
    Map(Value),
    #[serde(rename = "arrayValue")]
    Array(Value),
}

impl DocumentValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Timestamp(_) => "timestamp",
            Self::Boolean(_) => "boolean",
            Self::Null(()) => "null",
            Self::Reference(_) => "reference",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Doubles, and integers widened to f64 (coordinates are sometimes
    /// written as whole numbers).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Ordering used by query filters. Values of unrelated types are
    /// incomparable; integers and doubles compare numerically.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Double(_) | Self::Integer(_), Self::Double(_) | Self::Integer(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            _ => None,
        }
    }
}

impl From<&str> for DocumentValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for DocumentValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i64> for DocumentValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<u32> for DocumentValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for DocumentValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<DateTime<Utc>> for DocumentValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

mod integer_string {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(i64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.trim().parse().map_err(de::Error::custom),
            Repr::Number(n) => Ok(n),
        }
    }
}
