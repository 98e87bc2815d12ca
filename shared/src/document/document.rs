//! Documents and the mapping traits between documents and domain models

use super::value::DocumentValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name → typed value
pub type FieldMap = BTreeMap<String, DocumentValue>;

/// Errors raised while mapping a document onto a domain type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Field {field} has type {found}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field {field} is invalid: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// A stored document
///
/// `name` is the full resource path assigned by the store
/// (`.../documents/parkingLots/abc123`); it is empty for documents that have
/// not been created yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(name: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            name: name.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }

    /// Last path segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    fn field(&self, field: &str) -> DocumentResult<&DocumentValue> {
        self.fields
            .get(field)
            .ok_or_else(|| DocumentError::MissingField(field.to_string()))
    }

    fn wrong_type(field: &str, expected: &'static str, found: &DocumentValue) -> DocumentError {
        DocumentError::WrongType {
            field: field.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn string(&self, field: &str) -> DocumentResult<&str> {
        let value = self.field(field)?;
        value
            .as_str()
            .ok_or_else(|| Self::wrong_type(field, "string", value))
    }

    pub fn integer(&self, field: &str) -> DocumentResult<i64> {
        let value = self.field(field)?;
        value
            .as_i64()
            .ok_or_else(|| Self::wrong_type(field, "integer", value))
    }

    pub fn double(&self, field: &str) -> DocumentResult<f64> {
        let value = self.field(field)?;
        value
            .as_f64()
            .ok_or_else(|| Self::wrong_type(field, "double", value))
    }

    pub fn timestamp(&self, field: &str) -> DocumentResult<DateTime<Utc>> {
        let value = self.field(field)?;
        value
            .as_timestamp()
            .ok_or_else(|| Self::wrong_type(field, "timestamp", value))
    }

    /// Integer field that must fit in a u32 (spot counts)
    pub fn count(&self, field: &str) -> DocumentResult<u32> {
        let raw = self.integer(field)?;
        u32::try_from(raw).map_err(|_| DocumentError::InvalidValue {
            field: field.to_string(),
            reason: format!("{} is not a valid count", raw),
        })
    }
}

/// One `(name, value)` entry for building a [`FieldMap`]
pub fn field(name: &str, value: impl Into<DocumentValue>) -> (String, DocumentValue) {
    (name.to_string(), value.into())
}

/// Decode a domain value from a stored document
pub trait FromDocument: Sized {
    fn from_document(doc: &Document) -> DocumentResult<Self>;
}

/// Encode a domain value into the fields sent to the store
pub trait ToFields {
    fn to_fields(&self) -> FieldMap;
}

/// Decode every document that maps cleanly, skipping the rest
///
/// Malformed documents are treated as "no data" and only logged.
pub fn decode_all<T: FromDocument>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match T::from_document(doc) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(document = %doc.name, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}
