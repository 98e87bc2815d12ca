//! Structured queries: a collection plus an AND of field filters

use super::document::Document;
use super::value::DocumentValue;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::cmp::Ordering;

/// Comparison operator of a field filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldOp {
    Equal,
    LessThan,
    GreaterThan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FieldOp,
    pub value: DocumentValue,
}

impl FieldFilter {
    /// Evaluate this filter against a document; a missing field never matches
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.fields.get(&self.field) else {
            return false;
        };
        let Some(ordering) = actual.compare(&self.value) else {
            return false;
        };
        match self.op {
            FieldOp::Equal => ordering == Ordering::Equal,
            FieldOp::LessThan => ordering == Ordering::Less,
            FieldOp::GreaterThan => ordering == Ordering::Greater,
        }
    }

    fn to_wire(&self) -> Value {
        json!({
            "fieldFilter": {
                "field": { "fieldPath": self.field },
                "op": self.op,
                "value": self.value,
            }
        })
    }
}

/// Query over one collection with a composite AND filter
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
}

impl StructuredQuery {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
        }
    }

    pub fn filter(
        mut self,
        field: impl Into<String>,
        op: FieldOp,
        value: impl Into<DocumentValue>,
    ) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<DocumentValue>) -> Self {
        self.filter(field, FieldOp::Equal, value)
    }

    pub fn where_lt(self, field: impl Into<String>, value: impl Into<DocumentValue>) -> Self {
        self.filter(field, FieldOp::LessThan, value)
    }

    pub fn where_gt(self, field: impl Into<String>, value: impl Into<DocumentValue>) -> Self {
        self.filter(field, FieldOp::GreaterThan, value)
    }

    /// True when every filter matches
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Body of a `:runQuery` request
    pub fn to_request_body(&self) -> Value {
        let mut query = json!({
            "from": [{ "collectionId": self.collection }],
        });
        let filter = match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.to_wire()),
            many => Some(json!({
                "compositeFilter": {
                    "op": "AND",
                    "filters": many.iter().map(FieldFilter::to_wire).collect::<Vec<_>>(),
                }
            })),
        };
        if let Some(filter) = filter {
            query["where"] = filter;
        }
        json!({ "structuredQuery": query })
    }
}
