//! Document store wire model
//!
//! Typed field values, documents, and structured queries in the shape the
//! remote document store speaks. Models convert through [`FromDocument`] and
//! [`ToFields`].

mod document;
mod query;
mod value;

pub use document::{
    Document, DocumentError, DocumentResult, FieldMap, FromDocument, ToFields, decode_all,
    field,
};
pub use query::{FieldFilter, FieldOp, StructuredQuery};
pub use value::DocumentValue;
