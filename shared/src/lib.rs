//! Shared types for the parking client
//!
//! Domain models, the document wire codec, time-of-day schedule parsing and
//! error codes. Nothing in this crate performs I/O.

pub mod document;
pub mod error;
pub mod models;
pub mod schedule;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use document::{Document, DocumentValue, FromDocument, StructuredQuery, ToFields};
pub use error::{AppError, AppResult, ErrorCode};
