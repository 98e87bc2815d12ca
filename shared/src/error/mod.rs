//! Unified error system for the parking client
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Parking lot errors
//! - 2xxx: Reservation errors
//! - 3xxx: Payment errors
//! - 4xxx: Offline sync errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::LotClosedDay);
//! assert_eq!(err.code.code(), 1002);
//!
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "name");
//! assert!(err.details.is_some());
//! ```

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
