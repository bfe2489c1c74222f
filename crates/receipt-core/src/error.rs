//! # Error Types
//!
//! Domain-specific error types for receipt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  receipt-core errors (this file)                                       │
//! │  ├── CoreError        - Unknown tables and wrapped validation         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  receipt-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  receipt-backend errors (app)                                          │
//! │  ├── BootstrapError   - Config, TLS, token, settings file failures     │
//! │  └── ApiError         - What the HTTP layer sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ApiError → HTTP response            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A table name that is not part of the six-table schema.
    ///
    /// ## When This Occurs
    /// - The HTTP layer passes a table name straight from a URL segment
    /// - A typo such as `"category"` instead of `"categories"`
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before a value reaches the database so callers get a typed
/// error instead of a driver truncation message.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },
}
