//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error (MySQL)        tiberius::error::Error (SQL Server)        │
//! │       │                               │                                 │
//! │       └───────────────┬───────────────┘                                 │
//! │                       ▼                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in receipt-backend) ← code + message for the HTTP layer     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use receipt_core::ValidationError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Category lookup by a name that has no row
    /// - Update or delete of an id that doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique / primary key constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Deleting a category that items still reference
    /// - Inserting an item with a non-existent categoryId
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Server unreachable or refusing the login
    /// - TLS handshake with SQL Server failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// SQL Server asked the client to reconnect elsewhere.
    #[error("Connection redirected to {host}:{port}")]
    Redirected { host: String, port: u16 },

    /// `dbMode` is neither `mysql` nor `mssql`.
    #[error("Unsupported dbMode '{0}': use mssql or mysql")]
    UnsupportedMode(String),

    /// The generic upsert/list helpers only know categories and stores.
    #[error("Table '{0}' is not supported by this operation")]
    UnsupportedTable(String),

    /// A connection setting is missing or malformed.
    #[error("Database misconfigured: {0}")]
    Misconfigured(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A column could not be read as the expected type.
    #[error("Failed to decode column {column}: {reason}")]
    Decode { column: usize, reason: String },

    /// One or more schema statements failed. The others still ran.
    #[error("Schema initialization failed for: {}", failed.join(", "))]
    SchemaFailed { failed: Vec<String> },

    /// Input rejected before reaching the database.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// True for unique and primary key violations.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → unique / FK violation by error kind
/// sqlx::Error::Io, Tls        → DbError::ConnectionFailed
/// ColumnDecode                → DbError::Decode
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        field: db_err.constraint().unwrap_or("id").to_string(),
                        value: "unknown".to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
                }
            }

            sqlx::Error::Io(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Tls(e) => DbError::ConnectionFailed(e.to_string()),
            sqlx::Error::Configuration(e) => DbError::Misconfigured(e.to_string()),

            sqlx::Error::ColumnDecode { index, source } => DbError::Decode {
                column: index.parse().unwrap_or(0),
                reason: source.to_string(),
            },

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// SQL Server error numbers we classify.
const MSSQL_PRIMARY_KEY_VIOLATION: u32 = 2627;
const MSSQL_UNIQUE_INDEX_VIOLATION: u32 = 2601;
const MSSQL_CONSTRAINT_CONFLICT: u32 = 547;

/// Convert tiberius errors to DbError.
impl From<tiberius::error::Error> for DbError {
    fn from(err: tiberius::error::Error) -> Self {
        use tiberius::error::Error;

        match err {
            Error::Server(token) => match token.code() {
                MSSQL_PRIMARY_KEY_VIOLATION | MSSQL_UNIQUE_INDEX_VIOLATION => {
                    DbError::UniqueViolation {
                        field: "id".to_string(),
                        value: "unknown".to_string(),
                    }
                }
                MSSQL_CONSTRAINT_CONFLICT => DbError::ForeignKeyViolation {
                    message: token.message().to_string(),
                },
                _ => DbError::QueryFailed(token.message().to_string()),
            },
            Error::Io { message, .. } => DbError::ConnectionFailed(message),
            Error::Tls(message) => DbError::ConnectionFailed(message),
            Error::Routing { host, port } => DbError::Redirected { host, port },
            Error::Conversion(reason) => DbError::Decode {
                column: 0,
                reason: reason.to_string(),
            },
            other => DbError::Internal(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
