//! # Error Types
//!
//! Bootstrap errors and the boundary error handed to request handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Backend                            │
//! │                                                                         │
//! │  Startup                              Request handling                  │
//! │  ───────                              ────────────────                  │
//! │                                                                         │
//! │  ConfigError ──┐                      DbError ───────┐                  │
//! │  cert / token  ├──► BootstrapError    CoreError ─────┼──► ApiError      │
//! │  DbError ──────┘         │                           │    {code,        │
//! │                          ▼                           │     message}     │
//! │                   anyhow in main()    BootstrapError ┘       │          │
//! │                                                              ▼          │
//! │                                                     status() 4xx / 5xx  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::{Path, PathBuf};

use receipt_core::CoreError;
use receipt_db::DbError;
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Configuration
// =============================================================================

/// Failure to produce the settings document.
///
/// Environment mode never fails; only the file path does.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

// =============================================================================
// Bootstrap
// =============================================================================

/// Errors raised while preparing the backend to serve.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A setting needed by this step is empty.
    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid IP address '{0}'")]
    InvalidIpAddress(String),

    /// Key generation or certificate signing failed.
    #[error("Certificate generation failed: {0}")]
    Certificate(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode front-end settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl BootstrapError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        BootstrapError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<rcgen::Error> for BootstrapError {
    fn from(err: rcgen::Error) -> Self {
        BootstrapError::Certificate(err.to_string())
    }
}

/// Result type for bootstrap steps.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

// =============================================================================
// Boundary Error
// =============================================================================

/// Error returned to the HTTP layer.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Category not found: Groceries"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate key or a row still referenced (409)
    Conflict,

    /// Database unreachable or a query failed (503 / 500)
    DatabaseError,

    /// Settings missing or malformed (500)
    ConfigurationError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status the boundary layer answers with.
    pub const fn status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError => 503,
            ErrorCode::ConfigurationError => 500,
            ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Row is referenced by other rows")
            }
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::UnsupportedTable(table) => {
                ApiError::validation(format!("Table '{table}' is not supported here"))
            }
            DbError::ConnectionFailed(_) | DbError::Redirected { .. } => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::UnsupportedMode(_) | DbError::Misconfigured(_) => ApiError::new(
                ErrorCode::ConfigurationError,
                format!("Database settings are invalid: {err}"),
            ),
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::SchemaFailed { failed } => {
                tracing::error!(failed = ?failed, "Schema incomplete");
                ApiError::new(ErrorCode::DatabaseError, "Database schema is incomplete")
            }
            DbError::Decode { .. } | DbError::Internal(_) => {
                tracing::error!("Internal database error: {}", err);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownTable(table) => ApiError::validation(format!("Unknown table '{table}'")),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts bootstrap errors to API errors.
impl From<BootstrapError> for ApiError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Database(e) => e.into(),
            BootstrapError::Config(_)
            | BootstrapError::MissingSetting(_)
            | BootstrapError::InvalidIpAddress(_) => {
                ApiError::new(ErrorCode::ConfigurationError, err.to_string())
            }
            other => {
                tracing::error!("Bootstrap failed: {}", other);
                ApiError::internal("Backend is not ready")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
