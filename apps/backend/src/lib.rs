//! # receipt-backend
//!
//! Startup layer of the Receipt Manager backend.
//!
//! ## What Happens at Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   config.yaml / env ──► Settings ──┬──► cert.crt + key.pem (useSSL)     │
//! │                                    │                                    │
//! │                                    ├──► .api_token                      │
//! │                                    │        │                           │
//! │                                    │        ▼                           │
//! │                                    ├──► webroot/settings/settings.json  │
//! │                                    │                                    │
//! │                                    └──► Database (mysql | mssql)        │
//! │                                             │                           │
//! │                                             ▼                           │
//! │                                    schema + health check                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Settings from file or environment, cached
//! - [`tls`] - Self-signed certificate provisioning
//! - [`token`] - API token file
//! - [`frontend`] - Settings file for the web UI
//! - [`context`] - [`AppContext`] tying the steps together
//! - [`error`] - Bootstrap errors and the boundary [`ApiError`]

pub mod config;
pub mod context;
pub mod error;
pub mod frontend;
pub mod tls;
pub mod token;

pub use config::{ConfigLoader, RunMode};
pub use context::{AppContext, BootstrapPaths};
pub use error::{ApiError, BootstrapError, BootstrapResult, ConfigError, ErrorCode};
pub use tls::Provisioned;
pub use token::TokenStore;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - `RUST_LOG` takes precedence when set
/// - Otherwise: info everywhere, debug for our crates, warn for the drivers
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,receipt_backend=debug,receipt_db=debug,sqlx=warn,tiberius=warn")
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
