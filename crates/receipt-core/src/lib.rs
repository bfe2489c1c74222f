//! # receipt-core: Pure Types for the Receipt Manager Backend
//!
//! Everything that describes *what* the backend stores and how it is
//! configured, with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Receipt Manager Backend                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  apps/backend: config loader, TLS, token, front-end settings    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │  receipt-db: backends, schema, catalog + report repositories    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ receipt-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   types   │  │ settings  │  │validation │  │    ids    │   │   │
//! │  │   │  Table    │  │ Settings  │  │  names    │  │ new_row_id│   │   │
//! │  │   │  rows     │  │ loose YAML│  │           │  │           │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Tables, entity rows, list envelopes, front-end DTOs
//! - [`settings`] - The settings document shared by every component
//! - [`error`] - Domain error types
//! - [`validation`] - Name checks applied before writes
//! - [`ids`] - Row id synthesis

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use settings::Settings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Width of the `nvarchar(50)` name columns on categories, stores and tags.
pub const MAX_NAME_LEN: usize = 50;
