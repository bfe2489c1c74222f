//! # receipt-db: Database Layer for the Receipt Manager Backend
//!
//! Data access for the receipt schema on either MySQL or SQL Server,
//! selected at runtime by the `dbMode` setting.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Receipt Manager Data Flow                            │
//! │                                                                         │
//! │  Request handler (list stores, add category, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   receipt-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │    Schema    │  │   │
//! │  │   │ (database.rs) │    │ (catalog.rs)  │    │ (schema.rs)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ dyn Backend   │◄───│ Catalog       │    │ 6 tables     │  │   │
//! │  │   │ mysql / mssql │    │ PurchaseRepo  │    │ 1 view       │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  MySQL (sqlx)                   SQL Server (tiberius)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`backend`] - Backend/Session traits, MySQL and SQL Server drivers
//! - [`placeholder`] - `?` placeholder rendering per dialect
//! - [`schema`] - Idempotent table and view creation
//! - [`repository`] - Catalog, report and row repositories
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use receipt_db::Database;
//!
//! let db = Database::from_settings(&settings)?;
//! db.init_schema().await?;
//!
//! let id = db.catalog().store_id("Corner Shop").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod database;
pub mod error;
pub mod placeholder;
pub mod repository;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, DbMode, Session};
pub use database::Database;
pub use error::{DbError, DbResult};
pub use placeholder::translate_placeholders;

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::report::PurchaseReportRepository;
pub use repository::rows::{RowRepository, TableRow};
