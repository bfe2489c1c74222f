//! # Repository Module
//!
//! Query helpers for the receipt schema.
//!
//! ## Session Per Call
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.catalog().upsert(Table::Stores, None, "Corner Shop")               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  backend.open()          fresh connection                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT INTO stores VALUES (?, ?)     autocommit                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.close()         always, also on error                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - categories and stores: upsert, delete, list, lookups
//! - [`PurchaseReportRepository`] - rows of the `purchaseData` view
//! - [`RowRepository`] - typed entity rows of any table

pub mod catalog;
pub mod report;
pub mod rows;

pub use catalog::CatalogRepository;
pub use report::PurchaseReportRepository;
pub use rows::{RowRepository, TableRow};

use tracing::warn;

use crate::backend::Session;
use crate::error::DbResult;

/// Closes `session` and hands back `result`.
///
/// A close failure only surfaces when the work itself succeeded.
pub(crate) async fn finish<T>(session: Box<dyn Session>, result: DbResult<T>) -> DbResult<T> {
    let closed = session.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close)) => {
            warn!(error = %close, "Failed to close session after error");
            Err(e)
        }
    }
}
