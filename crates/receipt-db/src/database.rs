//! # Database Handle
//!
//! [`Database`] wraps the selected backend and hands out repositories.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Database::from_settings(&settings)     picks mysql / mssql             │
//! │       │                                 (no connection yet)             │
//! │       ▼                                                                 │
//! │  db.init_schema()                       one session, all DDL            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.health_check()                      SELECT 1                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.catalog() / db.reports()            one session per call            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use receipt_core::Settings;
use tracing::{info, warn};

use crate::backend::{self, Backend, DbMode};
use crate::error::DbResult;
use crate::repository::{finish, CatalogRepository, PurchaseReportRepository, RowRepository};
use crate::schema;

/// Entry point to the data layer.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::from_settings(&settings)?;
/// db.init_schema().await?;
///
/// let stores = db.catalog().list(Table::Stores).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    backend: Arc<dyn Backend>,
}

impl Database {
    /// Selects the backend named by `settings.db_mode`.
    ///
    /// ## Errors
    /// - `UnsupportedMode` when `dbMode` is not `mysql` or `mssql`
    /// - `Misconfigured` when `sqlServerIP` is empty or has a bad port
    pub fn from_settings(settings: &Settings) -> DbResult<Self> {
        Ok(Database {
            backend: backend::connect(settings)?,
        })
    }

    /// Uses an already constructed backend.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Database { backend }
    }

    pub fn mode(&self) -> DbMode {
        self.backend.mode()
    }

    /// Creates the tables and the reporting view if they are missing.
    pub async fn init_schema(&self) -> DbResult<()> {
        let mode = self.mode();
        info!(mode = %mode, "Initializing schema");

        let mut session = self.backend.open().await?;
        let result = schema::init_schema(session.as_mut(), mode).await;
        finish(session, result).await
    }

    /// Returns the catalog repository.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(Arc::clone(&self.backend))
    }

    /// Returns the purchase report repository.
    pub fn reports(&self) -> PurchaseReportRepository {
        PurchaseReportRepository::new(Arc::clone(&self.backend))
    }

    pub fn rows(&self) -> RowRepository {
        RowRepository::new(Arc::clone(&self.backend))
    }

    /// Checks if the database is reachable and answers queries.
    pub async fn health_check(&self) -> bool {
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }

    async fn ping(&self) -> DbResult<()> {
        let mut session = self.backend.open().await?;
        let result = session.execute_script("SELECT 1").await;
        finish(session, result).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::backend::sqlite::SqliteBackend;
    use crate::error::DbError;
    use receipt_core::Table;

    #[tokio::test]
    async fn test_sqlite_database_is_healthy() {
        let db = Database::with_backend(Arc::new(SqliteBackend::with_tables().await));
        assert!(db.health_check().await);

        assert!(matches!(
            db.catalog().upsert(Table::Tags, None, "x").await,
            Err(DbError::UnsupportedTable(_))
        ));
        let id = db.catalog().upsert(Table::Stores, None, "Market").await.unwrap();
        assert_eq!(db.catalog().store_id("Market").await.unwrap(), id);
    }

    #[tokio::test]
    async fn test_failed_health_check() {
        let db = Database::with_backend(Arc::new(
            ScriptedBackend::new(DbMode::MySql).fail_on("SELECT 1"),
        ));
        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_init_schema_uses_backend_dialect() {
        let backend = ScriptedBackend::new(DbMode::MsSql);
        let db = Database::with_backend(Arc::new(backend.clone()));

        db.init_schema().await.unwrap();

        assert_eq!(backend.statements().len(), 2);
        assert_eq!(backend.sessions(), (1, 1));
    }

    #[tokio::test]
    async fn test_init_schema_closes_session_on_failure() {
        let backend = ScriptedBackend::new(DbMode::MySql).fail_on("VIEW");
        let db = Database::with_backend(Arc::new(backend.clone()));

        assert!(matches!(
            db.init_schema().await,
            Err(DbError::SchemaFailed { .. })
        ));
        assert_eq!(backend.sessions(), (1, 1));
    }

    #[test]
    fn test_from_settings_reports_bad_mode() {
        let settings = Settings {
            db_mode: "oracle".to_string(),
            sql_server_ip: "db".to_string(),
            ..Settings::default()
        };
        assert!(matches!(
            Database::from_settings(&settings),
            Err(DbError::UnsupportedMode(_))
        ));
    }
}
