//! # Schema Initialization
//!
//! Creates the six receipt tables and the `purchaseData` reporting view.
//!
//! ## Per Dialect
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MySQL                                 SQL Server                       │
//! │  ─────                                 ──────────                       │
//! │  7 statements, one at a time           2 batches                        │
//! │                                                                         │
//! │  CREATE TABLE IF NOT EXISTS tags       IF object_id('tags','U') IS NULL │
//! │  CREATE TABLE IF NOT EXISTS stores        CREATE TABLE tags (...)       │
//! │  ...                                   ... (all six tables)             │
//! │  CREATE OR REPLACE VIEW purchaseData                                    │
//! │                                        IF object_id('purchaseData','V') │
//! │                                           EXEC('CREATE VIEW ...')       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both are idempotent. Every statement runs even when an earlier one fails;
//! failures are logged as they happen and reported together at the end as
//! [`DbError::SchemaFailed`]. MySQL replaces the view on every run, SQL
//! Server only creates it when missing.

use tracing::{debug, error, info};

use crate::backend::{DbMode, Session};
use crate::error::{DbError, DbResult};

/// One schema statement and the object it creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStatement {
    pub object: &'static str,
    pub sql: &'static str,
}

const MYSQL_SCHEMA: &[SchemaStatement] = &[
    SchemaStatement {
        object: "tags",
        sql: "CREATE TABLE IF NOT EXISTS tags (id int, tagName nvarchar(50), PRIMARY KEY(id))",
    },
    SchemaStatement {
        object: "stores",
        sql: "CREATE TABLE IF NOT EXISTS stores (id int, storeName nvarchar(50), PRIMARY KEY(id))",
    },
    SchemaStatement {
        object: "categories",
        sql: "CREATE TABLE IF NOT EXISTS categories (id int, categoryName nvarchar(50), PRIMARY KEY(id))",
    },
    SchemaStatement {
        object: "items",
        sql: "CREATE TABLE IF NOT EXISTS items (id int, itemName nvarchar(100), itemTotal decimal(15,2), \
              categoryId int, FOREIGN KEY (categoryId) REFERENCES categories(id), PRIMARY KEY(id))",
    },
    SchemaStatement {
        object: "purchasesArticles",
        sql: "CREATE TABLE IF NOT EXISTS purchasesArticles (id int, itemid int, \
              FOREIGN KEY (itemid) REFERENCES items(id))",
    },
    SchemaStatement {
        object: "receipts",
        sql: "CREATE TABLE IF NOT EXISTS receipts (id int, storeId int, `date` date, total decimal(15,2), \
              tagId int, FOREIGN KEY (tagId) REFERENCES tags(id), purchaseId int, PRIMARY KEY(id))",
    },
    SchemaStatement {
        object: "purchaseData",
        sql: "CREATE OR REPLACE VIEW purchaseData AS
            SELECT i.itemName article_name, 1 amount, itemTotal total, c.categoryName category,
                   storeName location, date timestamp, CONVERT(r.id, char) id
            FROM receipts r
                JOIN stores s ON r.storeId = s.id
                JOIN purchasesArticles pa ON r.purchaseId = pa.id
                JOIN items i ON pa.itemid = i.id
                JOIN categories c ON c.id = i.categoryId",
    },
];

const MSSQL_SCHEMA: &[SchemaStatement] = &[
    SchemaStatement {
        object: "tables",
        sql: "IF object_id('tags', 'U') IS NULL
                CREATE TABLE tags (id int PRIMARY KEY, tagName nvarchar(50))
            IF object_id('stores', 'U') IS NULL
                CREATE TABLE stores (id int PRIMARY KEY, storeName nvarchar(50))
            IF object_id('categories', 'U') IS NULL
                CREATE TABLE categories (id int PRIMARY KEY, categoryName nvarchar(50))
            IF object_id('items', 'U') IS NULL
                CREATE TABLE items (id int PRIMARY KEY, itemName nvarchar(100), itemTotal decimal(15,2),
                                    categoryId int FOREIGN KEY REFERENCES categories(id))
            IF object_id('purchasesArticles', 'U') IS NULL
                CREATE TABLE purchasesArticles (id int, itemid int FOREIGN KEY REFERENCES items(id))
            IF object_id('receipts', 'U') IS NULL
                CREATE TABLE receipts (id int PRIMARY KEY, storeId int, [date] date, total decimal(15,2),
                                       tagId int FOREIGN KEY REFERENCES tags(id), purchaseId int)",
    },
    SchemaStatement {
        object: "purchaseData",
        sql: "IF object_id('purchaseData', 'V') IS NULL
            EXEC('CREATE VIEW purchaseData AS
                SELECT i.itemName article_name, 1 amount, itemTotal total, c.categoryName category,
                       storeName location, date timestamp, CONVERT(varchar, r.id) id
                FROM receipts r
                    JOIN stores s ON r.storeId = s.id
                    JOIN purchasesArticles pa ON r.purchaseId = pa.id
                    JOIN items i ON pa.itemid = i.id
                    JOIN categories c ON c.id = i.categoryId')",
    },
];

/// Schema statements for a dialect, in execution order.
pub fn statements(mode: DbMode) -> &'static [SchemaStatement] {
    match mode {
        DbMode::MySql => MYSQL_SCHEMA,
        DbMode::MsSql => MSSQL_SCHEMA,
    }
}

/// Runs every schema statement for `mode` on an open session.
///
/// The session is left open; the caller closes it.
pub async fn init_schema(session: &mut dyn Session, mode: DbMode) -> DbResult<()> {
    let mut failed = Vec::new();

    for statement in statements(mode) {
        debug!(object = statement.object, mode = %mode, "Creating schema object");
        if let Err(e) = session.execute_script(statement.sql).await {
            error!(object = statement.object, error = %e, "Schema statement failed");
            failed.push(statement.object.to_string());
        }
    }

    if !failed.is_empty() {
        return Err(DbError::SchemaFailed { failed });
    }

    info!(mode = %mode, "Schema ready");
    Ok(())
}
