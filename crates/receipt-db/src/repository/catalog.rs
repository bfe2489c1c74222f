//! # Catalog Repository
//!
//! Generic name/id helpers for the lookup tables, plus delete-by-id for any
//! table.
//!
//! ## Supported Tables
//! ```text
//! ┌──────────────┬────────────────┬─────────┬────────┬──────┬──────────────┐
//! │ Table        │ Name column    │ upsert  │ delete │ list │ lookup       │
//! ├──────────────┼────────────────┼─────────┼────────┼──────┼──────────────┤
//! │ categories   │ categoryName   │   ✓     │   ✓    │  ✓   │ NotFound     │
//! │ stores       │ storeName      │   ✓     │   ✓    │  ✓   │ auto-create  │
//! │ other four   │ -              │   ✗     │   ✓    │  ✗   │ -            │
//! └──────────────┴────────────────┴─────────┴────────┴──────┴──────────────┘
//! ```
//!
//! ## Generated Ids
//! New rows get a random id in `1..=i32::MAX` (the columns are `int`). A
//! duplicate key on insert draws a fresh id, up to [`MAX_INSERT_ATTEMPTS`]
//! times in total.

use std::sync::Arc;

use receipt_core::ids::new_row_id;
use receipt_core::validation::validate_name;
use receipt_core::{NamedEntry, NamedList, Table};
use tracing::{debug, info, warn};

use super::finish;
use crate::backend::{Backend, ColumnKind, Session};
use crate::error::{DbError, DbResult};

/// Insert attempts before a duplicate id is reported.
pub const MAX_INSERT_ATTEMPTS: usize = 5;

/// Repository for categories, stores and deletes.
///
/// ## Usage
/// ```rust,ignore
/// let catalog = db.catalog();
///
/// let id = catalog.upsert(Table::Categories, None, "Groceries").await?;
/// catalog.upsert(Table::Categories, Some(id), "Food").await?;
///
/// let categories = catalog.list(Table::Categories).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    backend: Arc<dyn Backend>,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        CatalogRepository { backend }
    }

    /// Inserts a row (no `id`) or renames an existing one.
    ///
    /// ## Returns
    /// The id that was written: the generated one for inserts, `id` itself
    /// for updates.
    ///
    /// ## Errors
    /// - `UnsupportedTable` for anything but categories and stores
    /// - `Validation` for an empty or over-long name
    /// - `NotFound` when updating an id with no row
    /// - `UniqueViolation` when every generated id collided
    pub async fn upsert(&self, table: Table, id: Option<i64>, value: &str) -> DbResult<i64> {
        let column = name_column(table)?;
        validate_name(column, value)?;

        let mut session = self.backend.open().await?;
        let result = upsert_in(session.as_mut(), table, column, id, value).await;
        finish(session, result).await
    }

    /// Deletes the row with `id` from any of the six tables.
    ///
    /// Referenced rows are protected by the schema's foreign keys and come
    /// back as `ForeignKeyViolation`.
    pub async fn delete(&self, table: Table, id: i64) -> DbResult<()> {
        let sql = format!("DELETE FROM {table} WHERE id = ?");
        debug!(table = %table, id, "Deleting row");

        let mut session = self.backend.open().await?;
        let result = session.execute(&sql, &[id.into()]).await;
        let affected = finish(session, result).await?;

        if affected == 0 {
            return Err(DbError::not_found(table.as_str(), id.to_string()));
        }
        info!(table = %table, id, "Row deleted");
        Ok(())
    }

    /// All rows of a lookup table, ordered by name.
    pub async fn list(&self, table: Table) -> DbResult<NamedList> {
        let column = name_column(table)?;
        let sql = format!("SELECT id, {column} FROM {table} ORDER BY {column}");

        let mut session = self.backend.open().await?;
        let result = session
            .fetch(&sql, &[], &[ColumnKind::Int, ColumnKind::Text])
            .await;
        let rows = finish(session, result).await?;

        let values = rows
            .iter()
            .map(|row| -> DbResult<NamedEntry> {
                Ok(NamedEntry {
                    name: row.text(1)?,
                    id: row.int(0)?,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(table = %table, count = values.len(), "Listed rows");
        Ok(NamedList { values })
    }

    /// Id of the category called exactly `name`.
    ///
    /// Categories are never created implicitly; an unknown name is
    /// `NotFound`.
    pub async fn category_id(&self, name: &str) -> DbResult<i64> {
        let mut session = self.backend.open().await?;
        let result = find_id(session.as_mut(), Table::Categories, name).await;
        finish(session, result)
            .await?
            .ok_or_else(|| DbError::not_found("Category", name))
    }

    /// Id of the store called exactly `name`, creating the store if needed.
    pub async fn store_id(&self, name: &str) -> DbResult<i64> {
        let mut session = self.backend.open().await?;
        let result = find_or_create_store(session.as_mut(), name).await;
        finish(session, result).await
    }
}

fn name_column(table: Table) -> DbResult<&'static str> {
    table
        .name_column()
        .ok_or_else(|| DbError::UnsupportedTable(table.to_string()))
}

async fn find_id(session: &mut dyn Session, table: Table, name: &str) -> DbResult<Option<i64>> {
    let column = name_column(table)?;
    let sql = format!("SELECT id FROM {table} WHERE {column} = ?");

    let rows = session.fetch(&sql, &[name.into()], &[ColumnKind::Int]).await?;
    rows.first().map(|row| row.int(0)).transpose()
}

async fn find_or_create_store(session: &mut dyn Session, name: &str) -> DbResult<i64> {
    if let Some(id) = find_id(session, Table::Stores, name).await? {
        return Ok(id);
    }

    let column = name_column(Table::Stores)?;
    validate_name(column, name)?;
    let id = upsert_in(session, Table::Stores, column, None, name).await?;
    info!(store = name, id, "Store created on lookup");
    Ok(id)
}

async fn upsert_in(
    session: &mut dyn Session,
    table: Table,
    column: &str,
    id: Option<i64>,
    value: &str,
) -> DbResult<i64> {
    if let Some(id) = id {
        let sql = format!("UPDATE {table} SET {column} = ? WHERE id = ?");
        let affected = session.execute(&sql, &[value.into(), id.into()]).await?;
        if affected == 0 {
            return Err(DbError::not_found(table.as_str(), id.to_string()));
        }
        info!(table = %table, id, "Row updated");
        return Ok(id);
    }

    let sql = format!("INSERT INTO {table} VALUES (?, ?)");
    let mut attempt = 1;
    loop {
        let id = new_row_id();
        match session.execute(&sql, &[id.into(), value.into()]).await {
            Ok(_) => {
                info!(table = %table, id, "Row inserted");
                return Ok(id);
            }
            Err(e) if e.is_unique_violation() && attempt < MAX_INSERT_ATTEMPTS => {
                warn!(table = %table, id, attempt, "Generated id already taken, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
