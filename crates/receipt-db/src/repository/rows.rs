//! # Row Repository
//!
//! Typed reads of whole table rows into the receipt-core entities.
//!
//! ```text
//! ┌───────────────────┬───────────────────┬──────────────────────────────────────┐
//! │ Entity            │ Table             │ Columns                              │
//! ├───────────────────┼───────────────────┼──────────────────────────────────────┤
//! │ Tag               │ tags              │ id, tagName                          │
//! │ Store             │ stores            │ id, storeName                        │
//! │ Category          │ categories        │ id, categoryName                     │
//! │ Item              │ items             │ id, itemName, itemTotal, categoryId  │
//! │ PurchaseArticle   │ purchasesArticles │ id, itemid                           │
//! │ Receipt           │ receipts          │ id, storeId, date, total, tagId,     │
//! │                   │                   │ purchaseId                           │
//! └───────────────────┴───────────────────┴──────────────────────────────────────┘
//! ```
//!
//! `purchasesArticles.id` is not unique: every line of one purchase shares
//! it. [`RowRepository::get`] returns the first such line; use
//! [`RowRepository::purchase_lines`] for all of them.

use std::sync::Arc;

use receipt_core::{Category, Item, PurchaseArticle, Receipt, Store, Table, Tag};
use tracing::debug;

use super::finish;
use crate::backend::{Backend, ColumnKind, Row, SqlValue};
use crate::error::{DbError, DbResult};

// =============================================================================
// Mapping
// =============================================================================

/// An entity stored one-to-one in a table row.
pub trait TableRow: Sized {
    const TABLE: Table;
    /// Selected columns, in decode order.
    const COLUMNS: &'static [&'static str];
    const KINDS: &'static [ColumnKind];

    fn from_row(row: &Row) -> DbResult<Self>;
}

impl TableRow for Tag {
    const TABLE: Table = Table::Tags;
    const COLUMNS: &'static [&'static str] = &["id", "tagName"];
    const KINDS: &'static [ColumnKind] = &[ColumnKind::Int, ColumnKind::Text];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Tag {
            id: row.int(0)?,
            tag_name: row.text(1)?,
        })
    }
}

impl TableRow for Store {
    const TABLE: Table = Table::Stores;
    const COLUMNS: &'static [&'static str] = &["id", "storeName"];
    const KINDS: &'static [ColumnKind] = &[ColumnKind::Int, ColumnKind::Text];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Store {
            id: row.int(0)?,
            store_name: row.text(1)?,
        })
    }
}

impl TableRow for Category {
    const TABLE: Table = Table::Categories;
    const COLUMNS: &'static [&'static str] = &["id", "categoryName"];
    const KINDS: &'static [ColumnKind] = &[ColumnKind::Int, ColumnKind::Text];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Category {
            id: row.int(0)?,
            category_name: row.text(1)?,
        })
    }
}

impl TableRow for Item {
    const TABLE: Table = Table::Items;
    const COLUMNS: &'static [&'static str] = &["id", "itemName", "itemTotal", "categoryId"];
    const KINDS: &'static [ColumnKind] = &[
        ColumnKind::Int,
        ColumnKind::Text,
        ColumnKind::Decimal,
        ColumnKind::Int,
    ];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Item {
            id: row.int(0)?,
            item_name: row.text(1)?,
            item_total: row.decimal(2)?,
            category_id: row.int(3)?,
        })
    }
}

impl TableRow for PurchaseArticle {
    const TABLE: Table = Table::PurchasesArticles;
    const COLUMNS: &'static [&'static str] = &["id", "itemid"];
    const KINDS: &'static [ColumnKind] = &[ColumnKind::Int, ColumnKind::Int];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(PurchaseArticle {
            id: row.int(0)?,
            item_id: row.int(1)?,
        })
    }
}

impl TableRow for Receipt {
    const TABLE: Table = Table::Receipts;
    const COLUMNS: &'static [&'static str] =
        &["id", "storeId", "date", "total", "tagId", "purchaseId"];
    const KINDS: &'static [ColumnKind] = &[
        ColumnKind::Int,
        ColumnKind::Int,
        ColumnKind::Date,
        ColumnKind::Decimal,
        ColumnKind::Int,
        ColumnKind::Int,
    ];

    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(Receipt {
            id: row.int(0)?,
            store_id: row.int(1)?,
            date: row.date(2)?,
            total: row.decimal(3)?,
            tag_id: row.opt_int(4)?,
            purchase_id: row.int(5)?,
        })
    }
}

fn select_sql<T: TableRow>(filter: &str) -> String {
    format!(
        "SELECT {} FROM {}{filter} ORDER BY id",
        T::COLUMNS.join(", "),
        T::TABLE
    )
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Debug, Clone)]
pub struct RowRepository {
    backend: Arc<dyn Backend>,
}

impl RowRepository {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        RowRepository { backend }
    }

    /// Every row of `T`'s table, by id.
    pub async fn all<T: TableRow>(&self) -> DbResult<Vec<T>> {
        let rows = self.fetch::<T>("", &[]).await?;
        debug!(table = %T::TABLE, count = rows.len(), "Loaded rows");
        rows.iter().map(T::from_row).collect()
    }

    /// The row with `id`, or `NotFound`.
    pub async fn get<T: TableRow>(&self, id: i64) -> DbResult<T> {
        let rows = self.fetch::<T>(" WHERE id = ?", &[SqlValue::Int(id)]).await?;
        match rows.first() {
            Some(row) => T::from_row(row),
            None => Err(DbError::not_found(T::TABLE.as_str(), id.to_string())),
        }
    }

    /// Line items of one purchase (`receipts.purchaseId`).
    pub async fn purchase_lines(&self, purchase_id: i64) -> DbResult<Vec<PurchaseArticle>> {
        let rows = self
            .fetch::<PurchaseArticle>(" WHERE id = ?", &[SqlValue::Int(purchase_id)])
            .await?;
        rows.iter().map(PurchaseArticle::from_row).collect()
    }

    async fn fetch<T: TableRow>(&self, filter: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let sql = select_sql::<T>(filter);
        let mut session = self.backend.open().await?;
        let result = session.fetch(&sql, params, T::KINDS).await;
        finish(session, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::ScriptedBackend;
    use crate::backend::sqlite::SqliteBackend;
    use crate::backend::DbMode;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    async fn seeded() -> (SqliteBackend, RowRepository) {
        let backend = SqliteBackend::with_tables().await;
        let mut session = backend.open().await.unwrap();
        session
            .execute_script(
                "INSERT INTO tags VALUES (3, 'holiday');
                 INSERT INTO stores VALUES (5, 'Corner Shop');
                 INSERT INTO categories VALUES (7, 'Groceries');
                 INSERT INTO items VALUES (11, 'Milk', '1.29', 7);
                 INSERT INTO items VALUES (12, 'Bread', '2.50', 7);
                 INSERT INTO purchasesArticles VALUES (900, 11);
                 INSERT INTO purchasesArticles VALUES (900, 12);
                 INSERT INTO receipts VALUES (21, 5, '2024-03-09', '3.79', 3, 900);
                 INSERT INTO receipts VALUES (22, 5, '2024-03-10', '1.29', NULL, 901);",
            )
            .await
            .unwrap();
        session.close().await.unwrap();

        let repo = RowRepository::new(Arc::new(backend.clone()));
        (backend, repo)
    }

    #[tokio::test]
    async fn test_reads_lookup_tables() {
        let (_backend, repo) = seeded().await;

        let tags: Vec<Tag> = repo.all().await.unwrap();
        let stores: Vec<Store> = repo.all().await.unwrap();
        let categories: Vec<Category> = repo.all().await.unwrap();

        assert_eq!(tags[0].tag_name, "holiday");
        assert_eq!(stores[0].store_name, "Corner Shop");
        assert_eq!(
            categories,
            vec![Category {
                id: 7,
                category_name: "Groceries".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_reads_items_and_receipts() {
        let (_backend, repo) = seeded().await;

        let items: Vec<Item> = repo.all().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].item_total, Decimal::new(250, 2));
        assert_eq!(items[1].category_id, 7);

        let receipt: Receipt = repo.get(21).await.unwrap();
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(receipt.total, Decimal::new(379, 2));
        assert_eq!(receipt.tag_id, Some(3));
        assert_eq!(receipt.purchase_id, 900);

        let untagged: Receipt = repo.get(22).await.unwrap();
        assert_eq!(untagged.tag_id, None);
    }

    #[tokio::test]
    async fn test_purchase_lines() {
        let (_backend, repo) = seeded().await;

        let lines = repo.purchase_lines(900).await.unwrap();
        let mut items: Vec<i64> = lines.iter().map(|line| line.item_id).collect();
        items.sort_unstable();

        assert_eq!(items, vec![11, 12]);
        assert!(repo.purchase_lines(901).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_row() {
        let (_backend, repo) = seeded().await;

        let err = repo.get::<Store>(404).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::NotFound { ref entity, ref id } if entity == "stores" && id == "404"
        ));
    }

    #[tokio::test]
    async fn test_select_lists_columns() {
        let backend = ScriptedBackend::new(DbMode::MsSql);
        let repo = RowRepository::new(Arc::new(backend.clone()));

        repo.all::<PurchaseArticle>().await.unwrap();

        assert_eq!(
            backend.statements(),
            vec!["SELECT id, itemid FROM purchasesArticles ORDER BY id".to_string()]
        );
        assert_eq!(backend.sessions(), (1, 1));
    }
}
