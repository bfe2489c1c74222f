//! SQLite backend for repository tests.
//!
//! A file in a temporary directory, opened afresh for every session like the
//! server backends. Reports itself as MySQL so repositories take the same
//! code paths. DECIMAL columns are stored as text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row as _, Sqlite};
use tempfile::TempDir;

use super::{Backend, ColumnKind, DbMode, Row, Session, SqlValue};
use crate::error::{DbError, DbResult};
use crate::placeholder::check_arity;

const FIXTURE: &str = "
    CREATE TABLE tags (id INTEGER PRIMARY KEY, tagName TEXT);
    CREATE TABLE stores (id INTEGER PRIMARY KEY, storeName TEXT);
    CREATE TABLE categories (id INTEGER PRIMARY KEY, categoryName TEXT);
    CREATE TABLE items (
        id INTEGER PRIMARY KEY,
        itemName TEXT,
        itemTotal TEXT,
        categoryId INTEGER REFERENCES categories(id)
    );
    CREATE TABLE purchasesArticles (id INTEGER, itemid INTEGER REFERENCES items(id));
    CREATE TABLE receipts (
        id INTEGER PRIMARY KEY,
        storeId INTEGER,
        date TEXT,
        total TEXT,
        tagId INTEGER REFERENCES tags(id),
        purchaseId INTEGER
    );
";

#[derive(Debug, Clone)]
pub(crate) struct SqliteBackend {
    options: SqliteConnectOptions,
    _dir: Arc<TempDir>,
}

impl SqliteBackend {
    /// A fresh database holding the six receipt tables.
    pub(crate) async fn with_tables() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::at(&dir.path().join("receipts.db"), dir);

        let mut session = backend.open().await.unwrap();
        session.execute_script(FIXTURE).await.unwrap();
        session.close().await.unwrap();
        backend
    }

    fn at(path: &Path, dir: TempDir) -> Self {
        SqliteBackend {
            options: SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true),
            _dir: Arc::new(dir),
        }
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    fn mode(&self) -> DbMode {
        DbMode::MySql
    }

    async fn open(&self) -> DbResult<Box<dyn Session>> {
        let conn = self
            .options
            .connect()
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        Ok(Box::new(SqliteSession { conn }))
    }
}

struct SqliteSession {
    conn: SqliteConnection,
}

#[async_trait]
impl Session for SqliteSession {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        check_arity(sql, params.len())?;
        let result = bind_all(sqlx::query(sql), params)
            .execute(&mut self.conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        columns: &[ColumnKind],
    ) -> DbResult<Vec<Row>> {
        check_arity(sql, params.len())?;
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&mut self.conn)
            .await?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }

    async fn execute_script(&mut self, sql: &str) -> DbResult<()> {
        sqlx::Executor::execute(&mut self.conn, sql).await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Decimal(v) => query.bind(v.to_string()),
            SqlValue::Date(v) => query.bind(*v),
        };
    }
    query
}

fn decode_row(row: &SqliteRow, columns: &[ColumnKind]) -> DbResult<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(index, kind)| -> DbResult<SqlValue> {
            let value = match kind {
                ColumnKind::Int => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::Int),
                ColumnKind::Text => row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text),
                ColumnKind::Decimal => row
                    .try_get::<Option<String>, _>(index)?
                    .map(|raw| {
                        raw.parse::<Decimal>()
                            .map(SqlValue::Decimal)
                            .map_err(|e| DbError::Decode {
                                column: index,
                                reason: e.to_string(),
                            })
                    })
                    .transpose()?,
                ColumnKind::Date => row
                    .try_get::<Option<NaiveDate>, _>(index)?
                    .map(SqlValue::Date),
            };
            Ok(value.unwrap_or(SqlValue::Null))
        })
        .collect::<DbResult<Vec<_>>>()
        .map(Row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_runs_every_statement() {
        let backend = SqliteBackend::with_tables().await;
        let mut session = backend.open().await.unwrap();

        let rows = session
            .fetch(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                &[],
                &[ColumnKind::Int],
            )
            .await
            .unwrap();
        session.close().await.unwrap();

        assert_eq!(rows[0].int(0).unwrap(), 6);
    }

    #[tokio::test]
    async fn test_script_reports_failing_statement() {
        let backend = SqliteBackend::with_tables().await;
        let mut session = backend.open().await.unwrap();

        let err = session
            .execute_script("CREATE TABLE tags (id INTEGER)")
            .await
            .unwrap_err();
        session.close().await.unwrap();

        assert!(matches!(err, DbError::QueryFailed(_)));
    }
}
