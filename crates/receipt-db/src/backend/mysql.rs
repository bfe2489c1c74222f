//! MySQL backend over a single sqlx [`MySqlConnection`] per session.
//!
//! sqlx binds `?` natively, so statements are sent exactly as authored.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, Connection, MySql, Row as _};
use tracing::{debug, warn};

use super::{Backend, ColumnKind, ConnectSettings, DbMode, Row, Session, SqlValue};
use crate::error::{DbError, DbResult};
use crate::placeholder::check_arity;

/// `dbMode: mysql`.
#[derive(Debug, Clone)]
pub struct MySqlBackend {
    settings: ConnectSettings,
}

impl MySqlBackend {
    pub fn new(settings: ConnectSettings) -> Self {
        MySqlBackend { settings }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let address = &self.settings.address;
        let options = MySqlConnectOptions::new()
            .host(&address.host)
            .port(address.port)
            .username(&self.settings.username)
            .password(&self.settings.password);

        if self.settings.database.is_empty() {
            options
        } else {
            options.database(&self.settings.database)
        }
    }
}

#[async_trait]
impl Backend for MySqlBackend {
    fn mode(&self) -> DbMode {
        DbMode::MySql
    }

    async fn open(&self) -> DbResult<Box<dyn Session>> {
        let address = &self.settings.address;
        debug!(host = %address.host, port = address.port, "Opening MySQL connection");

        let conn = self.connect_options().connect().await.map_err(|e| {
            warn!(host = %address.host, error = %e, "MySQL connection failed");
            DbError::ConnectionFailed(e.to_string())
        })?;

        Ok(Box::new(MySqlSession { conn }))
    }
}

struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        check_arity(sql, params.len())?;
        debug!(sql, "Executing statement");

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
        debug!(sql, "Running query");

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
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &'q [SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<i64>),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Decimal(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
        };
    }
    query
}

fn decode_row(row: &MySqlRow, columns: &[ColumnKind]) -> DbResult<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(index, kind)| -> DbResult<SqlValue> {
            let value = match kind {
                ColumnKind::Int => row.try_get::<Option<i64>, _>(index)?.map(SqlValue::Int),
                ColumnKind::Text => row.try_get::<Option<String>, _>(index)?.map(SqlValue::Text),
                ColumnKind::Decimal => row
                    .try_get::<Option<Decimal>, _>(index)?
                    .map(SqlValue::Decimal),
                ColumnKind::Date => row
                    .try_get::<Option<NaiveDate>, _>(index)?
                    .map(SqlValue::Date),
            };
            Ok(value.unwrap_or(SqlValue::Null))
        })
        .collect::<DbResult<Vec<_>>>()
        .map(Row)
}
