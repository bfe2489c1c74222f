//! SQL Server backend over tiberius.
//!
//! ## Connection
//! ```text
//! sqlServerIP ──► ServerAddress ──► tiberius::Config
//!                                      │
//!              instance name? ──yes──► SQL Browser lookup (UDP 1434)
//!                                      │
//!                                      ▼
//!                               TcpStream (nodelay)
//!                                      │
//!                                      ▼
//!                         Client::connect ──Routing──► reconnect once
//! ```
//!
//! Login uses SQL Server authentication. The server certificate is trusted
//! as presented; local installs almost always run with a self-signed one.
//! Statements are rewritten from `?` to `@P1..@Pn` before they are sent.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, SqlBrowser, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

use super::{Backend, ColumnKind, ConnectSettings, DbMode, Row, Session, SqlValue};
use crate::error::{DbError, DbResult};
use crate::placeholder::{check_arity, numbered_markers};

type TdsClient = Client<Compat<TcpStream>>;

/// `dbMode: mssql`.
#[derive(Debug, Clone)]
pub struct MsSqlBackend {
    settings: ConnectSettings,
}

impl MsSqlBackend {
    pub fn new(settings: ConnectSettings) -> Self {
        MsSqlBackend { settings }
    }

    fn config(&self) -> Config {
        let address = &self.settings.address;
        let mut config = Config::new();

        config.host(&address.host);
        config.port(address.port);
        if let Some(instance) = &address.instance {
            config.instance_name(instance);
        }
        if !self.settings.database.is_empty() {
            config.database(&self.settings.database);
        }
        config.authentication(AuthMethod::sql_server(
            &self.settings.username,
            &self.settings.password,
        ));
        // Login packet encrypted, session traffic plain.
        config.encryption(EncryptionLevel::Off);
        config.trust_cert();

        config
    }

    async fn connect(&self, config: &Config) -> DbResult<TdsClient> {
        let tcp = if self.settings.address.instance.is_some() {
            TcpStream::connect_named(config).await?
        } else {
            TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        };
        tcp.set_nodelay(true)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(Client::connect(config.clone(), tcp.compat_write()).await?)
    }
}

#[async_trait]
impl Backend for MsSqlBackend {
    fn mode(&self) -> DbMode {
        DbMode::MsSql
    }

    async fn open(&self) -> DbResult<Box<dyn Session>> {
        let address = &self.settings.address;
        debug!(host = %address.host, port = address.port, "Opening SQL Server connection");

        let mut config = self.config();
        let client = match self.connect(&config).await {
            Err(DbError::Redirected { host, port }) => {
                info!(host = %host, port, "SQL Server redirected connection");
                config.host(&host);
                config.port(port);
                self.connect(&config).await
            }
            other => other,
        }
        .map_err(|e| {
            warn!(host = %address.host, error = %e, "SQL Server connection failed");
            e
        })?;

        Ok(Box::new(MsSqlSession { client }))
    }
}

struct MsSqlSession {
    client: TdsClient,
}

#[async_trait]
impl Session for MsSqlSession {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        check_arity(sql, params.len())?;
        let sql = numbered_markers(sql);
        debug!(sql = %sql, "Executing statement");

        let params: Vec<&dyn ToSql> = params.iter().map(to_sql).collect();
        let result = self.client.execute(sql, &params).await?;
        Ok(result.total())
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        columns: &[ColumnKind],
    ) -> DbResult<Vec<Row>> {
        check_arity(sql, params.len())?;
        let sql = numbered_markers(sql);
        debug!(sql = %sql, "Running query");

        let params: Vec<&dyn ToSql> = params.iter().map(to_sql).collect();
        let rows = self
            .client
            .query(sql, &params)
            .await?
            .into_first_result()
            .await?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }

    async fn execute_script(&mut self, sql: &str) -> DbResult<()> {
        self.client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.client.close().await?;
        Ok(())
    }
}

static NULL_INT: Option<i32> = None;

fn to_sql(value: &SqlValue) -> &dyn ToSql {
    match value {
        SqlValue::Null => &NULL_INT,
        SqlValue::Int(v) => v,
        SqlValue::Text(v) => v,
        SqlValue::Decimal(v) => v,
        SqlValue::Date(v) => v,
    }
}

/// Reads an integer of any width; `int` columns come back as `i32`.
fn int_column(row: &tiberius::Row, index: usize) -> DbResult<Option<i64>> {
    if let Ok(value) = row.try_get::<i32, _>(index) {
        return Ok(value.map(i64::from));
    }
    if let Ok(value) = row.try_get::<i16, _>(index) {
        return Ok(value.map(i64::from));
    }
    if let Ok(value) = row.try_get::<u8, _>(index) {
        return Ok(value.map(i64::from));
    }
    Ok(row.try_get::<i64, _>(index)?)
}

fn decode_row(row: &tiberius::Row, columns: &[ColumnKind]) -> DbResult<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(index, kind)| -> DbResult<SqlValue> {
            let value = match kind {
                ColumnKind::Int => int_column(row, index)?.map(SqlValue::Int),
                ColumnKind::Text => row
                    .try_get::<&str, _>(index)?
                    .map(|v| SqlValue::Text(v.to_string())),
                ColumnKind::Decimal => row.try_get::<Decimal, _>(index)?.map(SqlValue::Decimal),
                ColumnKind::Date => row.try_get::<NaiveDate, _>(index)?.map(SqlValue::Date),
            };
            Ok(value.unwrap_or(SqlValue::Null))
        })
        .collect::<DbResult<Vec<_>>>()
        .map(Row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ServerAddress;

    fn backend(server: &str, database: &str) -> MsSqlBackend {
        MsSqlBackend::new(ConnectSettings {
            address: ServerAddress::parse(server, 1433).unwrap(),
            database: database.to_string(),
            username: "sa".to_string(),
            password: "secret".to_string(),
        })
    }

    #[test]
    fn test_config_address() {
        let config = backend("10.0.0.9,1444", "receipts").config();
        assert_eq!(config.get_addr(), "10.0.0.9:1444");
    }

    #[test]
    fn test_default_port() {
        let config = backend("sqlbox", "").config();
        assert_eq!(config.get_addr(), "sqlbox:1433");
    }

    #[test]
    fn test_params_keep_order() {
        let values = [SqlValue::from("Produce"), SqlValue::Int(42)];
        let params: Vec<&dyn ToSql> = values.iter().map(to_sql).collect();
        assert_eq!(params.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_failure() {
        let err = backend("127.0.0.1:1", "receipts").open().await.err().unwrap();
        assert!(matches!(err, DbError::ConnectionFailed(_)));
    }
}
