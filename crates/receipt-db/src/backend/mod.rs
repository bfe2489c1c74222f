//! # Backends
//!
//! One [`Backend`] implementation per supported database engine.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Settings.dbMode ──► DbMode::from_str ──► connect() ──► Arc<dyn Backend>│
//! │                                                                         │
//! │  Repository call                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  backend.open()  ──► Box<dyn Session>   (fresh connection)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.execute / fetch / execute_script   (autocommit)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.close()                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements are written once with `?` placeholders. Each backend binds
//! them natively: MySQL keeps `?`, SQL Server rewrites to `@P1..@Pn`.
//!
//! There is no pool. Every repository call opens its own session and
//! closes it before returning.

pub mod mssql;
pub mod mysql;

#[cfg(test)]
pub(crate) mod scripted;
#[cfg(test)]
pub(crate) mod sqlite;

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use receipt_core::Settings;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{DbError, DbResult};

pub use mssql::MsSqlBackend;
pub use mysql::MySqlBackend;

// =============================================================================
// Mode
// =============================================================================

/// Which relational engine the data layer targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbMode {
    MsSql,
    MySql,
}

impl DbMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DbMode::MsSql => "mssql",
            DbMode::MySql => "mysql",
        }
    }

    /// Port used when `sqlServerIP` names only a host.
    pub const fn default_port(&self) -> u16 {
        match self {
            DbMode::MsSql => 1433,
            DbMode::MySql => 3306,
        }
    }
}

impl fmt::Display for DbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mssql" => Ok(DbMode::MsSql),
            "mysql" => Ok(DbMode::MySql),
            other => Err(DbError::UnsupportedMode(other.to_string())),
        }
    }
}

// =============================================================================
// Values & Rows
// =============================================================================

/// A bound parameter or a decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

/// Expected type of a selected column. Backends decode against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Text,
    Decimal,
    Date,
}

/// A fetched row, one value per requested column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row(pub Vec<SqlValue>);

impl Row {
    /// Integer column; NULL is a decode error.
    pub fn int(&self, column: usize) -> DbResult<i64> {
        match self.value(column)? {
            SqlValue::Int(v) => Ok(*v),
            other => Err(unexpected(column, "integer", other)),
        }
    }

    /// Nullable integer column.
    pub fn opt_int(&self, column: usize) -> DbResult<Option<i64>> {
        match self.value(column)? {
            SqlValue::Int(v) => Ok(Some(*v)),
            SqlValue::Null => Ok(None),
            other => Err(unexpected(column, "integer", other)),
        }
    }

    /// Text column; NULL reads as an empty string.
    pub fn text(&self, column: usize) -> DbResult<String> {
        match self.value(column)? {
            SqlValue::Text(v) => Ok(v.clone()),
            SqlValue::Null => Ok(String::new()),
            other => Err(unexpected(column, "text", other)),
        }
    }

    pub fn decimal(&self, column: usize) -> DbResult<Decimal> {
        match self.value(column)? {
            SqlValue::Decimal(v) => Ok(*v),
            SqlValue::Int(v) => Ok(Decimal::from(*v)),
            other => Err(unexpected(column, "decimal", other)),
        }
    }

    pub fn date(&self, column: usize) -> DbResult<NaiveDate> {
        match self.value(column)? {
            SqlValue::Date(v) => Ok(*v),
            other => Err(unexpected(column, "date", other)),
        }
    }

    fn value(&self, column: usize) -> DbResult<&SqlValue> {
        self.0.get(column).ok_or_else(|| DbError::Decode {
            column,
            reason: format!("row has only {} columns", self.0.len()),
        })
    }
}

fn unexpected(column: usize, wanted: &str, got: &SqlValue) -> DbError {
    DbError::Decode {
        column,
        reason: format!("expected {wanted}, got {got:?}"),
    }
}

// =============================================================================
// Traits
// =============================================================================

/// A database engine that can hand out sessions.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Dialect this backend speaks. Selects the schema script.
    fn mode(&self) -> DbMode;

    /// Opens a fresh connection.
    async fn open(&self) -> DbResult<Box<dyn Session>>;
}

/// One open connection. Every statement autocommits.
#[async_trait]
pub trait Session: Send {
    /// Runs a `?`-parameterised statement and returns the affected row count.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64>;

    /// Runs a `?`-parameterised query, decoding each column as `columns`.
    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        columns: &[ColumnKind],
    ) -> DbResult<Vec<Row>>;

    /// Runs unparameterised SQL as sent (DDL, multi-statement batches).
    async fn execute_script(&mut self, sql: &str) -> DbResult<()>;

    /// Closes the connection.
    async fn close(self: Box<Self>) -> DbResult<()>;
}

// =============================================================================
// Connection Settings
// =============================================================================

/// Host part of `sqlServerIP`, split into its pieces.
///
/// Accepted forms: `host`, `host:port`, `host,port` (ODBC style),
/// `host\INSTANCE` (SQL Server named instance), a bare IPv6 literal and
/// `[v6]:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
    pub instance: Option<String>,
}

impl ServerAddress {
    fn host(host: &str, port: u16) -> Self {
        ServerAddress {
            host: host.to_string(),
            port,
            instance: None,
        }
    }

    pub fn parse(raw: &str, default_port: u16) -> DbResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DbError::Misconfigured("sqlServerIP is empty".to_string()));
        }

        if let Some((host, instance)) = raw.split_once('\\') {
            return Ok(ServerAddress {
                host: host.to_string(),
                port: default_port,
                instance: Some(instance.to_string()),
            });
        }

        // bare IPv6 literals contain colons but no port
        if raw.parse::<IpAddr>().is_ok() {
            return Ok(ServerAddress::host(raw, default_port));
        }

        if let Some(rest) = raw.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                DbError::Misconfigured(format!("unclosed '[' in sqlServerIP '{raw}'"))
            })?;
            let port = match tail.strip_prefix(':').or_else(|| tail.strip_prefix(',')) {
                Some(port) => parse_port(port, raw)?,
                None if tail.is_empty() => default_port,
                None => {
                    return Err(DbError::Misconfigured(format!(
                        "unexpected text after ']' in sqlServerIP '{raw}'"
                    )))
                }
            };
            return Ok(ServerAddress::host(host, port));
        }

        match raw.split_once(',').or_else(|| raw.split_once(':')) {
            Some((host, port)) => Ok(ServerAddress::host(host.trim(), parse_port(port, raw)?)),
            None => Ok(ServerAddress::host(raw, default_port)),
        }
    }
}

fn parse_port(port: &str, raw: &str) -> DbResult<u16> {
    port.trim()
        .parse::<u16>()
        .map_err(|_| DbError::Misconfigured(format!("invalid port in sqlServerIP '{raw}'")))
}

/// Credentials and target database, shared by both backends.
#[derive(Clone)]
pub struct ConnectSettings {
    pub address: ServerAddress,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectSettings {
    pub fn from_settings(settings: &Settings, mode: DbMode) -> DbResult<Self> {
        Ok(ConnectSettings {
            address: ServerAddress::parse(&settings.sql_server_ip, mode.default_port())?,
            database: settings.sql_database.clone(),
            username: settings.sql_username.clone(),
            password: settings.sql_password.clone(),
        })
    }
}

impl fmt::Debug for ConnectSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectSettings")
            .field("address", &self.address)
            .field("database", &self.database)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Builds the backend selected by `settings.db_mode`.
///
/// No connection is made here; the first repository call connects.
pub fn connect(settings: &Settings) -> DbResult<Arc<dyn Backend>> {
    let mode: DbMode = settings.db_mode.parse()?;
    let connect = ConnectSettings::from_settings(settings, mode)?;

    info!(
        mode = %mode,
        host = %connect.address.host,
        port = connect.address.port,
        database = %connect.database,
        "Database backend selected"
    );

    Ok(match mode {
        DbMode::MySql => Arc::new(MySqlBackend::new(connect)),
        DbMode::MsSql => Arc::new(MsSqlBackend::new(connect)),
    })
}
