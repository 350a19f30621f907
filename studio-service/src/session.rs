//! 数据库会话
//!
//! A session is one open MySQL connection used for one logical operation and
//! closed afterwards. Nothing is pooled. [`SessionResolver`] turns a
//! connection string into a session and swallows every failure into `None`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo};

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{CellValue, RawColumn, RowRecord};
use common::utils::{database_name_from_uri, quote_identifier, redact_password};

/// An open database session.
#[async_trait]
pub trait DatabaseSession: Send {
    /// Database the session is bound to.
    fn database_name(&self) -> &str;

    /// Round-trips to the server.
    async fn ping(&mut self) -> AppResult<()>;

    /// `SHOW TABLES`.
    async fn show_tables(&mut self) -> AppResult<Vec<String>>;

    /// `SELECT COUNT(*)` for one table.
    async fn count_rows(&mut self, table: &str) -> AppResult<u64>;

    /// `SHOW COLUMNS FROM <table>`.
    async fn show_columns(&mut self, table: &str) -> AppResult<Vec<RawColumn>>;

    /// `SELECT * FROM <table>`.
    async fn select_all(&mut self, table: &str) -> AppResult<Vec<RowRecord>>;

    /// Closes the session. Closing twice is a no-op.
    async fn close(&mut self) -> AppResult<()>;
}

/// Opens sessions from connection strings.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn open(&self, connection_string: &str) -> AppResult<Box<dyn DatabaseSession>>;
}

/// Opens MySQL sessions through sqlx.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    connect_timeout: Duration,
    default_database: String,
}

impl MySqlConnector {
    pub fn new(connect_timeout: Duration, default_database: impl Into<String>) -> Self {
        Self {
            connect_timeout,
            default_database: default_database.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.connect_timeout_secs),
            config.default_database.clone(),
        )
    }

    /// Driver options, else the URI path, else the configured default.
    fn database_for(&self, options: &MySqlConnectOptions, connection_string: &str) -> String {
        options
            .get_database()
            .map(str::to_string)
            .or_else(|| database_name_from_uri(connection_string))
            .unwrap_or_else(|| self.default_database.clone())
    }
}

#[async_trait]
impl SessionConnector for MySqlConnector {
    async fn open(&self, connection_string: &str) -> AppResult<Box<dyn DatabaseSession>> {
        let options = MySqlConnectOptions::from_str(connection_string)
            .map_err(|e| AppError::DatabaseConnection(format!("invalid connection string: {e}")))?;
        let database = self.database_for(&options, connection_string);
        let options = if options.get_database().is_none() {
            options.database(&database)
        } else {
            options
        };

        let conn = tokio::time::timeout(self.connect_timeout, MySqlConnection::connect_with(&options))
            .await
            .map_err(|_| {
                AppError::DatabaseConnection(format!(
                    "connect timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::DatabaseConnection(e.to_string()))?;

        tracing::debug!(database = %database, "session opened");
        Ok(Box::new(MySqlSession {
            conn: Some(conn),
            database,
        }))
    }
}

/// A single MySQL connection.
pub struct MySqlSession {
    conn: Option<MySqlConnection>,
    database: String,
}

impl MySqlSession {
    fn conn(&mut self) -> AppResult<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| AppError::Internal("session already closed".into()))
    }
}

fn query_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseQuery(e.to_string())
}

#[async_trait]
impl DatabaseSession for MySqlSession {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn ping(&mut self) -> AppResult<()> {
        self.conn()?.ping().await.map_err(query_error)
    }

    async fn show_tables(&mut self) -> AppResult<Vec<String>> {
        let column = format!("Tables_in_{}", self.database);
        let rows = sqlx::query("SHOW TABLES")
            .fetch_all(&mut *self.conn()?)
            .await
            .map_err(query_error)?;
        Ok(rows
            .iter()
            .filter_map(|row| text_by_name(row, &column).or_else(|| text_at(row, 0)))
            .collect())
    }

    async fn count_rows(&mut self, table: &str) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let row = sqlx::query(&sql)
            .fetch_one(&mut *self.conn()?)
            .await
            .map_err(query_error)?;
        let count: i64 = row.try_get(0).map_err(query_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn show_columns(&mut self, table: &str) -> AppResult<Vec<RawColumn>> {
        let sql = format!("SHOW COLUMNS FROM {}", quote_identifier(table));
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.conn()?)
            .await
            .map_err(query_error)?;
        Ok(rows
            .iter()
            .map(|row| RawColumn {
                field: text_by_name(row, "Field").unwrap_or_default(),
                column_type: text_by_name(row, "Type").unwrap_or_default(),
                null: text_by_name(row, "Null").unwrap_or_default(),
                key: text_by_name(row, "Key").unwrap_or_default(),
                default: text_by_name(row, "Default"),
                extra: text_by_name(row, "Extra").unwrap_or_default(),
            })
            .collect())
    }

    async fn select_all(&mut self, table: &str) -> AppResult<Vec<RowRecord>> {
        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.conn()?)
            .await
            .map_err(query_error)?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn close(&mut self) -> AppResult<()> {
        match self.conn.take() {
            Some(conn) => conn.close().await.map_err(query_error),
            None => Ok(()),
        }
    }
}

/// Metadata columns come back as VARCHAR or, on some servers, as binary
/// strings.
fn text_by_name(row: &MySqlRow, column: &str) -> Option<String> {
    let index = row.columns().iter().position(|c| c.name() == column)?;
    text_at(row, index)
}

fn text_at(row: &MySqlRow, index: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value;
    }
    row.try_get_unchecked::<Option<Vec<u8>>, _>(index)
        .ok()
        .flatten()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_row(row: &MySqlRow) -> RowRecord {
    row.columns()
        .iter()
        .map(|column| {
            let value = decode_cell(row, column.ordinal(), column.type_info().name());
            (column.name().to_string(), value)
        })
        .collect()
}

/// Typed decoder chosen for a column from its MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellDecoder {
    Null,
    Bool,
    Unsigned,
    Signed,
    Float,
    Double,
    DateTime,
    Timestamp,
    Date,
    Time,
    Year,
    Json,
    Bytes,
    Text,
}

impl CellDecoder {
    fn for_type(type_name: &str) -> Self {
        match type_name.to_ascii_uppercase().as_str() {
            "NULL" => Self::Null,
            "BOOLEAN" => Self::Bool,
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => Self::Unsigned,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Self::Signed,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "YEAR" => Self::Year,
            "JSON" => Self::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => Self::Bytes,
            _ => Self::Text,
        }
    }

    fn decode(self, row: &MySqlRow, index: usize) -> Result<CellValue, sqlx::Error> {
        match self {
            Self::Null => Ok(CellValue::Null),
            Self::Bool => row.try_get::<Option<bool>, _>(index).map(CellValue::from),
            Self::Unsigned => row
                .try_get::<Option<u64>, _>(index)
                .map(|value| value.map(unsigned_cell).unwrap_or(CellValue::Null)),
            Self::Signed => row.try_get::<Option<i64>, _>(index).map(CellValue::from),
            Self::Float => row
                .try_get::<Option<f32>, _>(index)
                .map(|value| CellValue::from(value.map(f64::from))),
            Self::Double => row.try_get::<Option<f64>, _>(index).map(CellValue::from),
            Self::DateTime => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)
                .map(|value| CellValue::from(value.map(|v| v.format("%Y-%m-%d %H:%M:%S").to_string()))),
            Self::Timestamp => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
                .map(|value| CellValue::from(value.map(|v| v.format("%Y-%m-%d %H:%M:%S").to_string()))),
            Self::Date => row
                .try_get::<Option<chrono::NaiveDate>, _>(index)
                .map(|value| CellValue::from(value.map(|v| v.to_string()))),
            Self::Time => row
                .try_get::<Option<MySqlTime>, _>(index)
                .map(|value| CellValue::from(value.map(|v| v.to_string()))),
            Self::Year => row
                .try_get_unchecked::<Option<u16>, _>(index)
                .map(|value| CellValue::from(value.map(i64::from))),
            Self::Json => row
                .try_get::<Option<serde_json::Value>, _>(index)
                .map(|value| CellValue::from(value.map(|v| v.to_string()))),
            Self::Bytes => row.try_get::<Option<Vec<u8>>, _>(index).map(CellValue::from),
            Self::Text => row.try_get::<Option<String>, _>(index).map(CellValue::from),
        }
    }
}

/// Decodes one cell by its MySQL type name.
fn decode_cell(row: &MySqlRow, index: usize, type_name: &str) -> CellValue {
    let decoder = CellDecoder::for_type(type_name);
    decoder.decode(row, index).unwrap_or_else(|e| {
        tracing::trace!(column = index, column_type = %type_name, ?decoder, error = %e, "typed decode failed");
        decode_unchecked(row, index)
    })
}

/// DECIMAL and other types without a typed decoder arrive as text on the wire.
fn decode_unchecked(row: &MySqlRow, index: usize) -> CellValue {
    if let Ok(value) = row.try_get_unchecked::<Option<String>, _>(index) {
        return CellValue::from(value);
    }
    match row.try_get_unchecked::<Option<Vec<u8>>, _>(index) {
        Ok(value) => CellValue::from(value),
        Err(e) => {
            tracing::debug!(column = index, error = %e, "cell could not be decoded");
            CellValue::Null
        }
    }
}

fn unsigned_cell(value: u64) -> CellValue {
    i64::try_from(value)
        .map(CellValue::Int)
        .unwrap_or_else(|_| CellValue::Text(value.to_string()))
}

/// Where a connection string comes from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionSource<'a> {
    /// String supplied by the caller.
    pub explicit: Option<&'a str>,
    /// Legacy fallback (the `connection_string` cookie).
    pub fallback: Option<&'a str>,
}

impl<'a> ConnectionSource<'a> {
    pub fn explicit(connection_string: Option<&'a str>) -> Self {
        Self {
            explicit: connection_string,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<&'a str>) -> Self {
        self.fallback = fallback;
        self
    }

    /// First non-blank candidate.
    pub fn pick(&self) -> Option<&'a str> {
        self.explicit
            .filter(|s| !s.trim().is_empty())
            .or(self.fallback.filter(|s| !s.trim().is_empty()))
    }
}

/// Resolves connection sources into open sessions.
#[derive(Clone)]
pub struct SessionResolver {
    connector: Arc<dyn SessionConnector>,
}

impl SessionResolver {
    pub fn new(connector: Arc<dyn SessionConnector>) -> Self {
        Self { connector }
    }

    /// Opens a session, or `None` when there is no usable connection string
    /// or the driver fails.
    pub async fn resolve(&self, source: ConnectionSource<'_>) -> Option<Box<dyn DatabaseSession>> {
        let Some(connection_string) = source.pick() else {
            tracing::debug!("no connection string supplied");
            return None;
        };
        match self.connector.open(connection_string).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    target_uri = %redact_password(connection_string),
                    error = %e,
                    "failed to open database session"
                );
                None
            }
        }
    }
}

/// Closes a session, logging a failed close.
pub async fn release(mut session: Box<dyn DatabaseSession>) {
    if let Err(e) = session.close().await {
        tracing::warn!(database = %session.database_name(), error = %e, "failed to close session");
    }
}
