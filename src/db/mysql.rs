//! MySQL/MariaDB database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the `DatabaseClient` trait
//! using sqlx. Each client owns a single-connection pool that lives for one
//! HTTP request.

use crate::config::ConnectionConfig;
use crate::db::{
    ColumnInfo, DatabaseClient, DatabaseConnector, QueryResult, Row, TableInfo, SAMPLE_ROWS,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Maximum rows to return from a query.
const MAX_ROWS: usize = 1000;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Opens [`MySqlClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

#[async_trait]
impl DatabaseConnector for MySqlConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        let client = MySqlClient::connect(config).await?;
        Ok(Arc::new(client))
    }
}

/// MySQL database client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Connects with the given parameters, retrying transient failures.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let mut last_error = None;
        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);

        for attempt in 1..=MAX_RETRY_ATTEMPTS {
            debug!("Connection attempt {} of {}", attempt, MAX_RETRY_ATTEMPTS);

            let result = MySqlPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Duration::from_secs(5))
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    debug!(target_db = %config.display_string(), "Connected to database");
                    return Ok(Self { pool });
                }
                Err(e) => {
                    let is_transient = is_transient_error(&e);
                    last_error = Some(e);

                    if attempt < MAX_RETRY_ATTEMPTS && is_transient {
                        warn!(
                            "Connection attempt {} failed (transient error), retrying in {:?}",
                            attempt, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2; // Exponential backoff
                    } else {
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(map_connection_error(e, config)),
            None => Err(ChatError::connection("No connection attempt was made")),
        }
    }

    async fn fetch_create_statement(&self, table: &str) -> Result<String> {
        let sql = format!("SHOW CREATE TABLE {}", quote_identifier(table));
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ChatError::query(format_query_error(e)))?;

        Ok(decode_text(&row, 1).unwrap_or_default())
    }

    async fn fetch_sample_rows(&self, table: &str) -> Result<(Vec<String>, Vec<Row>)> {
        let sql = format!(
            "SELECT * FROM {} LIMIT {}",
            quote_identifier(table),
            SAMPLE_ROWS
        );
        let result = self.execute_query(&sql).await?;
        let columns = result.columns.into_iter().map(|c| c.name).collect();
        Ok((columns, result.rows))
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT CAST(table_name AS CHAR)
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to list tables: {e}")))
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableInfo>> {
        let known = self.list_tables().await?;
        let unknown: Vec<&str> = tables
            .iter()
            .filter(|t| !known.iter().any(|k| k.eq_ignore_ascii_case(t)))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(ChatError::query(format!(
                "Unknown table(s): {}",
                unknown.join(", ")
            )));
        }

        let mut infos = Vec::with_capacity(tables.len());
        for table in tables {
            let create_statement = self.fetch_create_statement(table).await?;
            let (columns, sample_rows) = self.fetch_sample_rows(table).await?;
            infos.push(
                TableInfo::new(table.as_str(), create_statement)
                    .with_columns(columns)
                    .with_sample_rows(sample_rows),
            );
        }

        Ok(infos)
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ChatError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| ChatError::query(format_query_error(e)))?;

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|first_row| {
                first_row
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        if result.len() > MAX_ROWS {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                result.len(),
                MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();
        debug!(
            rows = rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(QueryResult::with_data(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Quotes a MySQL identifier with backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Converts a sqlx MySqlRow to a JSON row object.
fn convert_row(row: &MySqlRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| {
            (
                col.name().to_string(),
                convert_value(row, i, col.type_info().name()),
            )
        })
        .collect()
}

/// Converts a single column value from a MySqlRow to JSON.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str) -> Value {
    let type_name = type_name.to_uppercase();

    match type_name.as_str() {
        "NULL" => Value::Null,

        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        // Sent as a two-byte integer, which the signed decoders refuse
        "YEAR" => row
            .try_get_unchecked::<Option<u16>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        t if t.ends_with("UNSIGNED") => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::from(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::from)
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_rfc3339()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<chrono::NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%H:%M:%S").to_string()))
            .unwrap_or(Value::Null),

        "JSON" => row
            .try_get::<Option<Value>, _>(index)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),

        // DECIMAL, text, enum, binary and anything else
        _ => decode_text(row, index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

/// Decodes a column as text, falling back to lossy UTF-8 for binary data.
fn decode_text(row: &MySqlRow, index: usize) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value;
    }
    if let Ok(value) = row.try_get_unchecked::<Option<String>, _>(index) {
        return value;
    }
    row.try_get_unchecked::<Option<Vec<u8>>, _>(index)
        .ok()
        .flatten()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Determines if an error is transient and worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    let error_str = error.to_string().to_lowercase();

    // Authentication and unknown-database errors are never transient
    if error_str.contains("access denied") || error_str.contains("unknown database") {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("timeout")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
        || error_str.contains("too many connections")
}

/// Maps sqlx connection errors to readable messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ChatError {
    let host = &config.host;
    let port = config.port;
    let user = &config.user;
    let database = &config.database;

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        ChatError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("access denied") {
        ChatError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("unknown database") {
        ChatError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ChatError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ChatError::connection(error.to_string())
    }
}

/// Formats a query error the way the mysql client prints it.
fn format_query_error(error: sqlx::Error) -> String {
    if let Some(db_error) = error.as_database_error() {
        if let Some(my_error) = db_error.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
            return match my_error.code() {
                Some(state) => format!(
                    "ERROR {} ({}): {}",
                    my_error.number(),
                    state,
                    my_error.message()
                ),
                None => format!("ERROR {}: {}", my_error.number(), my_error.message()),
            };
        }
        return format!("ERROR: {}", db_error.message());
    }

    error.to_string()
}
