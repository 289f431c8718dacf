//! Database abstraction layer for db-chat.
//!
//! Provides a trait-based interface for the operations the SQL agent needs,
//! so the MySQL backend and the in-memory mocks are interchangeable.

mod mock;
mod mysql;
mod schema;
mod types;

pub use mock::{FailingConnector, MockConnector, MockDatabaseClient};
pub use mysql::{MySqlClient, MySqlConnector};
pub use schema::{format_tables_for_llm, TableInfo, SAMPLE_ROWS};
pub use types::{parse_rows, ColumnInfo, QueryResult, Row};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ChatError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Lists the names of the tables in the connected database.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Describes the named tables (DDL plus sample rows).
    ///
    /// Fails if any of the names is not a table of the connected database.
    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableInfo>>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Opens database connections from parsed connection parameters.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Opens a new connection. Each call yields an independent client.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>>;
}
