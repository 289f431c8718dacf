//! Mock database clients for testing.
//!
//! Provides an in-memory database with canned tables and query results, plus
//! connectors that hand it out (or refuse to) so request handling can be
//! exercised without a MySQL server.

use super::{DatabaseClient, DatabaseConnector, QueryResult, Row, TableInfo};
use crate::config::ConnectionConfig;
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A mock database client that returns predefined results.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    tables: Vec<TableInfo>,
    results: HashMap<String, std::result::Result<Vec<Row>, String>>,
    executed: Mutex<Vec<String>>,
    close_count: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    pub fn with_table(mut self, table: TableInfo) -> Self {
        self.tables.push(table);
        self
    }

    /// Registers the rows returned for an exact SQL string.
    pub fn with_result(mut self, sql: impl Into<String>, rows: Vec<Row>) -> Self {
        self.results.insert(normalize(&sql.into()), Ok(rows));
        self
    }

    /// Registers an error returned for an exact SQL string.
    pub fn with_query_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        self.results
            .insert(normalize(&sql.into()), Err(message.into()));
        self
    }

    /// Returns the number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Returns every SQL string passed to `execute_query`, in order.
    pub fn executed_queries(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim().to_string()
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_tables(&self, tables: &[String]) -> Result<Vec<TableInfo>> {
        tables
            .iter()
            .map(|name| {
                self.tables
                    .iter()
                    .find(|t| t.name.eq_ignore_ascii_case(name))
                    .cloned()
                    .ok_or_else(|| ChatError::query(format!("Unknown table(s): {name}")))
            })
            .collect()
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        match self.results.get(&normalize(sql)) {
            Some(Ok(rows)) => Ok(QueryResult::from_rows(rows.clone())),
            Some(Err(message)) => Err(ChatError::query(message.clone())),
            None => Err(ChatError::query(format!(
                "ERROR 1064 (42000): no mock result registered for: {sql}"
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector that always hands out the same mock client.
#[derive(Debug)]
pub struct MockConnector {
    client: Arc<MockDatabaseClient>,
    connects: AtomicUsize,
}

impl MockConnector {
    /// Creates a connector for the given client.
    pub fn new(client: MockDatabaseClient) -> Self {
        Self {
            client: Arc::new(client),
            connects: AtomicUsize::new(0),
        }
    }

    /// Returns the client handed out by this connector.
    pub fn client(&self) -> Arc<MockDatabaseClient> {
        Arc::clone(&self.client)
    }

    /// Returns how many connections were opened.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseConnector for MockConnector {
    async fn connect(&self, _config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.client.clone())
    }
}

/// Connector whose connection attempts always fail.
#[derive(Debug, Default)]
pub struct FailingConnector {
    attempts: AtomicUsize,
}

impl FailingConnector {
    /// Creates a new failing connector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many connections were attempted.
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseConnector for FailingConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ChatError::connection(format!(
            "Cannot connect to {}:{}. Check that the server is running.",
            config.host, config.port
        )))
    }
}
