//! Query result types for db-chat.
//!
//! Rows are JSON objects keyed by column name, which is the shape both the
//! agent observations and the HTTP envelope use.

use serde_json::{Map, Value};

use crate::error::{ChatError, Result};

/// A row of data: column name to JSON value.
pub type Row = Map<String, Value>;

/// Represents the result of executing a SQL query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,

    /// Number of rows kept after the row cap.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Builds a result from JSON row objects, deriving column names from the first row.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().map(|k| ColumnInfo::new(k, "")).collect())
            .unwrap_or_default();
        Self::with_data(columns, rows)
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the rows as a JSON array of objects.
    pub fn rows_json(&self) -> Result<String> {
        serde_json::to_string(&self.rows)
            .map_err(|e| ChatError::internal(format!("Failed to serialize rows: {e}")))
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Parses a JSON array of row objects, e.g. a `query-sql` observation.
pub fn parse_rows(text: &str) -> Result<Vec<Row>> {
    serde_json::from_str::<Vec<Row>>(text)
        .map_err(|e| ChatError::agent(format!("Tool output is not a JSON array of rows: {e}")))
}
