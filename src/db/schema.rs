//! Table descriptions handed to the LLM.
//!
//! Each description carries the table's DDL plus a handful of sample rows,
//! which is what the model needs to write correct queries against it.

use super::Row;
use serde_json::Value;

/// Number of sample rows included in a table description.
pub const SAMPLE_ROWS: usize = 3;

/// Schema information for a single table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    /// Table name.
    pub name: String,

    /// The `CREATE TABLE` statement reported by the server.
    pub create_statement: String,

    /// Column names in declaration order.
    pub columns: Vec<String>,

    /// Up to [`SAMPLE_ROWS`] rows from the table.
    pub sample_rows: Vec<Row>,
}

impl TableInfo {
    /// Creates a table description without sample rows.
    pub fn new(name: impl Into<String>, create_statement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            create_statement: create_statement.into(),
            columns: Vec::new(),
            sample_rows: Vec::new(),
        }
    }

    /// Sets the column names.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sample rows.
    pub fn with_sample_rows(mut self, rows: Vec<Row>) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Formats the table for an `info-sql` observation.
    pub fn format_for_llm(&self) -> String {
        let mut out = self.create_statement.trim_end().to_string();
        out.push_str("\n\n/*\n");
        out.push_str(&format!(
            "{} rows from {} table:\n",
            self.sample_rows.len(),
            self.name
        ));

        let columns: Vec<String> = if self.columns.is_empty() {
            self.sample_rows
                .first()
                .map(|r| r.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            self.columns.clone()
        };

        out.push_str(&columns.join("\t"));
        out.push('\n');

        for row in &self.sample_rows {
            let cells = columns
                .iter()
                .map(|c| format_cell(row.get(c)))
                .collect::<Vec<_>>();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }

        out.push_str("*/");
        out
    }
}

/// Formats several tables, separated by blank lines.
pub fn format_tables_for_llm(tables: &[TableInfo]) -> String {
    tables
        .iter()
        .map(TableInfo::format_for_llm)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
