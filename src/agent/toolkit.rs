//! SQL toolkit exposed to the agent.
//!
//! Every tool takes a single string `input` and returns a string observation.
//! Tool failures are reported to the model as observations starting with
//! `Error: ` so it can correct itself on the next turn.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, warn};

use crate::db::{format_tables_for_llm, DatabaseClient};
use crate::error::Result;
use crate::llm::{strip_sql_fences, LlmClient, Message, ToolDefinition};

use super::prompt::query_checker_prompt;

/// Executes a query and returns its rows as JSON.
pub const QUERY_SQL: &str = "query-sql";
/// Describes tables.
pub const INFO_SQL: &str = "info-sql";
/// Lists tables.
pub const LIST_TABLES_SQL: &str = "list-tables-sql";
/// Reviews a query with the model.
pub const QUERY_CHECKER: &str = "query-checker";

/// Database tools bound to one connection.
pub struct SqlToolkit {
    db: Arc<dyn DatabaseClient>,
    llm: Arc<dyn LlmClient>,
    dialect: String,
}

impl SqlToolkit {
    /// Creates a toolkit over `db`; `llm` backs the query checker.
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        llm: Arc<dyn LlmClient>,
        dialect: impl Into<String>,
    ) -> Self {
        Self {
            db,
            llm,
            dialect: dialect.into(),
        }
    }

    /// Returns the tool definitions sent to the model.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        vec![
            single_input_tool(
                QUERY_SQL,
                "Input to this tool is a detailed and correct SQL query, output is a result \
                 from the database as a JSON array of rows. If the query is not correct, an \
                 error message will be returned. If an error is returned, rewrite the query, \
                 check the query, and try again.",
                "A single SQL query",
            ),
            single_input_tool(
                INFO_SQL,
                "Input to this tool is a comma-separated list of tables, output is the schema \
                 and sample rows for those tables. Be sure that the tables actually exist by \
                 calling list-tables-sql first! Example Input: \"table1, table2, table3\".",
                "Comma-separated table names",
            ),
            single_input_tool(
                LIST_TABLES_SQL,
                "Input is an empty string, output is a comma-separated list of tables in the \
                 database.",
                "An empty string",
            ),
            single_input_tool(
                QUERY_CHECKER,
                "Use this tool to double check if your query is correct before executing it. \
                 Always use this tool before executing a query with query-sql!",
                "The SQL query to check",
            ),
        ]
    }

    /// Extracts the tool input from a call's JSON arguments.
    ///
    /// Arguments that are not a JSON object with a string `input` are used
    /// verbatim. SQL inputs lose their markdown fences.
    pub fn prepare_input(tool: &str, arguments: &str) -> String {
        let raw = serde_json::from_str::<serde_json::Value>(arguments)
            .ok()
            .and_then(|v| v.get("input").and_then(|i| i.as_str()).map(String::from))
            .unwrap_or_else(|| arguments.to_string());

        match tool {
            QUERY_SQL | QUERY_CHECKER => strip_sql_fences(&raw),
            _ => raw.trim().to_string(),
        }
    }

    /// Runs a tool and returns its observation.
    pub async fn run(&self, tool: &str, input: &str) -> String {
        let start = Instant::now();
        debug!(tool_name = tool, input_len = input.len(), "Executing tool");

        let result = match tool {
            QUERY_SQL => self.query_sql(input).await,
            INFO_SQL => self.info_sql(input).await,
            LIST_TABLES_SQL => self.list_tables().await,
            QUERY_CHECKER => self.query_checker(input).await,
            _ => {
                warn!(tool_name = tool, "Unknown tool requested");
                Ok(format!(
                    "Error: {tool} is not a valid tool, try one of [{}].",
                    [QUERY_SQL, INFO_SQL, LIST_TABLES_SQL, QUERY_CHECKER].join(", ")
                ))
            }
        };

        let observation = result.unwrap_or_else(|e| {
            debug!(tool_name = tool, error = %e, "Tool failed");
            format!("Error: {e}")
        });

        debug!(
            tool_name = tool,
            duration_ms = start.elapsed().as_millis(),
            result_len = observation.len(),
            "Tool execution complete"
        );

        observation
    }

    async fn query_sql(&self, sql: &str) -> Result<String> {
        let result = self.db.execute_query(sql).await?;
        result.rows_json()
    }

    async fn info_sql(&self, input: &str) -> Result<String> {
        let tables: Vec<String> = input
            .split(',')
            .map(|t| t.trim().trim_matches('`').to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let infos = self.db.describe_tables(&tables).await?;
        Ok(format_tables_for_llm(&infos))
    }

    async fn list_tables(&self) -> Result<String> {
        Ok(self.db.list_tables().await?.join(", "))
    }

    async fn query_checker(&self, sql: &str) -> Result<String> {
        let prompt = query_checker_prompt(&self.dialect, sql);
        let reply = self.llm.complete(&[Message::user(prompt)]).await?;
        Ok(strip_sql_fences(&reply))
    }
}

fn single_input_tool(name: &str, description: &str, input_description: &str) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "input": {
                    "type": "string",
                    "description": input_description
                }
            },
            "required": ["input"]
        }),
    }
}
