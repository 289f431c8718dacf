//! Typed view over an agent's intermediate steps.
//!
//! Steps that ran `query-sql` carry the executed SQL and its rows; every
//! other step is kept for logging only.

use serde::Serialize;

use crate::db::{parse_rows, Row};
use crate::error::{ChatError, Result};

use super::toolkit::QUERY_SQL;
use super::IntermediateStep;

/// A classified intermediate step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceStep {
    /// A `query-sql` call whose observation parsed as rows.
    SqlExecution { query: String, rows: Vec<Row> },
    /// Any other tool call.
    Other {
        tool: String,
        input: String,
        observation: String,
    },
}

impl TraceStep {
    /// Classifies one step.
    ///
    /// A `query-sql` observation that is not a JSON array of rows is an agent
    /// error; this includes `Error: ` observations from failed queries.
    pub fn from_step(step: &IntermediateStep) -> Result<Self> {
        if step.action.tool == QUERY_SQL {
            let rows = parse_rows(&step.observation).map_err(|e| {
                ChatError::agent(format!(
                    "query-sql step for `{}` did not produce rows: {e}",
                    step.action.tool_input
                ))
            })?;
            return Ok(Self::SqlExecution {
                query: step.action.tool_input.clone(),
                rows,
            });
        }

        Ok(Self::Other {
            tool: step.action.tool.clone(),
            input: step.action.tool_input.clone(),
            observation: step.observation.clone(),
        })
    }
}

/// Classifies every step in order, failing on the first malformed one.
pub fn classify_steps(steps: &[IntermediateStep]) -> Result<Vec<TraceStep>> {
    steps.iter().map(TraceStep::from_step).collect()
}

/// Returns the query and rows of the last SQL execution, if any.
pub fn last_sql_execution(steps: &[TraceStep]) -> Option<(&str, &[Row])> {
    steps.iter().rev().find_map(|step| match step {
        TraceStep::SqlExecution { query, rows } => Some((query.as_str(), rows.as_slice())),
        TraceStep::Other { .. } => None,
    })
}
