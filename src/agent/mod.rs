//! SQL agent for db-chat.
//!
//! Turns a natural-language question into tool calls against one database
//! connection and reports every tool call it made.

pub mod executor;
pub mod prompt;
pub mod toolkit;
pub mod trace;

pub use executor::{AgentOptions, SqlToolAgent, DEFAULT_MAX_ITERATIONS, MAX_ITERATIONS_OUTPUT};
pub use prompt::{PromptTemplate, SQL_PREFIX, SQL_SUFFIX};
pub use toolkit::{SqlToolkit, INFO_SQL, LIST_TABLES_SQL, QUERY_CHECKER, QUERY_SQL};
pub use trace::{classify_steps, last_sql_execution, TraceStep};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::AgentConfig;
use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::LlmClient;

/// A tool invocation chosen by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Text the model produced alongside the call.
    pub log: String,
}

/// One tool call and what it returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntermediateStep {
    pub action: AgentAction,
    pub observation: String,
}

/// Result of an agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutput {
    pub output: String,
    pub intermediate_steps: Vec<IntermediateStep>,
}

/// Answers one question.
#[async_trait]
pub trait SqlAgent: Send + Sync {
    async fn run(&self, input: &str) -> Result<AgentOutput>;
}

/// Builds an agent bound to a freshly opened connection.
pub trait AgentFactory: Send + Sync {
    fn build(&self, db: Arc<dyn DatabaseClient>) -> Box<dyn SqlAgent>;
}

/// Factory for [`SqlToolAgent`]s sharing one LLM client.
pub struct SqlAgentFactory {
    llm: Arc<dyn LlmClient>,
    options: AgentOptions,
}

impl SqlAgentFactory {
    pub fn new(llm: Arc<dyn LlmClient>, options: AgentOptions) -> Self {
        Self { llm, options }
    }

    /// Creates a factory using the limits from `config`.
    pub fn from_config(llm: Arc<dyn LlmClient>, config: &AgentConfig) -> Self {
        let options = AgentOptions {
            prompt: PromptTemplate::default().with_top_k(config.top_k),
            max_iterations: config.max_iterations,
        };
        Self::new(llm, options)
    }
}

impl AgentFactory for SqlAgentFactory {
    fn build(&self, db: Arc<dyn DatabaseClient>) -> Box<dyn SqlAgent> {
        Box::new(SqlToolAgent::new(
            Arc::clone(&self.llm),
            db,
            self.options.clone(),
        ))
    }
}
