//! Tool-calling loop driving the SQL agent.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::db::DatabaseClient;
use crate::error::Result;
use crate::llm::{LlmClient, Message};

use super::prompt::PromptTemplate;
use super::toolkit::SqlToolkit;
use super::{AgentAction, AgentOutput, IntermediateStep, SqlAgent};

/// Output reported when the iteration cap is reached.
pub const MAX_ITERATIONS_OUTPUT: &str = "Agent stopped due to max iterations.";

/// Default number of model turns per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Tunables shared by every agent built from one factory.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub prompt: PromptTemplate,
    pub max_iterations: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            prompt: PromptTemplate::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// SQL agent backed by a function-calling model.
///
/// Each turn the model either calls tools, whose observations are fed back,
/// or answers in text, which ends the run.
pub struct SqlToolAgent {
    llm: Arc<dyn LlmClient>,
    toolkit: SqlToolkit,
    options: AgentOptions,
}

impl SqlToolAgent {
    /// Creates an agent over one database connection.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        db: Arc<dyn DatabaseClient>,
        options: AgentOptions,
    ) -> Self {
        let toolkit = SqlToolkit::new(db, Arc::clone(&llm), options.prompt.dialect.clone());
        Self {
            llm,
            toolkit,
            options,
        }
    }
}

#[async_trait]
impl SqlAgent for SqlToolAgent {
    async fn run(&self, input: &str) -> Result<AgentOutput> {
        let start = Instant::now();
        let tools = SqlToolkit::tool_definitions();
        let mut messages = self.options.prompt.build_messages(input);
        let mut intermediate_steps = Vec::new();

        for iteration in 1..=self.options.max_iterations {
            debug!(iteration, message_count = messages.len(), "Agent turn");

            let response = self.llm.complete_with_tools(&messages, &tools).await?;

            if !response.has_tool_calls() {
                info!(
                    iterations = iteration,
                    steps = intermediate_steps.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Agent finished"
                );
                return Ok(AgentOutput {
                    output: response.content.trim().to_string(),
                    intermediate_steps,
                });
            }

            messages.push(Message::assistant_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                let tool_input = SqlToolkit::prepare_input(&call.name, &call.arguments);
                let observation = self.toolkit.run(&call.name, &tool_input).await;

                messages.push(Message::tool_result(&call.id, &observation));
                intermediate_steps.push(IntermediateStep {
                    action: AgentAction {
                        tool: call.name.clone(),
                        tool_input,
                        log: response.content.clone(),
                    },
                    observation,
                });
            }
        }

        warn!(
            max_iterations = self.options.max_iterations,
            steps = intermediate_steps.len(),
            "Agent stopped before producing an answer"
        );

        Ok(AgentOutput {
            output: MAX_ITERATIONS_OUTPUT.to_string(),
            intermediate_steps,
        })
    }
}
