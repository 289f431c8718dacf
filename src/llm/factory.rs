//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{ChatError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates the LLM client described by `config`.
///
/// A missing OpenAI key is not an error here: the client is built anyway and
/// each request fails with an LLM error, so the service still starts and
/// answers with its usual error envelope.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider: LlmProvider = config.provider.parse().map_err(ChatError::config)?;

    match provider {
        LlmProvider::OpenAi => {
            if config.api_key.is_none() {
                tracing::warn!("OPENAI_API_KEY is not set; LLM requests will fail");
            }
            let client = OpenAiClient::new(OpenAiConfig::from_llm_config(config))?;
            Ok(Arc::new(client))
        }
        LlmProvider::Mock => Ok(Arc::new(MockLlmClient::new())),
    }
}
