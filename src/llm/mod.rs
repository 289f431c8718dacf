//! LLM integration for db-chat.
//!
//! Provides the client trait the SQL agent talks to, plus the OpenAI and mock
//! implementations.

pub mod factory;
pub mod mock;
pub mod openai;
pub mod parser;
pub mod types;

pub use factory::create_client;
pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, OpenAiConfig};
pub use parser::{extract_sql, strip_sql_fences};
pub use types::{LlmResponse, Message, Role, ToolCall, ToolDefinition};

use async_trait::async_trait;
use std::str::FromStr;

use crate::error::Result;

/// A chat-completion backend.
///
/// One client is shared by every request, so implementations are `Send + Sync`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a plain completion for the given messages.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Generates a completion that may request calls to the given tools.
    async fn complete_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// OpenAI or an OpenAI-compatible endpoint
    #[default]
    OpenAi,
    /// Mock client for local runs and tests (no API key required)
    Mock,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(format!("Unknown LLM provider: {other} (expected openai or mock)")),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!(
            "openai".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAi
        );
        assert_eq!(
            "OpenAI".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAi
        );
        assert_eq!("mock".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_provider_display() {
        assert_eq!(format!("{}", LlmProvider::OpenAi), "openai");
        assert_eq!(LlmProvider::default(), LlmProvider::OpenAi);
    }

    #[tokio::test]
    async fn test_mock_client_implements_trait() {
        let client: Box<dyn LlmClient> = Box::new(MockLlmClient::new().with_text("SELECT 1"));
        let response = client.complete(&[Message::user("hi")]).await.unwrap();
        assert_eq!(response, "SELECT 1");
    }
}
