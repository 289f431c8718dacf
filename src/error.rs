//! The `ChatError` enum shared by the database, LLM and agent layers.
//!
//! The chat handler never shows these to callers. It logs them and answers
//! with a fixed message.

use thiserror::Error;

/// Everything that can go wrong while answering one chat request.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Opening the MySQL connection failed: unreachable host, bad credentials.
    #[error("Connection error: {0}")]
    Connection(String),

    /// MySQL rejected or timed out a statement.
    #[error("Query error: {0}")]
    Query(String),

    /// The chat-completions call failed or returned something unusable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// The agent finished but its trace cannot be turned into a response.
    #[error("Agent error: {0}")]
    Agent(String),

    /// Bad config file, missing `DATABASE_URL` or an unparseable connection string.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization failures and other states that should not happen.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    // Constructors, so call sites can pass &str or String
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    pub fn agent(msg: impl Into<String>) -> Self {
        Self::Agent(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Short label used as the `category` field when a request fails.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Agent(_) => "Agent Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result alias for fallible db-chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
