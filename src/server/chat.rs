//! The `POST /api/chat` handler and its response envelope.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::agent::{classify_steps, last_sql_execution};
use crate::config::ConnectionConfig;
use crate::db::{DatabaseClient, Row};
use crate::error::Result;

use super::AppState;

/// Returned in `error` whenever the agent run or its trace fails.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Try again with a different prompt.";
/// 500 body when no connection string is configured.
pub const MISSING_DATABASE_URL: &str = "Internal server error: DATABASE_URL is not defined.";
/// 500 body when the connection string cannot be parsed.
pub const INVALID_DATABASE_URL: &str = "Internal server error: DATABASE_URL is invalid.";
/// 500 body when the database cannot be reached.
pub const CONNECTION_FAILED: &str = "Internal server error: could not connect to the database.";

/// Request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub query: String,
}

/// Response envelope for every request that reached the agent stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub prompt: String,
    pub sql_query: String,
    pub result: Vec<Row>,
    pub error: String,
}

impl ChatResponse {
    fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Body of a 500 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn internal_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Answers one question against a fresh database connection.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let prompt = request.query;
    info!(prompt = %prompt, "Chat request");

    let Some(url) = state.config.database_url.as_deref() else {
        error!("DATABASE_URL is not defined");
        return internal_error(MISSING_DATABASE_URL);
    };

    let connection = match ConnectionConfig::from_connection_string(url) {
        Ok(connection) => connection,
        Err(e) => {
            error!(error = %e, "DATABASE_URL could not be parsed");
            return internal_error(INVALID_DATABASE_URL);
        }
    };

    let db = match state.connector.connect(&connection).await {
        Ok(db) => db,
        Err(e) => {
            error!(
                database = %connection.display_string(),
                error = %e,
                "Database connection failed"
            );
            return internal_error(CONNECTION_FAILED);
        }
    };

    let mut response = ChatResponse::new(prompt.as_str());
    match answer(&state, Arc::clone(&db), &prompt).await {
        Ok(Some((sql_query, rows))) => {
            response.sql_query = sql_query;
            response.result = rows;
        }
        Ok(None) => debug!("Agent did not execute any SQL"),
        Err(e) => {
            error!(category = e.category(), error = %e, "Chat request failed");
            response.error = SERVER_ERROR_MESSAGE.to_string();
        }
    }

    if let Err(e) = db.close().await {
        warn!(error = %e, "Failed to close database connection");
    }

    (StatusCode::OK, Json(response)).into_response()
}

/// Runs the agent and returns the last executed query with its rows.
async fn answer(
    state: &AppState,
    db: Arc<dyn DatabaseClient>,
    prompt: &str,
) -> Result<Option<(String, Vec<Row>)>> {
    let agent = state.agents.build(db);
    let output = agent.run(prompt).await?;

    debug!(
        output = %output.output,
        steps = ?output.intermediate_steps,
        "Agent trace"
    );

    let steps = classify_steps(&output.intermediate_steps)?;
    Ok(last_sql_execution(&steps).map(|(query, rows)| (query.to_string(), rows.to_vec())))
}
