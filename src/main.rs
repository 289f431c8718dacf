//! db-chat - ask a MySQL database questions in plain English.

use std::sync::Arc;

use anyhow::Context;
use db_chat::agent::SqlAgentFactory;
use db_chat::cli::Cli;
use db_chat::config::Config;
use db_chat::db::MySqlConnector;
use db_chat::server::{self, AppState};
use db_chat::{llm, logging};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    // Precedence: CLI arguments, then environment, then config file
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env();
    cli.apply_overrides(&mut config);

    if config.database_url.is_none() {
        warn!("DATABASE_URL is not set; chat requests will fail until it is");
    }

    let llm = llm::create_client(&config.llm)?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "LLM client ready");

    let agents = Arc::new(SqlAgentFactory::from_config(llm, &config.agent));
    let listener = TcpListener::bind(config.server.bind.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;

    let state = Arc::new(AppState::new(config, Arc::new(MySqlConnector), agents));
    server::serve(listener, state, server::shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}
