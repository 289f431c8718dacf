//! Command-line argument parsing for db-chat.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Ask a MySQL database questions in plain English over HTTP.
#[derive(Parser, Debug)]
#[command(name = "db-chat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on (e.g., 0.0.0.0:3000)
    #[arg(short = 'b', long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "DB_CHAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// LLM provider: openai or mock
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Model name passed to the LLM provider
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line overrides, which take precedence over the file
    /// and the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(llm) = &self.llm {
            config.llm.provider = llm.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
    }
}
