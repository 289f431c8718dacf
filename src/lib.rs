//! db-chat - ask a MySQL database questions in plain English.
//!
//! This library exposes the core modules for use by the binary and the
//! integration tests.

pub mod agent;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod server;
