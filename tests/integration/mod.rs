//! Integration tests for db-chat.

pub mod chat_endpoint_test;
pub mod mysql_test;
