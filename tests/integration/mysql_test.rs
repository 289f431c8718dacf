//! MySQL integration tests.
//!
//! Need a disposable MySQL 8 database the test user may create tables
//! in. Skipped unless DATABASE_URL is set.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use db_chat::agent::{AgentOptions, SqlAgentFactory};
use db_chat::config::{Config, ConnectionConfig};
use db_chat::db::{DatabaseClient, DatabaseConnector, MySqlConnector};
use db_chat::llm::{LlmClient, MockLlmClient};
use db_chat::server::{router, AppState};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test client.
async fn get_test_client() -> Option<Arc<dyn DatabaseClient>> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    MySqlConnector.connect(&config).await.ok()
}

/// Creates `table` with one row of each interesting column type.
async fn create_fixture(client: &dyn DatabaseClient, table: &str) {
    client
        .execute_query(&format!("DROP TABLE IF EXISTS `{table}`"))
        .await
        .unwrap();
    client
        .execute_query(&format!(
            "CREATE TABLE `{table}` (
                id INT PRIMARY KEY,
                name VARCHAR(32),
                price DECIMAL(10, 2),
                active BOOLEAN,
                born DATE,
                meta JSON,
                released YEAR,
                note TEXT NULL
            )"
        ))
        .await
        .unwrap();
    client
        .execute_query(&format!(
            "INSERT INTO `{table}` VALUES
                (1, 'Ada', 12.50, TRUE, '1815-12-10', '{{\"lang\": \"en\"}}', 2001, NULL),
                (2, 'Linus', 3.00, FALSE, '1969-12-28', '[1, 2]', 1991, 'kernel')"
        ))
        .await
        .unwrap();
}

async fn drop_fixture(client: &dyn DatabaseClient, table: &str) {
    let _ = client
        .execute_query(&format!("DROP TABLE IF EXISTS `{table}`"))
        .await;
}

#[tokio::test]
async fn test_row_conversion() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let table = "db_chat_it_types";
    create_fixture(client.as_ref(), table).await;

    let result = client
        .execute_query(&format!(
            "SELECT id, name, price, active, born, meta, released, note FROM `{table}` ORDER BY id"
        ))
        .await
        .unwrap();

    assert_eq!(result.row_count, 2);
    let first = &result.rows[0];
    let columns: Vec<&str> = first.keys().map(String::as_str).collect();
    assert_eq!(
        columns,
        vec!["id", "name", "price", "active", "born", "meta", "released", "note"]
    );
    assert_eq!(first["id"], json!(1));
    assert_eq!(first["name"], json!("Ada"));
    assert_eq!(first["price"], json!("12.50"));
    assert_eq!(first["born"], json!("1815-12-10"));
    assert_eq!(first["meta"], json!({"lang": "en"}));
    assert_eq!(first["released"], json!(2001));
    assert_eq!(result.rows[1]["released"], json!(1991));
    assert_eq!(first["note"], Value::Null);
    assert_eq!(result.rows[1]["note"], json!("kernel"));

    drop_fixture(client.as_ref(), table).await;
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_list_and_describe_tables() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let table = "db_chat_it_schema";
    create_fixture(client.as_ref(), table).await;

    let tables = client.list_tables().await.unwrap();
    assert!(tables.iter().any(|t| t == table));

    let infos = client.describe_tables(&[table.to_string()]).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert!(infos[0].create_statement.contains("CREATE TABLE"));
    assert_eq!(infos[0].sample_rows.len(), 2);
    let described = infos[0].format_for_llm();
    assert!(described.contains(&format!("2 rows from {table} table:")));

    drop_fixture(client.as_ref(), table).await;
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_query_error_format() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let error = client
        .execute_query("SELECT * FROM db_chat_missing_table")
        .await
        .unwrap_err();
    assert!(error.to_string().contains("ERROR 1146"));

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_chat_against_mysql() {
    let Some(url) = get_test_database_url() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let llm: Arc<dyn LlmClient> = Arc::new(
        MockLlmClient::new()
            .with_tool_call("c1", "list-tables-sql", "")
            .with_tool_call("c2", "query-sql", "SELECT 1 AS one, 'two' AS two")
            .with_text("One and two."),
    );
    let config = Config {
        database_url: Some(url),
        ..Config::default()
    };
    let agents = Arc::new(SqlAgentFactory::new(llm, AgentOptions::default()));
    let app = router(Arc::new(AppState::new(
        config,
        Arc::new(MySqlConnector),
        agents,
    )));

    let request = Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"query":"Give me one and two"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "prompt": "Give me one and two",
            "sqlQuery": "SELECT 1 AS one, 'two' AS two",
            "result": [{"one": 1, "two": "two"}],
            "error": ""
        })
    );
}
