//! Postgres-backed store tests. Run with `TEST_DATABASE_URL` set and
//! `cargo test -- --ignored`.

use portfolio_service::config::DatabaseConfig;
use portfolio_service::models::NewContactMessage;
use portfolio_service::services::{ContactStore, PgContactStore};

async fn store() -> PgContactStore {
    let url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run database tests");

    let store = PgContactStore::connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await
    .expect("Failed to connect to test database");

    store
        .run_migrations()
        .await
        .expect("Failed to run migrations");
    store
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn create_persists_message_with_timestamp() {
    let store = store().await;
    let before = store.count().await.unwrap();

    let stored = store
        .create(&NewContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            message: "Hello from the test suite".to_string(),
        })
        .await
        .unwrap();

    assert!(stored.id > 0);
    assert_eq!(stored.name, "Ada");
    assert_eq!(stored.message, "Hello from the test suite");
    assert_eq!(store.count().await.unwrap(), before + 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn empty_fields_are_stored() {
    let store = store().await;

    let stored = store
        .create(&NewContactMessage {
            name: String::new(),
            email: String::new(),
            message: String::new(),
        })
        .await
        .unwrap();

    assert_eq!(stored.email, "");
    store.health_check().await.unwrap();
}
