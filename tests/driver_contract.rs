use std::sync::Arc;

use dbrs::builders::NamedParam;
use dbrs::drivers::{InMemoryTestConnector, InMemoryTestResponseBuilder};
use dbrs::error::{DbRsError, Operation};
use dbrs::{ColumnMap, ConnectionConfig, DatabaseDriver, DbRsDriver, SqlValue};

fn config() -> ConnectionConfig {
    ConnectionConfig::new("db.local", "app", "app_user", "secret")
}

async fn connected(connector: &InMemoryTestConnector) -> DbRsDriver {
    let mut driver = DbRsDriver::with_connector(Arc::new(connector.clone()));
    driver.connect(&config()).await.unwrap();
    driver
}

#[tokio::test]
async fn test_operations_require_connection() {
    let connector = InMemoryTestConnector::new();
    let driver = DbRsDriver::with_connector(Arc::new(connector.clone()));
    let conditions = ColumnMap::new().with("id", 1);
    let fields = ColumnMap::new().with("name", "a");

    assert!(!driver.is_connected());
    assert!(matches!(
        driver.query("SELECT 1").await,
        Err(DbRsError::NotConnected)
    ));
    assert!(matches!(
        driver.select("users", &conditions).await,
        Err(DbRsError::NotConnected)
    ));
    assert!(matches!(
        driver.insert("users", &fields).await,
        Err(DbRsError::NotConnected)
    ));
    assert!(matches!(
        driver.update("users", &fields, &conditions).await,
        Err(DbRsError::NotConnected)
    ));
    assert!(matches!(
        driver.delete("users", &conditions).await,
        Err(DbRsError::NotConnected)
    ));
    connector.assert_statement_count(0);
}

#[tokio::test]
async fn test_disconnect_then_operation_fails() {
    let connector = InMemoryTestConnector::new();
    let mut driver = connected(&connector).await;
    assert!(driver.is_connected());

    driver.disconnect();
    assert!(!driver.is_connected());
    assert!(matches!(
        driver.select("users", &ColumnMap::new()).await,
        Err(DbRsError::NotConnected)
    ));

    // Disconnecting twice is harmless.
    driver.disconnect();
}

#[tokio::test]
async fn test_connect_failure_wraps_message() {
    let connector = InMemoryTestConnector::new().with_connect_error("access denied for user");
    let mut driver = DbRsDriver::with_connector(Arc::new(connector.clone()));

    let err = driver.connect(&config()).await.unwrap_err();
    assert!(matches!(err, DbRsError::Connection(_)));
    assert_eq!(err.to_string(), "Connection failed: access denied for user");
    assert!(!driver.is_connected());
}

#[tokio::test]
async fn test_connect_rejects_invalid_config() {
    let connector = InMemoryTestConnector::new();
    let mut driver = DbRsDriver::with_connector(Arc::new(connector.clone()));

    let err = driver
        .connect(&ConnectionConfig::new("db.local", "", "u", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::InvalidConfig(_)));
    assert!(connector.connect_attempts().is_empty());
}

#[tokio::test]
async fn test_reconnect_replaces_connection() {
    let connector = InMemoryTestConnector::new();
    let mut driver = connected(&connector).await;

    let other = ConnectionConfig::new("db.other", "app", "app_user", "secret");
    driver.connect(&other).await.unwrap();

    let attempts = connector.connect_attempts();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[1].host, "db.other");
    assert!(driver.is_connected());
}

#[tokio::test]
async fn test_failed_reconnect_leaves_driver_disconnected() {
    let good = InMemoryTestConnector::new();
    let mut driver = connected(&good).await;
    assert!(driver.is_connected());

    let bad = InMemoryTestConnector::new().with_connect_error("host unreachable");
    let mut driver_on_bad = DbRsDriver::with_connector(Arc::new(bad.clone()));
    assert!(driver_on_bad.connect(&config()).await.is_err());
    assert!(!driver_on_bad.is_connected());

}

#[tokio::test]
async fn test_invalid_config_keeps_existing_connection() {
    let connector = InMemoryTestConnector::new();
    let mut driver = connected(&connector).await;

    let err = driver
        .connect(&ConnectionConfig::new("h", " ", "u", "p"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::InvalidConfig(_)));
    assert!(driver.is_connected());
    assert_eq!(connector.connect_attempts().len(), 1);

    driver.select("users", &ColumnMap::new()).await.unwrap();
    connector.assert_last_statement("SELECT * FROM users", &[]);
}

#[tokio::test]
async fn test_raw_query_is_passed_through() {
    let connector = InMemoryTestConnector::new().with_response(
        InMemoryTestResponseBuilder::new()
            .columns(&["n"])
            .row(vec![SqlValue::Int64(1)])
            .build(),
    );
    let driver = connected(&connector).await;

    let sql = "SELECT COUNT(*) AS n FROM users WHERE name = 'x:y'";
    let result = driver.query(sql).await.unwrap();

    connector.assert_last_statement(sql, &[]);
    assert_eq!(result.single_row().unwrap().get("n").unwrap().as_i64(), Some(1));
}

#[tokio::test]
async fn test_select_without_conditions() {
    let connector = InMemoryTestConnector::new().with_response(
        InMemoryTestResponseBuilder::new()
            .columns(&["id", "name"])
            .row(vec![SqlValue::Int64(1), "a".into()])
            .row(vec![SqlValue::Int64(2), "b".into()])
            .build(),
    );
    let driver = connected(&connector).await;

    let result = driver.select("users", &ColumnMap::new()).await.unwrap();

    connector.assert_last_statement("SELECT * FROM users", &[]);
    let rows = result.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name").unwrap().as_str(), Some("a"));
    assert_eq!(rows[1].get("name").unwrap().as_str(), Some("b"));
}

#[tokio::test]
async fn test_select_with_conditions() {
    let connector = InMemoryTestConnector::new();
    let driver = connected(&connector).await;

    let conditions = ColumnMap::new().with("name", "Admin").with("id", 1);
    let result = driver.select("users", &conditions).await.unwrap();

    connector.assert_last_statement(
        "SELECT * FROM users WHERE name = :name AND id = :id",
        &[NamedParam::new("name", "Admin"), NamedParam::new("id", 1)],
    );
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_insert_binds_every_field() {
    let connector = InMemoryTestConnector::new();
    let driver = connected(&connector).await;

    let fields = ColumnMap::new()
        .with("id", 3)
        .with("name", "c")
        .with("avatar", vec![0u8, 1]);
    let affected = driver.insert("users", &fields).await.unwrap();

    assert_eq!(affected, 1);
    connector.assert_last_statement(
        "INSERT INTO users (id, name, avatar) VALUES (:id, :name, :avatar)",
        &[
            NamedParam::new("id", 3),
            NamedParam::new("name", "c"),
            NamedParam::new("avatar", vec![0u8, 1]),
        ],
    );
}

#[tokio::test]
async fn test_update_prefixes_condition_params() {
    let connector = InMemoryTestConnector::new().with_affected(1);
    let driver = connected(&connector).await;

    let affected = driver
        .update(
            "users",
            &ColumnMap::new().with("name", "c"),
            &ColumnMap::new().with("id", 1),
        )
        .await
        .unwrap();

    assert_eq!(affected, 1);
    connector.assert_last_statement(
        "UPDATE users SET name = :name WHERE id = :condition_id",
        &[
            NamedParam::new("name", "c"),
            NamedParam::new("condition_id", 1),
        ],
    );
}

#[tokio::test]
async fn test_empty_conditions_are_rejected_before_sql() {
    let connector = InMemoryTestConnector::new();
    let driver = connected(&connector).await;

    let err = driver.delete("users", &ColumnMap::new()).await.unwrap_err();
    assert!(matches!(err, DbRsError::MissingConditions(Operation::Delete)));

    let err = driver
        .update("users", &ColumnMap::new().with("name", "c"), &ColumnMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::MissingConditions(Operation::Update)));

    connector.assert_statement_count(0);
}

#[tokio::test]
async fn test_explicit_whole_table_operations() {
    let connector = InMemoryTestConnector::new().with_affected(4).with_affected(4);
    let driver = connected(&connector).await;

    let updated = driver
        .update_all("users", &ColumnMap::new().with("active", false))
        .await
        .unwrap();
    connector.assert_last_statement(
        "UPDATE users SET active = :active",
        &[NamedParam::new("active", false)],
    );

    let deleted = driver.delete_all("users").await.unwrap();
    connector.assert_last_statement("DELETE FROM users", &[]);

    assert_eq!((updated, deleted), (4, 4));
}

#[tokio::test]
async fn test_invalid_identifiers_never_reach_the_database() {
    let connector = InMemoryTestConnector::new();
    let driver = connected(&connector).await;

    let err = driver
        .select("users; DROP TABLE users", &ColumnMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::InvalidIdentifier(_)));

    let err = driver
        .insert("users", &ColumnMap::new().with("name) VALUES ('x'); --", "y"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::InvalidIdentifier(_)));

    let err = driver
        .delete("users", &ColumnMap::new().with("1 = 1 OR id", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, DbRsError::InvalidIdentifier(_)));

    connector.assert_statement_count(0);
}

#[tokio::test]
async fn test_backend_failures_carry_operation_context() {
    let connector = InMemoryTestConnector::new()
        .with_fetch_error("relation \"missing\" does not exist")
        .with_execute_error("duplicate key value");
    let driver = connected(&connector).await;

    let err = driver.select("missing", &ColumnMap::new()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Select query failed: relation \"missing\" does not exist"
    );

    let err = driver
        .insert("users", &ColumnMap::new().with("id", 1))
        .await
        .unwrap_err();
    match err {
        DbRsError::Query { operation, message } => {
            assert_eq!(operation, Operation::Insert);
            assert_eq!(message, "duplicate key value");
        }
        other => panic!("Expected Query error, got {:?}", other),
    }

    // The connection survives a failed statement.
    assert!(driver.is_connected());
    connector.assert_statement_count(2);
}
