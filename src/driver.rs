use std::sync::Arc;

use async_trait::async_trait;

use crate::builders::{Delete, Insert, Scope, Select, Statement, Update};
use crate::config::ConnectionConfig;
use crate::drivers::{MySqlConnector, PostgresConnector, SqliteConnector};
use crate::error::{DbRsError, Operation, Result};
use crate::traits::{Connection, Connector, DatabaseDriver};
use crate::types::{Conditions, Fields, QueryResult};

/// Main entry point for dbrs.
/// Holds at most one connection and turns CRUD calls into parameterized SQL.
pub struct DbRsDriver {
    connector: Arc<dyn Connector>,
    connection: Option<Box<dyn Connection>>,
}

impl DbRsDriver {
    /// Create a disconnected driver for PostgreSQL servers.
    pub fn postgres() -> Self {
        Self::with_connector(Arc::new(PostgresConnector::new()))
    }

    /// Create a disconnected driver for MySQL and MariaDB servers.
    pub fn mysql() -> Self {
        Self::with_connector(Arc::new(MySqlConnector::new()))
    }

    /// Create a disconnected driver for SQLite database files.
    pub fn sqlite() -> Self {
        Self::with_connector(Arc::new(SqliteConnector::new()))
    }

    /// Create a disconnected driver with a custom connector.
    /// Useful for testing or using alternative database clients.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connection: None,
        }
    }

    fn connection(&self) -> Result<&dyn Connection> {
        self.connection.as_deref().ok_or(DbRsError::NotConnected)
    }

    async fn fetch(&self, statement: Statement, table: &str) -> Result<QueryResult> {
        let connection = self.connection()?;
        tracing::debug!(
            operation = %statement.operation,
            table,
            params = statement.params.len(),
            "executing statement"
        );
        tracing::trace!(sql = %statement.sql, "statement text");
        let raw = connection
            .fetch(&statement.sql, &statement.params)
            .await
            .map_err(|e| DbRsError::query(statement.operation, e))?;
        Ok(QueryResult::from_raw(raw))
    }

    async fn execute(&self, statement: Statement, table: &str) -> Result<u64> {
        let connection = self.connection()?;
        tracing::debug!(
            operation = %statement.operation,
            table,
            params = statement.params.len(),
            "executing statement"
        );
        tracing::trace!(sql = %statement.sql, "statement text");
        connection
            .execute(&statement.sql, &statement.params)
            .await
            .map_err(|e| DbRsError::query(statement.operation, e))
    }
}

#[async_trait]
impl DatabaseDriver for DbRsDriver {
    async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        config.validate()?;
        self.disconnect();

        let connection = self
            .connector
            .connect(config)
            .await
            .map_err(|e| DbRsError::Connection(e.0))?;
        tracing::debug!(host = %config.host, database = %config.database, "connected");
        self.connection = Some(connection);
        Ok(())
    }

    fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            tracing::debug!("disconnected");
        }
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let connection = self.connection()?;
        tracing::debug!(operation = %Operation::Query, "executing raw query");
        tracing::trace!(sql = %sql, "statement text");
        let raw = connection
            .fetch(sql, &[])
            .await
            .map_err(|e| DbRsError::query(Operation::Query, e))?;
        Ok(QueryResult::from_raw(raw))
    }

    async fn select(&self, table: &str, conditions: &Conditions) -> Result<QueryResult> {
        self.connection()?;
        let statement = Select::new(table, conditions).build()?;
        self.fetch(statement, table).await
    }

    async fn insert(&self, table: &str, fields: &Fields) -> Result<u64> {
        self.connection()?;
        let statement = Insert::new(table, fields).build()?;
        self.execute(statement, table).await
    }

    async fn update(
        &self,
        table: &str,
        fields: &Fields,
        conditions: &Conditions,
    ) -> Result<u64> {
        self.connection()?;
        let statement = Update::new(table, fields, Scope::Matching(conditions)).build()?;
        self.execute(statement, table).await
    }

    async fn update_all(&self, table: &str, fields: &Fields) -> Result<u64> {
        self.connection()?;
        let statement = Update::new(table, fields, Scope::All).build()?;
        self.execute(statement, table).await
    }

    async fn delete(&self, table: &str, conditions: &Conditions) -> Result<u64> {
        self.connection()?;
        let statement = Delete::new(table, Scope::Matching(conditions)).build()?;
        self.execute(statement, table).await
    }

    async fn delete_all(&self, table: &str) -> Result<u64> {
        self.connection()?;
        let statement = Delete::new(table, Scope::All).build()?;
        self.execute(statement, table).await
    }
}
