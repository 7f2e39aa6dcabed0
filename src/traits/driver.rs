use async_trait::async_trait;

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::types::{Conditions, Fields, QueryResult};

/// The uniform driver contract: connection lifecycle plus CRUD operations.
///
/// Every data operation fails with
/// [`DbRsError::NotConnected`](crate::DbRsError::NotConnected) unless
/// `connect` has succeeded and `disconnect` has not been called since.
/// Table and column names must be plain identifiers; only values are bound
/// as parameters.
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Opens a connection, closing any connection already held first.
    async fn connect(&mut self, config: &ConnectionConfig) -> Result<()>;

    /// Closes the connection if there is one. Never fails.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Runs `sql` exactly as given and returns all rows.
    ///
    /// Nothing is bound or escaped: this is NOT safe for untrusted input.
    async fn query(&self, sql: &str) -> Result<QueryResult>;

    /// `SELECT *` from `table`, filtered by equality on every condition.
    /// Empty conditions select every row.
    async fn select(&self, table: &str, conditions: &Conditions) -> Result<QueryResult>;

    /// Inserts one row and returns the number of rows affected.
    async fn insert(&self, table: &str, fields: &Fields) -> Result<u64>;

    /// Updates rows matching every condition. Empty conditions are rejected;
    /// use [`update_all`](Self::update_all) to touch the whole table.
    async fn update(&self, table: &str, fields: &Fields, conditions: &Conditions)
        -> Result<u64>;

    /// Updates every row of `table`.
    async fn update_all(&self, table: &str, fields: &Fields) -> Result<u64>;

    /// Deletes rows matching every condition. Empty conditions are rejected;
    /// use [`delete_all`](Self::delete_all) to empty the table.
    async fn delete(&self, table: &str, conditions: &Conditions) -> Result<u64>;

    /// Deletes every row of `table`.
    async fn delete_all(&self, table: &str) -> Result<u64>;
}
