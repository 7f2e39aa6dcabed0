use async_trait::async_trait;

use crate::builders::NamedParam;
use crate::config::ConnectionConfig;
use crate::error::BackendError;
use crate::types::RawQueryResult;

/// Opens connections for a particular database client.
///
/// This is the injected collaborator of [`DbRsDriver`](crate::DbRsDriver):
/// it knows how to turn a [`ConnectionConfig`] into a live session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Builds the client-specific connection string from host and database
    /// name. Credentials are supplied separately and never appear in it.
    fn dsn(&self, config: &ConnectionConfig) -> String;

    /// Opens a session using the DSN plus the config's credentials.
    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, BackendError>;
}

/// A live database session.
/// Implementations are responsible for:
/// - Binding `:name` placeholders to the given parameters
/// - Converting SqlValue parameters to native types
/// - Executing statements and converting results to RawQueryResult
///
/// Dropping the connection closes it.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Runs a statement and returns every resulting row.
    async fn fetch(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError>;

    /// Runs a statement that returns no rows and reports how many rows it
    /// affected.
    async fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError>;
}
