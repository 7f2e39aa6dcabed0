//! Connection settings supplied by the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DbRsError, Result};

/// Where and as whom to connect.
///
/// The driver never mutates a config; it is read once per `connect`.
/// Deserializable so hosts can embed it in their own configuration files.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,

    /// Database name. For the SQLite backend this is the file path or
    /// `:memory:`.
    pub database: String,

    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Server port; the backend default when absent.
    #[serde(default)]
    pub port: Option<u16>,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            port: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Config for an embedded database file (or `:memory:`); network fields
    /// are left empty.
    pub fn embedded(database: impl Into<String>) -> Self {
        Self::new("", database, "", "")
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(DbRsError::InvalidConfig(
                "database name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}
