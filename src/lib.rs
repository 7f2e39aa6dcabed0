//! dbrs - A thin, driver-agnostic CRUD adapter over relational databases
//!
//! # Example
//! ```ignore
//! use dbrs::{ColumnMap, ConnectionConfig, DatabaseDriver, DbRsDriver};
//!
//! // Connect to database
//! let mut driver = DbRsDriver::postgres();
//! driver
//!     .connect(&ConnectionConfig::new("localhost", "mydb", "app", "secret"))
//!     .await?;
//!
//! // Insert, then read the row back
//! driver
//!     .insert("users", &ColumnMap::new().with("id", 1).with("name", "John"))
//!     .await?;
//! let row = driver
//!     .select("users", &ColumnMap::new().with("id", 1))
//!     .await?
//!     .single_row()?;
//!
//! let name = row.get("name")?;
//! ```
//!
//! Backends: [`DbRsDriver::mysql`] (MySQL/MariaDB via sqlx),
//! [`DbRsDriver::postgres`] (tokio-postgres) and [`DbRsDriver::sqlite`]
//! (rusqlite).
//!
//! Values are always bound as `:name` parameters. Table and column names are
//! spliced into the SQL text and must pass [`clauses::validate_identifier`].

pub mod builders;
pub mod clauses;
pub mod config;
pub mod drivers;
pub mod error;
pub mod traits;
pub mod types;

mod driver;

// Re-export main types for convenient access
pub use config::ConnectionConfig;
pub use driver::DbRsDriver;
pub use error::{BackendError, DbRsError, Operation, Result};
pub use traits::{Connection, Connector, DatabaseDriver};
pub use types::{ColumnMap, Conditions, Fields, QueryResult, RawQueryResult, Row, SqlValue};
