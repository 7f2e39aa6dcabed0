mod in_memory_test;
mod mysql;
mod placeholders;
mod sqlite;
mod tokio_postgres;

pub use self::in_memory_test::{
    InMemoryTestConnection, InMemoryTestConnector, InMemoryTestResponseBuilder, RecordedStatement,
};
pub use self::mysql::{MySqlConnection, MySqlConnector};
pub use self::sqlite::{SqliteConnection, SqliteConnector, MEMORY};
pub use self::tokio_postgres::{PostgresConnection, PostgresConnector};
