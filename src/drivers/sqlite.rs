use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;

use crate::builders::NamedParam;
use crate::config::ConnectionConfig;
use crate::error::BackendError;
use crate::traits::{Connection, Connector};
use crate::types::{RawQueryResult, SqlValue};

/// Database name that opens a private in-memory database.
pub const MEMORY: &str = ":memory:";

/// Opens SQLite databases using rusqlite.
///
/// `ConnectionConfig::database` is the file path, or `:memory:`; host and
/// credentials are ignored.
#[derive(Debug, Default, Clone)]
pub struct SqliteConnector;

impl SqliteConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    fn dsn(&self, config: &ConnectionConfig) -> String {
        config.database.clone()
    }

    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        let path = self.dsn(config);
        let conn = if path == MEMORY {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open(&path)?
        };
        Ok(Box::new(SqliteConnection {
            conn: Mutex::new(conn),
        }))
    }
}

/// A SQLite session.
///
/// rusqlite connections are `Send` but not `Sync`; the mutex only makes the
/// session shareable behind `&self`, it does not add any concurrency
/// guarantees of its own.
pub struct SqliteConnection {
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteConnection {
    fn lock(&self) -> Result<MutexGuard<'_, rusqlite::Connection>, BackendError> {
        self.conn
            .lock()
            .map_err(|_| BackendError::new("SQLite connection lock poisoned"))
    }

    fn fetch_blocking(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let names = placeholder_names(params);
        let bound = bind(&names, params);
        let mut rows = stmt.query(bound.as_slice())?;
        let mut result_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            result_rows.push(values);
        }

        Ok(RawQueryResult::new(columns, result_rows))
    }

    fn execute_blocking(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let names = placeholder_names(params);
        let bound = bind(&names, params);
        let affected = stmt.execute(bound.as_slice())?;
        Ok(affected as u64)
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn fetch(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError> {
        self.fetch_blocking(sql, params)
    }

    async fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError> {
        self.execute_blocking(sql, params)
    }
}

/// Placeholder names as rusqlite expects them, with the leading colon.
fn placeholder_names(params: &[NamedParam]) -> Vec<String> {
    params.iter().map(|p| format!(":{}", p.name)).collect()
}

fn bind<'a>(names: &'a [String], params: &'a [NamedParam]) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .zip(params)
        .map(|(name, p)| (name.as_str(), &p.value as &dyn ToSql))
        .collect()
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Int32(i) => ToSqlOutput::Owned(Value::Integer(i64::from(*i))),
            SqlValue::Int64(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            SqlValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Int64(i),
        ValueRef::Real(f) => SqlValue::Float(f),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Bytes(b.to_vec()),
    }
}
