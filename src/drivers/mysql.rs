use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::types::chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{Column, ConnectOptions, Executor, Row, Statement, TypeInfo, ValueRef};
use tokio::sync::Mutex;

use crate::builders::NamedParam;
use crate::config::ConnectionConfig;
use crate::drivers::placeholders::{to_positional, Dialect};
use crate::error::BackendError;
use crate::traits::{Connection, Connector};
use crate::types::{RawQueryResult, SqlValue};

/// Opens MySQL and MariaDB sessions using sqlx.
#[derive(Debug, Default, Clone)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    fn options(&self, config: &ConnectionConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);
        match config.port {
            Some(port) => options.port(port),
            None => options,
        }
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    fn dsn(&self, config: &ConnectionConfig) -> String {
        match config.port {
            Some(port) => format!("mysql://{}:{}/{}", config.host, port, config.database),
            None => format!("mysql://{}/{}", config.host, config.database),
        }
    }

    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        tracing::trace!(dsn = %self.dsn(config), "opening MySQL session");
        let conn = self.options(config).connect().await?;
        Ok(Box::new(MySqlConnection {
            conn: Mutex::new(conn),
        }))
    }
}

/// A MySQL or MariaDB session.
///
/// Statements need exclusive access to the sqlx connection, so it sits behind
/// an async mutex for the `&self` methods of [`Connection`].
pub struct MySqlConnection {
    conn: Mutex<sqlx::MySqlConnection>,
}

impl MySqlConnection {
    fn bind<'p>(
        sql: &str,
        params: &'p [NamedParam],
    ) -> Result<(String, Vec<&'p SqlValue>), BackendError> {
        if params.is_empty() {
            return Ok((sql.to_string(), Vec::new()));
        }
        to_positional(sql, params, Dialect::MySql)
    }
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[&'q SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for &value in values {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int32(i) => query.bind(*i),
            SqlValue::Int64(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Bytes(b) => query.bind(b.as_slice()),
        };
    }
    query
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn fetch(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError> {
        let (sql, values) = Self::bind(sql, params)?;
        let mut conn = self.conn.lock().await;

        // Column names come from the statement so empty results keep them.
        let columns: Vec<String> = (&mut *conn)
            .prepare(sql.as_str())
            .await?
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = bind_values(sqlx::query(sql.as_str()), &values)
            .fetch_all(&mut *conn)
            .await?;
        let result_rows = rows.iter().map(row_values).collect::<Result<Vec<_>, _>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError> {
        let (sql, values) = Self::bind(sql, params)?;
        let mut conn = self.conn.lock().await;
        let done = bind_values(sqlx::query(sql.as_str()), &values)
            .execute(&mut *conn)
            .await?;
        Ok(done.rows_affected())
    }
}

/// How a MySQL column type is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    Bool,
    Signed,
    Unsigned,
    Year,
    Float,
    Double,
    Bytes,
    Date,
    DateTime,
    Time,
    Text,
}

/// Maps a sqlx MySQL type name (`BIGINT UNSIGNED`, `VARCHAR`, ...) to its
/// decoding. Anything unrecognized is read as text.
fn classify(type_name: &str) -> Decode {
    let (base, unsigned) = match type_name.strip_suffix(" UNSIGNED") {
        Some(base) => (base, true),
        None => (type_name, false),
    };
    match base {
        "BOOLEAN" => Decode::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" if unsigned => Decode::Unsigned,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => Decode::Signed,
        "YEAR" => Decode::Year,
        "FLOAT" => Decode::Float,
        "DOUBLE" => Decode::Double,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => Decode::Bytes,
        "DATE" => Decode::Date,
        "DATETIME" | "TIMESTAMP" => Decode::DateTime,
        "TIME" => Decode::Time,
        _ => Decode::Text,
    }
}

fn row_values(row: &MySqlRow) -> Result<Vec<SqlValue>, BackendError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let type_name = column.type_info().name();
            decode_value(row, i, classify(type_name)).map_err(|e| {
                BackendError::new(format!(
                    "cannot decode column {} of type {}: {}",
                    column.name(),
                    type_name,
                    e
                ))
            })
        })
        .collect()
}

fn decode_value(row: &MySqlRow, index: usize, decode: Decode) -> Result<SqlValue, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match decode {
        Decode::Bool => SqlValue::Bool(row.try_get(index)?),
        Decode::Signed => SqlValue::Int64(row.try_get(index)?),
        Decode::Unsigned => {
            let v: u64 = row.try_get(index)?;
            match i64::try_from(v) {
                Ok(v) => SqlValue::Int64(v),
                Err(_) => SqlValue::Text(v.to_string()),
            }
        }
        Decode::Year => SqlValue::Int32(i32::from(row.try_get_unchecked::<u16, _>(index)?)),
        Decode::Float => SqlValue::Float(f64::from(row.try_get::<f32, _>(index)?)),
        Decode::Double => SqlValue::Float(row.try_get(index)?),
        Decode::Bytes => SqlValue::Bytes(row.try_get_unchecked(index)?),
        Decode::Date => SqlValue::Text(row.try_get::<NaiveDate, _>(index)?.to_string()),
        Decode::DateTime => SqlValue::Text(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
        Decode::Time => SqlValue::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
        // DECIMAL, JSON, ENUM and SET arrive as text on the wire.
        Decode::Text => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}
