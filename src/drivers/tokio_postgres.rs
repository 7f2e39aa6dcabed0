use std::error::Error;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{to_sql_checked, FromSql, IsNull, ToSql, Type};
use tokio_postgres::{Client, Column, Config, NoTls, Row};

use crate::builders::NamedParam;
use crate::config::ConnectionConfig;
use crate::drivers::placeholders::{to_positional, Dialect};
use crate::error::BackendError;
use crate::traits::{Connection, Connector};
use crate::types::{RawQueryResult, SqlValue};

type BoxError = Box<dyn Error + Sync + Send>;

/// Opens PostgreSQL sessions using tokio-postgres.
#[derive(Debug, Default, Clone)]
pub struct PostgresConnector;

impl PostgresConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    fn dsn(&self, config: &ConnectionConfig) -> String {
        let mut dsn = format!(
            "host={} dbname={}",
            quote_dsn_value(&config.host),
            quote_dsn_value(&config.database)
        );
        if let Some(port) = config.port {
            dsn.push_str(&format!(" port={}", port));
        }
        dsn
    }

    async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn Connection>, BackendError> {
        let mut pg_config: Config = self.dsn(config).parse()?;
        pg_config.user(&config.user).password(&config.password);

        let (client, connection) = pg_config.connect(NoTls).await?;

        // Spawn the connection handler; it finishes once the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "PostgreSQL connection closed with error");
            }
        });

        Ok(Box::new(PostgresConnection { client }))
    }
}

/// Quotes a key-value DSN value, escaping backslashes and single quotes.
fn quote_dsn_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// A PostgreSQL session.
pub struct PostgresConnection {
    client: Client,
}

impl PostgresConnection {
    fn bind<'p>(
        sql: &str,
        params: &'p [NamedParam],
    ) -> Result<(String, Vec<PgParam<'p>>), BackendError> {
        if params.is_empty() {
            return Ok((sql.to_string(), Vec::new()));
        }
        let (sql, values) = to_positional(sql, params, Dialect::Postgres)?;
        Ok((sql, values.into_iter().map(PgParam).collect()))
    }
}

fn as_params<'a>(values: &'a [PgParam<'_>]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn fetch(
        &self,
        sql: &str,
        params: &[NamedParam],
    ) -> Result<RawQueryResult, BackendError> {
        let (sql, values) = Self::bind(sql, params)?;
        let statement = self.client.prepare(&sql).await?;

        // Column names come from the statement so empty results keep them.
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = self.client.query(&statement, &as_params(&values)).await?;
        let result_rows = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| row_value(row, i, col))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawQueryResult::new(columns, result_rows))
    }

    async fn execute(&self, sql: &str, params: &[NamedParam]) -> Result<u64, BackendError> {
        let (sql, values) = Self::bind(sql, params)?;
        Ok(self.client.execute(sql.as_str(), &as_params(&values)).await?)
    }
}

/// A `SqlValue` encoded for the parameter type the server inferred.
///
/// Integers and floats are widened or narrowed to the column's width, text is
/// parsed for numeric, temporal, uuid and json parameters, and `Null` binds to
/// anything. A value that does not fit fails instead of being truncated.
#[derive(Debug)]
struct PgParam<'a>(&'a SqlValue);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Bool(b) => exact(b, "bool", ty, out),
            SqlValue::Int32(i) => int_to_sql(i64::from(*i), ty, out),
            SqlValue::Int64(i) => int_to_sql(*i, ty, out),
            SqlValue::Float(f) => float_to_sql(*f, ty, out),
            SqlValue::Text(s) => text_to_sql(s, ty, out),
            SqlValue::Bytes(b) => exact(b, "bytes", ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn mismatch(kind: &str, ty: &Type) -> BoxError {
    format!("cannot bind {} value to parameter of type {}", kind, ty).into()
}

fn exact<T: ToSql>(
    value: &T,
    kind: &str,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, BoxError> {
    if !T::accepts(ty) {
        return Err(mismatch(kind, ty));
    }
    value.to_sql(ty, out)
}

fn int_to_sql(value: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    let out_of_range = || format!("{} is out of range for type {}", value, ty);
    if *ty == Type::INT2 {
        i16::try_from(value).map_err(|_| out_of_range())?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(value).map_err(|_| out_of_range())?.to_sql(ty, out)
    } else if *ty == Type::INT8 {
        value.to_sql(ty, out)
    } else if *ty == Type::OID {
        u32::try_from(value).map_err(|_| out_of_range())?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (value as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (value as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        encode_numeric(&value.to_string(), out);
        Ok(IsNull::No)
    } else {
        Err(mismatch("integer", ty))
    }
}

fn float_to_sql(value: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::FLOAT4 {
        (value as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        value.to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        if value.is_nan() {
            encode_numeric("NaN", out);
        } else if value.is_infinite() {
            return Err(format!("{} cannot be stored as numeric", value).into());
        } else {
            encode_numeric(&value.to_string(), out);
        }
        Ok(IsNull::No)
    } else {
        Err(mismatch("float", ty))
    }
}

fn text_to_sql(value: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if <&str as ToSql>::accepts(ty) {
        return value.to_sql(ty, out);
    }
    if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::OID {
        int_to_sql(value.trim().parse()?, ty, out)
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
        float_to_sql(value.trim().parse()?, ty, out)
    } else if *ty == Type::NUMERIC {
        let value = value.trim();
        if !is_decimal(value) && value != "NaN" {
            return Err(format!("invalid numeric literal {:?}", value).into());
        }
        encode_numeric(value, out);
        Ok(IsNull::No)
    } else if *ty == Type::BOOL {
        let flag = match value.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "1" | "yes" | "on" => true,
            "f" | "false" | "0" | "no" | "off" => false,
            other => return Err(format!("invalid boolean literal {:?}", other).into()),
        };
        flag.to_sql(ty, out)
    } else if *ty == Type::UUID {
        uuid::Uuid::parse_str(value)?.to_sql(ty, out)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::from_str::<serde_json::Value>(value)?.to_sql(ty, out)
    } else if *ty == Type::DATE {
        value.parse::<NaiveDate>()?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMP {
        let parsed = value
            .parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))?;
        parsed.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        DateTime::parse_from_rfc3339(value)?
            .with_timezone(&Utc)
            .to_sql(ty, out)
    } else if *ty == Type::TIME {
        value.parse::<NaiveTime>()?.to_sql(ty, out)
    } else {
        Err(mismatch("text", ty))
    }
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

fn is_decimal(text: &str) -> bool {
    let body = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    !(int_part.is_empty() && frac_part.is_empty())
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

/// Writes a plain decimal literal (`-12.5`, `0.001`, `NaN`) in the binary
/// numeric format: base-10000 digit groups with weight, sign and scale.
fn encode_numeric(text: &str, out: &mut BytesMut) {
    if text == "NaN" {
        out.put_i16(0);
        out.put_i16(0);
        out.put_u16(NUMERIC_NAN);
        out.put_u16(0);
        return;
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');

    let int_pad = (4 - int_part.len() % 4) % 4;
    let frac_pad = (4 - frac_part.len() % 4) % 4;
    let mut decimal = "0".repeat(int_pad);
    decimal.push_str(int_part);
    decimal.push_str(frac_part);
    decimal.push_str(&"0".repeat(frac_pad));

    let mut groups: Vec<i16> = decimal
        .as_bytes()
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0i16, |acc, b| acc * 10 + i16::from(b - b'0')))
        .collect();
    let mut weight = ((int_part.len() + int_pad) / 4) as i16 - 1;
    while groups.first() == Some(&0) {
        groups.remove(0);
        weight -= 1;
    }
    while groups.last() == Some(&0) {
        groups.pop();
    }

    let sign = if negative && !groups.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };
    if groups.is_empty() {
        weight = 0;
    }

    out.put_i16(groups.len() as i16);
    out.put_i16(weight);
    out.put_u16(sign);
    out.put_u16(frac_part.len() as u16);
    for group in groups {
        out.put_i16(group);
    }
}

/// Renders a binary numeric value as its decimal text.
fn decode_numeric(raw: &[u8]) -> Result<String, BoxError> {
    let word = |at: usize| -> Result<u16, BoxError> {
        raw.get(at..at + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated numeric value".into())
    };

    let ndigits = word(0)? as i16 as i32;
    let weight = word(2)? as i16 as i32;
    let sign = word(4)?;
    let dscale = word(6)? as usize;
    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let mut digits = Vec::with_capacity(ndigits.max(0) as usize);
    for i in 0..ndigits.max(0) as usize {
        digits.push(word(8 + 2 * i)?);
    }
    let digit = |i: i32| -> u16 {
        if i >= 0 {
            digits.get(i as usize).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }
    if weight < 0 {
        text.push('0');
    } else {
        for i in 0..=weight {
            if i == 0 {
                text.push_str(&digit(i).to_string());
            } else {
                text.push_str(&format!("{:04}", digit(i)));
            }
        }
    }
    if dscale > 0 {
        let mut fraction = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit(i)));
            i += 1;
        }
        fraction.truncate(dscale);
        text.push('.');
        text.push_str(&fraction);
    }
    Ok(text)
}

struct NumericText(String);

impl<'a> FromSql<'a> for NumericText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode_numeric(raw).map(NumericText)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn display_text<T: ToString>(value: Option<T>) -> SqlValue {
    SqlValue::from(value.map(|v| v.to_string()))
}

/// Decode the value at `index` according to the column type.
fn row_value(row: &Row, index: usize, column: &Column) -> Result<SqlValue, BackendError> {
    let ty = column.type_();
    let decoded = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(index).map(SqlValue::from)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(index)
            .map(|v| SqlValue::from(v.map(i32::from)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(index).map(SqlValue::from)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(index).map(SqlValue::from)
    } else if *ty == Type::OID {
        row.try_get::<_, Option<u32>>(index)
            .map(|v| SqlValue::from(v.map(i64::from)))
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)
            .map(|v| SqlValue::from(v.map(f64::from)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index).map(SqlValue::from)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(index).map(SqlValue::from)
    } else if *ty == Type::NUMERIC {
        row.try_get::<_, Option<NumericText>>(index)
            .map(|v| SqlValue::from(v.map(|n| n.0)))
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<uuid::Uuid>>(index).map(display_text)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(index).map(display_text)
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(index).map(display_text)
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(index).map(display_text)
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(index)
            .map(|v| SqlValue::from(v.map(|t| t.to_rfc3339())))
    } else if *ty == Type::TIME {
        row.try_get::<_, Option<NaiveTime>>(index).map(display_text)
    } else {
        row.try_get::<_, Option<String>>(index).map(SqlValue::from)
    };

    decoded.map_err(|e| {
        BackendError::new(format!(
            "cannot decode column {} of type {}: {}",
            column.name(),
            ty,
            e
        ))
    })
}
