use crate::error::{DbRsError, Result};
use crate::types::SqlValue;

/// Driver-agnostic raw result from a database query.
/// Drivers decode engine values into `SqlValue`s.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// A single row result from a query.
/// Columns keep the order the engine returned them in.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates a new Row from column names and values.
    pub(crate) fn new(columns: &[String], values: Vec<SqlValue>) -> Self {
        let values = columns.iter().cloned().zip(values).collect();
        Self { values }
    }

    /// Gets a value by column name.
    pub fn get(&self, column: &str) -> Result<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| DbRsError::ColumnNotFound(column.to_string()))
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the values in column order.
    pub fn values(&self) -> Vec<&SqlValue> {
        self.values.iter().map(|(_, value)| value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a query execution, containing zero or more rows.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl QueryResult {
    /// Creates a QueryResult from a RawQueryResult.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(&raw.columns, values))
            .collect();
        Self {
            columns: raw.columns,
            rows,
        }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            _ => Err(DbRsError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Returns all rows from the result.
    pub fn rows(self) -> Vec<Row> {
        self.rows
    }

    /// Returns a reference to the rows without consuming the result.
    pub fn rows_ref(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
