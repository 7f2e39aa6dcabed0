use crate::error::Operation;
use crate::types::{ColumnMap, SqlValue};

/// A value bound to a `:name` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    /// Placeholder name without the leading colon.
    pub name: String,
    pub value: SqlValue,
}

impl NamedParam {
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// SQL text plus its named parameters, ready to hand to a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub operation: Operation,
    pub sql: String,
    pub params: Vec<NamedParam>,
}

impl Statement {
    pub fn new(operation: Operation, sql: impl Into<String>, params: Vec<NamedParam>) -> Self {
        Self {
            operation,
            sql: sql.into(),
            params,
        }
    }
}

/// Which rows an UPDATE or DELETE applies to.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Rows matching every condition. An empty map is rejected.
    Matching(&'a ColumnMap),
    /// Every row in the table. Only reachable through the explicit
    /// `update_all` / `delete_all` operations.
    All,
}
