use crate::builders::{NamedParam, Scope, Statement};
use crate::clauses::{validate_identifier, validate_table_name, WhereClause};
use crate::error::{DbRsError, Operation, Result};
use crate::types::ColumnMap;

/// Placeholder prefix for WHERE bindings, so a column can be both set and
/// matched on in one statement.
pub const CONDITION_PREFIX: &str = "condition_";

/// `UPDATE <table> SET a = :a WHERE b = :condition_b`
pub struct Update<'a> {
    table: &'a str,
    fields: &'a ColumnMap,
    scope: Scope<'a>,
}

impl<'a> Update<'a> {
    pub fn new(table: &'a str, fields: &'a ColumnMap, scope: Scope<'a>) -> Self {
        Self {
            table,
            fields,
            scope,
        }
    }

    pub fn build(&self) -> Result<Statement> {
        validate_table_name(self.table)?;
        if self.fields.is_empty() {
            return Err(DbRsError::EmptyFields(Operation::Update));
        }

        let mut params = Vec::new();
        let mut set_parts = Vec::with_capacity(self.fields.len());
        for (column, value) in self.fields.iter() {
            validate_identifier(column)?;
            set_parts.push(format!("{} = :{}", column, column));
            params.push(NamedParam::new(column, value.clone()));
        }

        let mut sql = format!("UPDATE {} SET {}", self.table, set_parts.join(", "));

        if let Scope::Matching(conditions) = self.scope {
            if conditions.is_empty() {
                return Err(DbRsError::MissingConditions(Operation::Update));
            }
            let where_sql = WhereClause::new(conditions)
                .with_prefix(CONDITION_PREFIX)
                .build_sql(&mut params)?;
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        // A SET column literally named `condition_<x>` would shadow the WHERE binding of `x`.
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(DbRsError::DuplicatePlaceholder(param.name.clone()));
            }
        }

        Ok(Statement::new(Operation::Update, sql, params))
    }
}
