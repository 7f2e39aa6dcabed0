use crate::builders::{Scope, Statement};
use crate::clauses::{validate_table_name, WhereClause};
use crate::error::{DbRsError, Operation, Result};

/// `DELETE FROM <table> WHERE a = :a`
pub struct Delete<'a> {
    table: &'a str,
    scope: Scope<'a>,
}

impl<'a> Delete<'a> {
    pub fn new(table: &'a str, scope: Scope<'a>) -> Self {
        Self { table, scope }
    }

    pub fn build(&self) -> Result<Statement> {
        validate_table_name(self.table)?;

        let mut sql = format!("DELETE FROM {}", self.table);
        let mut params = Vec::new();

        if let Scope::Matching(conditions) = self.scope {
            if conditions.is_empty() {
                return Err(DbRsError::MissingConditions(Operation::Delete));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&WhereClause::new(conditions).build_sql(&mut params)?);
        }

        Ok(Statement::new(Operation::Delete, sql, params))
    }
}
