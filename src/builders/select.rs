use crate::builders::Statement;
use crate::clauses::{validate_table_name, WhereClause};
use crate::error::{Operation, Result};
use crate::types::ColumnMap;

/// `SELECT * FROM <table> [WHERE ...]`
pub struct Select<'a> {
    table: &'a str,
    conditions: &'a ColumnMap,
}

impl<'a> Select<'a> {
    pub fn new(table: &'a str, conditions: &'a ColumnMap) -> Self {
        Self { table, conditions }
    }

    /// Build the SQL query string and parameters.
    pub fn build(&self) -> Result<Statement> {
        validate_table_name(self.table)?;

        let mut sql = String::with_capacity(64);
        let mut params = Vec::with_capacity(self.conditions.len());

        sql.push_str("SELECT * FROM ");
        sql.push_str(self.table);

        let where_clause = WhereClause::new(self.conditions);
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause.build_sql(&mut params)?);
        }

        Ok(Statement::new(Operation::Select, sql, params))
    }
}
