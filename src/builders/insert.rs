use crate::builders::{NamedParam, Statement};
use crate::clauses::{validate_identifier, validate_table_name};
use crate::error::{DbRsError, Operation, Result};
use crate::types::ColumnMap;

/// `INSERT INTO <table> (a, b) VALUES (:a, :b)`
pub struct Insert<'a> {
    table: &'a str,
    fields: &'a ColumnMap,
}

impl<'a> Insert<'a> {
    pub fn new(table: &'a str, fields: &'a ColumnMap) -> Self {
        Self { table, fields }
    }

    pub fn build(&self) -> Result<Statement> {
        validate_table_name(self.table)?;
        if self.fields.is_empty() {
            return Err(DbRsError::EmptyFields(Operation::Insert));
        }

        let mut columns = Vec::with_capacity(self.fields.len());
        let mut placeholders = Vec::with_capacity(self.fields.len());
        let mut params = Vec::with_capacity(self.fields.len());
        for (column, value) in self.fields.iter() {
            validate_identifier(column)?;
            columns.push(column);
            placeholders.push(format!(":{}", column));
            params.push(NamedParam::new(column, value.clone()));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        );
        Ok(Statement::new(Operation::Insert, sql, params))
    }
}
