use crate::builders::NamedParam;
use crate::clauses::validate_identifier;
use crate::error::Result;
use crate::types::ColumnMap;

/// Equality conditions combined with AND: `a = :a AND b = :b`.
///
/// Each value is bound under a placeholder named after its column, with an
/// optional prefix so the same column can also appear in a SET list.
#[derive(Debug, Clone, Copy)]
pub struct WhereClause<'a> {
    conditions: &'a ColumnMap,
    prefix: &'static str,
}

impl<'a> WhereClause<'a> {
    pub fn new(conditions: &'a ColumnMap) -> Self {
        Self {
            conditions,
            prefix: "",
        }
    }

    /// Uses `prefix` in front of every placeholder name.
    pub fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Builds the SQL fragment (without the WHERE keyword) and appends the
    /// bound values to `params`.
    pub fn build_sql(&self, params: &mut Vec<NamedParam>) -> Result<String> {
        let mut parts = Vec::with_capacity(self.conditions.len());
        for (column, value) in self.conditions.iter() {
            validate_identifier(column)?;
            let name = format!("{}{}", self.prefix, column);
            parts.push(format!("{} = :{}", column, name));
            params.push(NamedParam::new(name, value.clone()));
        }
        Ok(parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbRsError;
    use crate::types::SqlValue;

    #[test]
    fn test_eq_clause() {
        let conditions = ColumnMap::new().with("name", "John");
        let mut params = Vec::new();
        let sql = WhereClause::new(&conditions).build_sql(&mut params).unwrap();

        assert_eq!(sql, "name = :name");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0], NamedParam::new("name", "John"));
    }

    #[test]
    fn test_and_clause() {
        let conditions = ColumnMap::new().with("name", "John").with("age", 30);
        let mut params = Vec::new();
        let sql = WhereClause::new(&conditions).build_sql(&mut params).unwrap();

        assert_eq!(sql, "name = :name AND age = :age");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].value, SqlValue::Int32(30));
    }

    #[test]
    fn test_prefixed_placeholders() {
        let conditions = ColumnMap::new().with("id", 1);
        let mut params = Vec::new();
        let sql = WhereClause::new(&conditions)
            .with_prefix("condition_")
            .build_sql(&mut params)
            .unwrap();

        assert_eq!(sql, "id = :condition_id");
        assert_eq!(params[0].name, "condition_id");
    }

    #[test]
    fn test_rejects_bad_column() {
        let conditions = ColumnMap::new().with("id = 1 OR 1", 1);
        let mut params = Vec::new();
        let err = WhereClause::new(&conditions)
            .build_sql(&mut params)
            .unwrap_err();
        assert!(matches!(err, DbRsError::InvalidIdentifier(_)));
        assert!(params.is_empty());
    }
}
