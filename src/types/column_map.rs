use crate::types::SqlValue;

/// Ordered column-name to value map.
///
/// Used as the field list of inserts and updates and as the equality
/// conditions of selects, updates and deletes. Iteration follows insertion
/// order so generated SQL is deterministic.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnMap {
    entries: Vec<(String, SqlValue)>,
}

/// Columns and values written by `insert` and `update`.
pub type Fields = ColumnMap;

/// Equality conditions combined with AND.
pub type Conditions = ColumnMap;

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value, builder style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value. An existing column keeps its position and gets
    /// the new value; the previous value is returned.
    pub fn insert(
        &mut self,
        column: impl Into<String>,
        value: impl Into<SqlValue>,
    ) -> Option<SqlValue> {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ColumnMap
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ColumnMap::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ColumnMap
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let map = ColumnMap::new().with("b", 2).with("a", 1).with("c", 3);
        let columns: Vec<&str> = map.columns().collect();
        assert_eq!(columns, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_replacing_keeps_position() {
        let mut map = ColumnMap::from([("id", 1), ("age", 30)]);
        let previous = map.insert("id", 5);

        assert_eq!(previous, Some(SqlValue::Int32(1)));
        assert_eq!(map.len(), 2);
        let entries: Vec<(&str, &SqlValue)> = map.iter().collect();
        assert_eq!(entries[0], ("id", &SqlValue::Int32(5)));
        assert_eq!(entries[1], ("age", &SqlValue::Int32(30)));
    }

    #[test]
    fn test_get_and_empty() {
        let map: ColumnMap = vec![("name", "Alice")].into_iter().collect();
        assert_eq!(map.get("name"), Some(&SqlValue::Text("Alice".to_string())));
        assert_eq!(map.get("missing"), None);
        assert!(ColumnMap::new().is_empty());
    }
}
