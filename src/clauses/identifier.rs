use crate::error::{DbRsError, Result};

/// Longest identifier accepted, matching the MySQL/MariaDB limit.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Checks that `name` is a bare SQL identifier safe to splice into SQL text.
///
/// Accepted: an ASCII letter or underscore followed by ASCII letters, digits
/// or underscores, at most [`MAX_IDENTIFIER_LEN`] bytes. Column names and
/// placeholder names go through this check.
pub fn validate_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DbRsError::InvalidIdentifier(name.to_string()))
    }
}

/// Checks a table name, which may carry one schema qualifier (`schema.table`).
pub fn validate_table_name(name: &str) -> Result<()> {
    let valid = match name.split_once('.') {
        Some((schema, table)) => is_identifier(schema) && is_identifier(table),
        None => is_identifier(name),
    };
    if valid {
        Ok(())
    } else {
        Err(DbRsError::InvalidIdentifier(name.to_string()))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
