//! Rewrites `:name` placeholders into the positional markers of clients that
//! have no named parameters: PostgreSQL's `$n` and MySQL's `?`.

use crate::builders::NamedParam;
use crate::error::BackendError;
use crate::types::SqlValue;

/// Lexical rules of the target server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    /// `$n` markers; a name used twice maps to the same position.
    Postgres,
    /// `?` markers; every occurrence takes its own position. Backtick
    /// identifiers, backslash escapes and `#` comments are recognized.
    MySql,
}

/// Replaces every `:name` placeholder in `sql` with the dialect's positional
/// marker and returns the values in positional order.
///
/// Placeholders inside string literals, quoted identifiers and comments are
/// left alone, as are `::type` casts and `:=` assignments.
pub(crate) fn to_positional<'p>(
    sql: &str,
    params: &'p [NamedParam],
    dialect: Dialect,
) -> Result<(String, Vec<&'p SqlValue>), BackendError> {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut order: Vec<&str> = Vec::new();
    let mut values = Vec::new();

    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut copied = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => {
                i = skip_quoted(bytes, i, dialect == Dialect::MySql);
            }
            b'`' if dialect == Dialect::MySql => {
                i = skip_quoted(bytes, i, false);
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line(bytes, i);
            }
            b'#' if dialect == Dialect::MySql => {
                i = skip_line(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..].find("*/").map_or(bytes.len(), |p| i + 2 + p + 2);
            }
            b':' if bytes.get(i + 1) == Some(&b':') => {
                i += 2;
            }
            b':' if bytes.get(i + 1).is_some_and(|b| is_name_start(*b)) => {
                let start = i + 1;
                let end = bytes[start..]
                    .iter()
                    .position(|b| !is_name_char(*b))
                    .map_or(bytes.len(), |p| start + p);
                let name = &sql[start..end];

                let lookup = || {
                    params
                        .iter()
                        .find(|p| p.name == name)
                        .map(|p| &p.value)
                        .ok_or_else(|| BackendError::new(format!("no value bound for :{}", name)))
                };

                out.push_str(&sql[copied..i]);
                match dialect {
                    Dialect::Postgres => {
                        let position = match order.iter().position(|n| *n == name) {
                            Some(p) => p + 1,
                            None => {
                                values.push(lookup()?);
                                order.push(name);
                                order.len()
                            }
                        };
                        out.push('$');
                        out.push_str(&position.to_string());
                    }
                    Dialect::MySql => {
                        values.push(lookup()?);
                        out.push('?');
                    }
                }
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied..]);

    Ok((out, values))
}

/// Returns the index just past the closing quote. Doubled quotes are
/// escapes; so is a backslash when `backslash_escapes` is set.
fn skip_quoted(bytes: &[u8], open: usize, backslash_escapes: bool) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        if backslash_escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| start + p + 1)
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
