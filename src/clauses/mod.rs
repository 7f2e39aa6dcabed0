mod identifier;
mod where_clause;

pub use identifier::{validate_identifier, validate_table_name, MAX_IDENTIFIER_LEN};
pub use where_clause::WhereClause;
