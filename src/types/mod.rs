mod column_map;
mod row;
mod sql_value;

pub use column_map::{ColumnMap, Conditions, Fields};
pub use row::{QueryResult, RawQueryResult, Row};
pub use sql_value::SqlValue;
