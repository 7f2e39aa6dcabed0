mod delete;
mod insert;
mod select;
mod statement;
mod update;

pub use delete::Delete;
pub use insert::Insert;
pub use select::Select;
pub use statement::{NamedParam, Scope, Statement};
pub use update::{Update, CONDITION_PREFIX};
