mod connection;
mod driver;

pub use connection::{Connection, Connector};
pub use driver::DatabaseDriver;
