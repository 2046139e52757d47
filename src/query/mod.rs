mod executor;
mod log;

pub use executor::{Binding, QueryExecutor};
pub use log::QueryLog;
