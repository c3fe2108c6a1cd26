//! Synchronous query driver.

mod executor;
mod query;

pub use executor::QueryExecutor;
pub use query::Query;
