//! Asynchronous query driver using Tokio.

mod executor;
mod query;

pub use executor::QueryExecutor;
pub use query::Query;
