//! Query execution and cursor lifecycle for PostgreSQL-style SQL drivers.
//!
//! A [`Query`](tokio::Query) wraps one statement submission (simple or
//! prepared), fetches its results in pages bounded by a fetch size, walks
//! through every result set of a multi-statement submission, and releases the
//! server-side cursor when the application closes it early.
//!
//! # Features
//!
//! - **Sans-I/O state machine**: All lifecycle rules live in [`state::QueryStateMachine`]
//! - **Sync and async APIs**: Choose between a blocking and a tokio-based driver
//! - **Pluggable executors**: The wire protocol sits behind the `QueryExecutor` traits
//! - **In-memory executor**: [`memory::MemoryExecutor`] for tests and examples
//!
//! # Example
//!
//! ```no_run
//! use zero_query::memory::{MemoryExecutor, ResultSet};
//! use zero_query::tokio::QueryExecutor;
//! use zero_query::{Column, Statement, Value};
//!
//! async fn run() -> zero_query::error::Result<()> {
//!     let executor = MemoryExecutor::new().with_result_set(
//!         "SELECT n FROM numbers",
//!         ResultSet::new([Column::new("n")]).with_rows((1..=120).map(|n| vec![Value::Int(n)])),
//!     );
//!     let stmt = executor.prepare("SELECT n FROM numbers")?;
//!
//!     let query = executor.create_query(Statement::prepared(&stmt, ()));
//!     query.fetch(50)?;
//!     loop {
//!         let page = query.execute().await?;
//!         let rows: Vec<(i64,)> = page.collect()?;
//!         println!("{} rows", rows.len());
//!         if !query.has_more() {
//!             break;
//!         }
//!     }
//!     query.close().await
//! }
//! ```

pub mod cursor;
pub mod error;
pub mod executor;
pub mod memory;
pub mod opts;
pub mod page;
pub mod row;
pub mod state;
pub mod statement;
pub mod value;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use cursor::CursorHandle;
pub use error::{Error, ErrorFields, Result};
pub use executor::Fetched;
pub use opts::{ClosePolicy, Opts};
pub use page::{Continuation, ResultPage};
pub use row::{Column, FromRow, Oid, Row};
pub use state::{QueryState, QueryStateMachine};
pub use statement::{FetchSize, PreparedStatement, Statement};
pub use value::{FromValue, ToParams, ToValue, Value};
