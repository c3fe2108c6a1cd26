//! Shared fixtures for query tests.
#![allow(dead_code)]

use zero_query::memory::{MemoryExecutor, ResultSet};
use zero_query::{Column, Value};

#[cfg(feature = "tokio")]
pub use gated::GatedExecutor;

pub const NUMBERS_SQL: &str = "SELECT n FROM numbers";

/// Result set with a single `n` column holding `1..=count`.
pub fn numbers(count: i64) -> ResultSet {
    ResultSet::new([Column::new("n").with_type_oid(20)])
        .with_rows((1..=count).map(|n| vec![Value::Int(n)]))
}

/// Executor answering [`NUMBERS_SQL`] with `count` rows.
pub fn numbers_executor(count: i64) -> MemoryExecutor {
    MemoryExecutor::new().with_result_set(NUMBERS_SQL, numbers(count))
}

/// Executor answering `SELECT 1` and `SELECT 2` with one row each.
pub fn select_one_two_executor() -> MemoryExecutor {
    MemoryExecutor::new()
        .with_result_set(
            "SELECT 1",
            ResultSet::new([Column::new("?column?")]).with_row(vec![Value::Int(1)]),
        )
        .with_result_set(
            "SELECT 2",
            ResultSet::new([Column::new("?column?")]).with_row(vec![Value::Int(2)]),
        )
}

/// Decode every `n` of a page.
pub fn ns(page: &zero_query::ResultPage) -> Vec<i64> {
    page.collect::<(i64,)>()
        .unwrap()
        .into_iter()
        .map(|(n,)| n)
        .collect()
}

#[cfg(feature = "tokio")]
mod gated {
    use tokio::sync::Semaphore;
    use zero_query::memory::MemoryExecutor;
    use zero_query::tokio::QueryExecutor;
    use zero_query::{CursorHandle, Error, FetchSize, Fetched, Result, Statement};

    /// Async executor whose submissions wait until the test opens the gate.
    pub struct GatedExecutor {
        pub inner: MemoryExecutor,
        gate: Semaphore,
    }

    impl GatedExecutor {
        pub fn new(inner: MemoryExecutor) -> Self {
            Self {
                inner,
                gate: Semaphore::new(0),
            }
        }

        /// Let `n` more submissions through.
        pub fn open(&self, n: usize) {
            self.gate.add_permits(n);
        }
    }

    impl QueryExecutor for GatedExecutor {
        async fn submit(
            &self,
            statement: &Statement,
            fetch_size: FetchSize,
            cursor: Option<&CursorHandle>,
        ) -> Result<Fetched> {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| Error::ConnectionBroken)?;
            permit.forget();
            self.inner.submit(statement, fetch_size, cursor).await
        }

        async fn release(&self, cursor: CursorHandle) -> Result<()> {
            self.inner.release(cursor).await
        }

        fn is_broken(&self) -> bool {
            self.inner.is_broken()
        }
    }
}
