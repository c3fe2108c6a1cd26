//! Asynchronous query handle.

use std::pin::pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::cursor::CursorHandle;
use crate::error::Result;
use crate::opts::Opts;
use crate::page::ResultPage;
use crate::state::{CloseAction, QueryState, QueryStateMachine, Submission};
use crate::statement::{FetchSize, Statement};

use super::QueryExecutor;

fn lock(machine: &Mutex<QueryStateMachine>) -> MutexGuard<'_, QueryStateMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A statement submission that can be executed page by page.
///
/// Created by [`QueryExecutor::create_query()`] or [`Query::new()`].
/// Methods take `&self`: a second `execute()` while one is in flight fails
/// with `Error::InvalidState`, and `close()` waits for the in-flight execute
/// before releasing the cursor.
///
/// # Example
///
/// ```ignore
/// let query = executor.create_query(Statement::prepared(&stmt, (42,)));
/// query.fetch(100)?;
///
/// loop {
///     let page = query.execute().await?;
///     let rows: Vec<(i32, String)> = page.collect()?;
///     process(rows);
///     if !query.has_more() {
///         break;
///     }
/// }
///
/// query.close().await?;
/// ```
pub struct Query<'c, E> {
    executor: &'c E,
    statement: Statement,
    machine: Mutex<QueryStateMachine>,
    idle: Notify,
}

impl<'c, E: QueryExecutor> Query<'c, E> {
    /// Create a query with default options.
    pub fn new(executor: &'c E, statement: impl Into<Statement>) -> Self {
        Self::with_opts(executor, statement, &Opts::default())
    }

    /// Create a query configured from `opts`.
    pub fn with_opts(executor: &'c E, statement: impl Into<Statement>, opts: &Opts) -> Self {
        let statement = statement.into();
        let machine = QueryStateMachine::with_opts(statement.is_prepared(), opts);
        Self {
            executor,
            statement,
            machine: Mutex::new(machine),
            idle: Notify::new(),
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn state(&self) -> QueryState {
        lock(&self.machine).state()
    }

    pub fn fetch_size(&self) -> FetchSize {
        lock(&self.machine).fetch_size()
    }

    /// Returns true when the last page left rows or result sets pending and
    /// [`execute()`](Self::execute) should be called to retrieve them.
    pub fn has_more(&self) -> bool {
        lock(&self.machine).has_more()
    }

    /// Set the fetch size for the following executes.
    ///
    /// Only valid for prepared statements, and not while an execute is in flight.
    /// Pass 0 to fetch all remaining rows in one page.
    pub fn fetch(&self, size: u32) -> Result<&Self> {
        lock(&self.machine).set_fetch_size(FetchSize::new(size))?;
        Ok(self)
    }

    /// Execute the query and return the next page.
    pub async fn execute(&self) -> Result<ResultPage> {
        let Submission { fetch_size, cursor } = lock(&self.machine).start_execute()?;
        tracing::trace!(
            "submitting {:?} (fetch size {}, {})",
            self.statement.sql(),
            fetch_size.rows(),
            cursor.as_ref().map_or("new execution", |_| "continuing cursor")
        );

        let flight = InFlight {
            machine: &self.machine,
            idle: &self.idle,
            cursor,
            armed: true,
        };
        let outcome = self
            .executor
            .submit(&self.statement, fetch_size, flight.cursor.as_ref())
            .await;
        let connection_lost = outcome.is_err() && self.executor.is_broken();
        let cursor = flight.disarm();

        let result = lock(&self.machine).finish_execute(cursor, outcome, connection_lost);
        self.idle.notify_waiters();
        result
    }

    /// Release the cursor, if one is open, and close the query.
    ///
    /// Closing twice, or closing a query that never opened a cursor, succeeds
    /// without contacting the server. On a broken connection the cursor is
    /// dropped locally.
    pub async fn close(&self) -> Result<()> {
        loop {
            let mut notified = pin!(self.idle.notified());
            notified.as_mut().enable();

            let action = lock(&self.machine).start_close(self.executor.is_broken())?;
            match action {
                CloseAction::Finished => return Ok(()),
                CloseAction::Wait => notified.await,
                CloseAction::Release(cursor) => {
                    tracing::debug!("releasing {}", cursor);
                    let releasing = Releasing {
                        machine: &self.machine,
                        idle: &self.idle,
                    };
                    let result = self.executor.release(cursor).await;
                    drop(releasing);
                    return result;
                }
            }
        }
    }

    /// Close the query, logging instead of returning a release failure.
    pub async fn discard(&self) {
        if let Err(e) = self.close().await {
            tracing::warn!("failed to release cursor of discarded query: {}", e);
        }
    }
}

/// Returns the lent cursor to the state machine if an execute future is dropped mid-flight.
struct InFlight<'q> {
    machine: &'q Mutex<QueryStateMachine>,
    idle: &'q Notify,
    cursor: Option<CursorHandle>,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) -> Option<CursorHandle> {
        self.armed = false;
        self.cursor.take()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!("execute dropped before completion");
            lock(self.machine).abandon_execute(self.cursor.take());
            self.idle.notify_waiters();
        }
    }
}

/// Marks the query closed once the release completes or is dropped.
struct Releasing<'q> {
    machine: &'q Mutex<QueryStateMachine>,
    idle: &'q Notify,
}

impl Drop for Releasing<'_> {
    fn drop(&mut self) {
        lock(self.machine).finish_close();
        self.idle.notify_waiters();
    }
}
