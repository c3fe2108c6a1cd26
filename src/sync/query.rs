//! Blocking query handle.

use crate::error::{Error, Result};
use crate::opts::Opts;
use crate::page::ResultPage;
use crate::state::{CloseAction, QueryState, QueryStateMachine, Submission};
use crate::statement::{FetchSize, Statement};

use super::QueryExecutor;

/// A statement submission that can be executed page by page.
///
/// Created by [`QueryExecutor::create_query()`] or [`Query::new()`]. The query
/// borrows the executor mutably, so no other statement can run on the
/// connection while the query is alive.
///
/// # Example
///
/// ```ignore
/// let mut query = conn.create_query(Statement::prepared(&stmt, ()));
/// query.fetch(100)?;
///
/// loop {
///     let page = query.execute()?;
///     process(page.collect::<(i32,)>()?);
///     if !query.has_more() {
///         break;
///     }
/// }
///
/// query.close()?;
/// ```
pub struct Query<'c, E> {
    executor: &'c mut E,
    statement: Statement,
    machine: QueryStateMachine,
}

impl<'c, E: QueryExecutor> Query<'c, E> {
    /// Create a query with default options.
    pub fn new(executor: &'c mut E, statement: impl Into<Statement>) -> Self {
        Self::with_opts(executor, statement, &Opts::default())
    }

    /// Create a query configured from `opts`.
    pub fn with_opts(executor: &'c mut E, statement: impl Into<Statement>, opts: &Opts) -> Self {
        let statement = statement.into();
        let machine = QueryStateMachine::with_opts(statement.is_prepared(), opts);
        Self {
            executor,
            statement,
            machine,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn state(&self) -> QueryState {
        self.machine.state()
    }

    pub fn fetch_size(&self) -> FetchSize {
        self.machine.fetch_size()
    }

    /// Returns true when the last page left rows or result sets pending.
    pub fn has_more(&self) -> bool {
        self.machine.has_more()
    }

    /// Set the fetch size for the following executes (prepared statements only).
    ///
    /// Pass 0 to fetch all remaining rows in one page.
    pub fn fetch(&mut self, size: u32) -> Result<&mut Self> {
        self.machine.set_fetch_size(FetchSize::new(size))?;
        Ok(self)
    }

    /// Execute the query and return the next page.
    pub fn execute(&mut self) -> Result<ResultPage> {
        let Submission { fetch_size, cursor } = self.machine.start_execute()?;
        let outcome = self
            .executor
            .submit(&self.statement, fetch_size, cursor.as_ref());
        let connection_lost = outcome.is_err() && self.executor.is_broken();
        self.machine.finish_execute(cursor, outcome, connection_lost)
    }

    /// Release the cursor, if one is open, and close the query.
    ///
    /// Idempotent. On a broken connection the cursor is dropped locally.
    pub fn close(&mut self) -> Result<()> {
        match self.machine.start_close(self.executor.is_broken())? {
            CloseAction::Finished => Ok(()),
            CloseAction::Release(cursor) => {
                tracing::debug!("releasing {}", cursor);
                let result = self.executor.release(cursor);
                self.machine.finish_close();
                result
            }
            // Nothing runs concurrently on an exclusively borrowed query.
            CloseAction::Wait => Err(Error::InvalidState(
                "query is already being closed".into(),
            )),
        }
    }

    /// Close the query, logging instead of returning a release failure.
    pub fn discard(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("failed to release cursor of discarded query: {}", e);
        }
    }
}
