//! Asynchronous executor capability.

use std::future::Future;

use crate::cursor::CursorHandle;
use crate::error::Result;
use crate::executor::Fetched;
use crate::statement::{FetchSize, Statement};

use super::Query;

/// Connection-facing capability that executes statements asynchronously.
///
/// Implementations must deliver exactly one page (or error) per `submit`, and
/// complete submissions on the same connection in the order they were made.
pub trait QueryExecutor: Send + Sync {
    /// Submit a statement, or continue `cursor` if one is given.
    ///
    /// `fetch_size` limits the rows of the delivered page (0 = all). A new
    /// execution that leaves results pending returns the cursor it opened in
    /// [`Fetched::cursor`].
    fn submit(
        &self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> impl Future<Output = Result<Fetched>> + Send;

    /// Release a cursor.
    ///
    /// Releasing a cursor the server already closed must succeed.
    fn release(&self, cursor: CursorHandle) -> impl Future<Output = Result<()>> + Send;

    /// Check if the underlying connection is broken.
    ///
    /// Cursors on a broken connection are gone with it and are not released.
    fn is_broken(&self) -> bool;

    /// Create a query over `statement` on this executor.
    fn create_query(&self, statement: impl Into<Statement>) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, statement)
    }
}
