//! Blocking executor capability.

use crate::cursor::CursorHandle;
use crate::error::Result;
use crate::executor::Fetched;
use crate::statement::{FetchSize, Statement};

use super::Query;

/// Connection-facing capability that executes statements, blocking until the
/// server answers.
///
/// Implementations must deliver exactly one page (or error) per `submit`.
pub trait QueryExecutor {
    /// Submit a statement, or continue `cursor` if one is given.
    ///
    /// `fetch_size` limits the rows of the delivered page (0 = all). A new
    /// execution that leaves results pending returns the cursor it opened in
    /// [`Fetched::cursor`].
    fn submit(
        &mut self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> Result<Fetched>;

    /// Release a cursor.
    ///
    /// Releasing a cursor the server already closed must succeed.
    fn release(&mut self, cursor: CursorHandle) -> Result<()>;

    /// Check if the underlying connection is broken.
    fn is_broken(&self) -> bool;

    /// Create a query over `statement` on this executor.
    fn create_query(&mut self, statement: impl Into<Statement>) -> Query<'_, Self>
    where
        Self: Sized,
    {
        Query::new(self, statement)
    }
}
