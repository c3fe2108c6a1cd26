//! Requests the query state machine hands to its driver.

use crate::cursor::CursorHandle;
use crate::statement::FetchSize;

/// An execute the driver must submit to the executor.
///
/// The cursor is lent to the in-flight submission and must be handed back
/// through `finish_execute` or `abandon_execute`.
#[derive(Debug)]
pub struct Submission {
    pub fetch_size: FetchSize,
    pub cursor: Option<CursorHandle>,
}

/// What the driver must do to complete a `close()`.
#[derive(Debug)]
#[must_use]
pub enum CloseAction {
    /// Nothing to release; the query is closed.
    Finished,
    /// Release this cursor through the executor, then call `finish_close`.
    Release(CursorHandle),
    /// An execute or another close is in flight; wait for it and try again.
    Wait,
}
