//! Shared executor types.

use crate::cursor::CursorHandle;
use crate::page::ResultPage;

/// Outcome of one successful `submit`.
#[derive(Debug)]
pub struct Fetched {
    /// The delivered page.
    pub page: ResultPage,
    /// A cursor opened by this submission.
    ///
    /// `Some` only when the submission started a new execution and left
    /// results pending. Continuing an existing cursor returns `None`.
    pub cursor: Option<CursorHandle>,
}

impl Fetched {
    /// A page that left nothing open.
    pub fn page(page: ResultPage) -> Self {
        Self { page, cursor: None }
    }

    /// A page that opened `cursor`.
    pub fn with_cursor(page: ResultPage, cursor: CursorHandle) -> Self {
        Self {
            page,
            cursor: Some(cursor),
        }
    }
}
