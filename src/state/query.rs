//! Query execution state machine.

use crate::cursor::CursorHandle;
use crate::error::{Error, Result};
use crate::executor::Fetched;
use crate::opts::{ClosePolicy, Opts};
use crate::page::ResultPage;
use crate::statement::FetchSize;

use super::action::{CloseAction, Submission};

/// Query lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Nothing pending, no page delivered yet (or the last execute failed)
    Idle,
    /// An execute is in flight
    Executing,
    /// The last page reported more rows or results; the cursor is open
    HasMore,
    /// The last page was final; the server closed the cursor
    Exhausted,
    /// A cursor release is in flight
    Closing,
    /// The query was closed by the application
    Closed,
}

/// Query execution state machine.
///
/// Owns the fetch size and the cursor. While an execute is in flight the
/// cursor is lent out through [`Submission`]; while a release is in flight
/// it is moved out through [`CloseAction::Release`].
#[derive(Debug)]
pub struct QueryStateMachine {
    state: QueryState,
    prepared: bool,
    fetch_size: FetchSize,
    cursor: Option<CursorHandle>,
    close_policy: ClosePolicy,
}

impl QueryStateMachine {
    /// Create a state machine for a simple (`prepared = false`) or prepared statement.
    pub fn new(prepared: bool) -> Self {
        Self {
            state: QueryState::Idle,
            prepared,
            fetch_size: FetchSize::UNBOUNDED,
            cursor: None,
            close_policy: ClosePolicy::default(),
        }
    }

    /// Create a state machine configured from `opts`.
    ///
    /// The default fetch size applies to prepared statements only.
    pub fn with_opts(prepared: bool, opts: &Opts) -> Self {
        let mut sm = Self::new(prepared);
        if prepared {
            sm.fetch_size = FetchSize::new(opts.fetch_size);
        }
        sm.close_policy = opts.close_policy;
        sm
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Returns true only when the last page left rows or result sets pending.
    pub fn has_more(&self) -> bool {
        self.state == QueryState::HasMore
    }

    pub fn fetch_size(&self) -> FetchSize {
        self.fetch_size
    }

    /// The cursor currently owned by the query (none while lent to an execute).
    pub fn cursor(&self) -> Option<&CursorHandle> {
        self.cursor.as_ref()
    }

    /// Change the fetch size used by the next execute.
    pub fn set_fetch_size(&mut self, size: FetchSize) -> Result<()> {
        if !self.prepared {
            return Err(Error::InvalidState(
                "fetch size is only supported for prepared statements".into(),
            ));
        }
        match self.state {
            QueryState::Executing => Err(Error::InvalidState(
                "cannot change fetch size while an execute is in flight".into(),
            )),
            QueryState::Closing | QueryState::Closed => {
                Err(Error::InvalidState("query is closed".into()))
            }
            QueryState::Idle | QueryState::HasMore | QueryState::Exhausted => {
                self.fetch_size = size;
                Ok(())
            }
        }
    }

    /// Begin an execute.
    ///
    /// Continues the open cursor if there is one, otherwise starts a new
    /// execution of the statement.
    pub fn start_execute(&mut self) -> Result<Submission> {
        match self.state {
            QueryState::Executing => Err(Error::InvalidState(
                "an execute is already in flight on this query".into(),
            )),
            QueryState::Closing | QueryState::Closed => {
                Err(Error::InvalidState("query is closed".into()))
            }
            QueryState::Idle | QueryState::HasMore | QueryState::Exhausted => {
                self.state = QueryState::Executing;
                let fetch_size = if self.prepared {
                    self.fetch_size
                } else {
                    FetchSize::UNBOUNDED
                };
                Ok(Submission {
                    fetch_size,
                    cursor: self.cursor.take(),
                })
            }
        }
    }

    /// Complete an execute with the executor's outcome.
    ///
    /// `cursor` is the cursor lent out by [`start_execute`](Self::start_execute).
    /// `connection_lost` tells whether the executor's connection died; a cursor
    /// on a dead connection is dropped instead of being kept for release.
    pub fn finish_execute(
        &mut self,
        cursor: Option<CursorHandle>,
        outcome: Result<Fetched>,
        connection_lost: bool,
    ) -> Result<ResultPage> {
        match outcome {
            Ok(Fetched {
                page,
                cursor: opened,
            }) => {
                let cursor = match (opened, cursor) {
                    (Some(opened), Some(previous)) => {
                        tracing::debug!("{} replaced by {}", previous, opened);
                        Some(opened)
                    }
                    (opened, previous) => opened.or(previous),
                };

                if !page.has_more() {
                    // The server closes the portal once the last page is sent.
                    self.cursor = None;
                    self.state = QueryState::Exhausted;
                    return Ok(page);
                }

                match cursor {
                    Some(cursor) => {
                        self.cursor = Some(cursor);
                        self.state = QueryState::HasMore;
                        Ok(page)
                    }
                    None => {
                        self.state = QueryState::Idle;
                        Err(Error::Protocol(
                            "page reports more results but no cursor is open".into(),
                        ))
                    }
                }
            }
            Err(err) => {
                self.state = QueryState::Idle;
                self.cursor = if connection_lost {
                    if let Some(cursor) = &cursor {
                        tracing::debug!("dropping {} after connection loss", cursor);
                    }
                    None
                } else {
                    cursor
                };
                Err(err)
            }
        }
    }

    /// The execute was abandoned before the executor answered.
    ///
    /// The cursor is kept so that a later close still releases it.
    pub fn abandon_execute(&mut self, cursor: Option<CursorHandle>) {
        if self.state == QueryState::Executing {
            self.state = QueryState::Idle;
            self.cursor = cursor;
        }
    }

    /// Begin a close.
    ///
    /// Closing a closed query, or a query without an open cursor, finishes
    /// immediately. A cursor on a dead connection is dropped without a release.
    pub fn start_close(&mut self, connection_lost: bool) -> Result<CloseAction> {
        match self.state {
            QueryState::Closed => Ok(CloseAction::Finished),
            QueryState::Closing => Ok(CloseAction::Wait),
            QueryState::Executing => match self.close_policy {
                ClosePolicy::Wait => Ok(CloseAction::Wait),
                ClosePolicy::Reject => Err(Error::InvalidState(
                    "cannot close while an execute is in flight".into(),
                )),
            },
            QueryState::Idle | QueryState::HasMore | QueryState::Exhausted => {
                match self.cursor.take() {
                    Some(cursor) if !connection_lost => {
                        self.state = QueryState::Closing;
                        Ok(CloseAction::Release(cursor))
                    }
                    Some(cursor) => {
                        tracing::debug!("connection lost, {} released locally", cursor);
                        self.state = QueryState::Closed;
                        Ok(CloseAction::Finished)
                    }
                    None => {
                        self.state = QueryState::Closed;
                        Ok(CloseAction::Finished)
                    }
                }
            }
        }
    }

    /// Complete a release requested by [`CloseAction::Release`], successful or not.
    pub fn finish_close(&mut self) {
        self.state = QueryState::Closed;
    }
}
