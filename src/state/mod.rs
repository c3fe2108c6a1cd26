//! Sans-I/O state machine for query execution.
//!
//! The state machine holds every rule about when a query may execute, fetch or
//! close, and who owns the cursor. It performs no I/O: the `sync` and `tokio`
//! drivers turn its [`Submission`] and [`CloseAction`] requests into executor calls.

pub mod action;
pub mod query;

pub use action::{CloseAction, Submission};
pub use query::{QueryState, QueryStateMachine};
