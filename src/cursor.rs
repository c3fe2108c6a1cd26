//! Server-side cursor handle.

/// Handle to an open, partially consumed result on the connection.
///
/// The executor creates a handle when a submission leaves results pending
/// (a suspended portal, or the remaining result sets of a multi-statement
/// simple query). The handle is not `Clone`: the [`Query`](crate::tokio::Query)
/// that received it owns it until the results are exhausted or it is passed
/// by value to `release`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct CursorHandle {
    name: String,
}

impl CursorHandle {
    /// Create a handle for the server-side portal `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Get the portal name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for CursorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cursor {:?}", self.name)
    }
}
