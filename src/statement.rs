//! Statements submitted by a query.

use crate::row::Column;
use crate::value::{ToParams, Value};

/// Prepared statement information.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    /// Statement name on the server
    pub name: String,
    /// Statement text
    pub sql: String,
    /// Number of positional parameters (`$1`..`$n`)
    pub param_count: usize,
    /// Column descriptions (if the statement returns rows)
    pub columns: Option<Vec<Column>>,
}

/// A statement as submitted to the executor. Immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Raw text, possibly several `;`-separated statements, no server-side binding.
    Simple(String),
    /// A prepared statement with its bound parameter values.
    Prepared {
        statement: PreparedStatement,
        params: Vec<Value>,
    },
}

impl Statement {
    pub fn simple(sql: impl Into<String>) -> Self {
        Statement::Simple(sql.into())
    }

    /// Bind `params` to a prepared statement.
    pub fn prepared<P: ToParams>(statement: &PreparedStatement, params: P) -> Self {
        Statement::Prepared {
            statement: statement.clone(),
            params: params.to_params(),
        }
    }

    /// Returns true for prepared statements, the only kind that supports a fetch size.
    pub fn is_prepared(&self) -> bool {
        matches!(self, Statement::Prepared { .. })
    }

    /// Get the SQL text.
    pub fn sql(&self) -> &str {
        match self {
            Statement::Simple(sql) => sql,
            Statement::Prepared { statement, .. } => &statement.sql,
        }
    }

    /// Get the bound parameters (empty for simple statements).
    pub fn params(&self) -> &[Value] {
        match self {
            Statement::Simple(_) => &[],
            Statement::Prepared { params, .. } => params,
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::Simple(sql.to_string())
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::Simple(sql)
    }
}

impl From<&PreparedStatement> for Statement {
    fn from(statement: &PreparedStatement) -> Self {
        Statement::prepared(statement, ())
    }
}

/// Maximum number of rows returned per page.
///
/// `0` returns all remaining rows in one page, like the `max_rows` argument of
/// the Execute message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FetchSize(u32);

impl FetchSize {
    pub const UNBOUNDED: Self = Self(0);

    pub const fn new(rows: u32) -> Self {
        Self(rows)
    }

    /// Row limit, 0 = unbounded.
    pub const fn rows(self) -> u32 {
        self.0
    }

    pub const fn is_bounded(self) -> bool {
        self.0 != 0
    }
}

impl From<u32> for FetchSize {
    fn from(rows: u32) -> Self {
        Self(rows)
    }
}
