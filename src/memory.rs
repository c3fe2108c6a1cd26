//! In-memory executor.
//!
//! [`MemoryExecutor`] answers statements from result sets registered by SQL
//! text and keeps server-side cursor state the way a PostgreSQL backend keeps
//! portals: a cursor exists only while results are pending, and it disappears
//! when the last page is delivered. It implements both the blocking and the
//! asynchronous executor traits and supports fault injection, which makes it
//! the executor used by this crate's tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_queue::SegQueue;

use crate::cursor::CursorHandle;
use crate::error::{Error, Result};
use crate::executor::Fetched;
use crate::page::ResultPage;
use crate::row::Column;
use crate::statement::{FetchSize, PreparedStatement, Statement};
use crate::value::Value;

/// A complete result set served page by page.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Arc<[Column]>,
    rows: Vec<Vec<Value>>,
    rows_affected: Option<u64>,
}

impl ResultSet {
    /// Create an empty result set with the given columns.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            rows: Vec::new(),
            rows_affected: None,
        }
    }

    /// Result of a statement that returns no rows (INSERT, UPDATE, DDL).
    pub fn command(rows_affected: u64) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            ..Self::default()
        }
    }

    pub fn with_row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A fault to inject into the next submission.
enum Fault {
    Error(Error),
    Disconnect,
}

/// Pending results of one execution.
struct Execution {
    sets: VecDeque<ResultSet>,
    offset: usize,
}

impl Execution {
    /// Cut the next page. The execution is exhausted when `sets` is empty afterwards.
    fn next_page(&mut self, fetch_size: FetchSize) -> ResultPage {
        let Some(current) = self.sets.front() else {
            return ResultPage::empty();
        };

        let remaining = current.rows.len().saturating_sub(self.offset);
        let take = match fetch_size.rows() {
            0 => remaining,
            n => remaining.min(n as usize),
        };
        let rows = current
            .rows
            .iter()
            .skip(self.offset)
            .take(take)
            .cloned()
            .collect();
        let mut page = ResultPage::new(Arc::clone(&current.columns), rows);
        if let Some(n) = current.rows_affected {
            page = page.with_rows_affected(n);
        }

        self.offset += take;
        let more_rows = self.offset < current.rows.len();
        let more_results = if more_rows {
            self.sets.len() > 1
        } else {
            self.sets.pop_front();
            self.offset = 0;
            !self.sets.is_empty()
        };

        page.with_more_rows(more_rows)
            .with_more_results(more_results)
    }

    fn is_exhausted(&self) -> bool {
        self.sets.is_empty()
    }
}

#[derive(Default)]
struct Inner {
    results: HashMap<String, Vec<ResultSet>>,
    cursors: HashMap<String, Execution>,
    cursor_counter: u64,
    stmt_counter: u64,
    submits: usize,
    releases: usize,
}

/// Executor backed by registered result sets.
///
/// # Example
///
/// ```
/// use zero_query::memory::{MemoryExecutor, ResultSet};
/// use zero_query::{Column, Statement, Value};
///
/// let mut executor = MemoryExecutor::new().with_result_set(
///     "SELECT n FROM t",
///     ResultSet::new([Column::new("n")]).with_rows((1..=5).map(|n| vec![Value::Int(n)])),
/// );
/// let stmt = executor.prepare("SELECT n FROM t").unwrap();
///
/// let mut query = zero_query::sync::Query::new(&mut executor, Statement::prepared(&stmt, ()));
/// query.fetch(2).unwrap();
/// assert_eq!(query.execute().unwrap().len(), 2);
/// assert!(query.has_more());
/// query.close().unwrap();
/// ```
#[derive(Default)]
pub struct MemoryExecutor {
    inner: Mutex<Inner>,
    faults: SegQueue<Fault>,
    broken: AtomicBool,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the result of `sql`.
    ///
    /// Registering the same text again appends another result set, so a
    /// single statement can produce several results.
    pub fn with_result_set(self, sql: &str, result: ResultSet) -> Self {
        self.add_result_set(sql, result);
        self
    }

    /// Register the result of `sql` on a shared executor.
    pub fn add_result_set(&self, sql: &str, result: ResultSet) {
        self.lock()
            .results
            .entry(sql.trim().to_string())
            .or_default()
            .push(result);
    }

    /// Prepare and describe a registered statement.
    pub fn prepare(&self, sql: &str) -> Result<PreparedStatement> {
        self.check_connection()?;
        let mut inner = self.lock();
        let columns = inner
            .results
            .get(sql.trim())
            .ok_or_else(|| undefined(sql))?
            .first()
            .map(|set| set.columns.to_vec())
            .filter(|cols| !cols.is_empty());
        inner.stmt_counter += 1;
        Ok(PreparedStatement {
            name: format!("_zq_s_{}", inner.stmt_counter),
            sql: sql.to_string(),
            param_count: count_params(sql),
            columns,
        })
    }

    /// Fail the next submission with `err`.
    ///
    /// A connection-breaking error also marks the executor broken.
    pub fn inject_error(&self, err: Error) {
        self.faults.push(Fault::Error(err));
    }

    /// Drop the connection while the next submission is in flight.
    pub fn disconnect_on_next_submit(&self) {
        self.faults.push(Fault::Disconnect);
    }

    /// Drop the connection now. Every open cursor is lost.
    pub fn disconnect(&self) {
        self.broken.store(true, Ordering::Release);
        self.lock().cursors.clear();
    }

    /// Number of `submit` calls received.
    pub fn submit_count(&self) -> usize {
        self.lock().submits
    }

    /// Number of `release` calls received.
    pub fn release_count(&self) -> usize {
        self.lock().releases
    }

    /// Number of cursors currently open on the server.
    pub fn open_cursor_count(&self) -> usize {
        self.lock().cursors.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_connection(&self) -> Result<()> {
        if self.broken.load(Ordering::Acquire) {
            Err(Error::ConnectionBroken)
        } else {
            Ok(())
        }
    }

    fn submit_now(
        &self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> Result<Fetched> {
        self.lock().submits += 1;
        self.check_connection()?;

        if let Some(fault) = self.faults.pop() {
            match fault {
                Fault::Disconnect => {
                    self.disconnect();
                    return Err(Error::ConnectionBroken);
                }
                Fault::Error(err) => {
                    if err.is_connection_broken() {
                        self.disconnect();
                    }
                    return Err(err);
                }
            }
        }

        let mut inner = self.lock();

        if let Some(cursor) = cursor {
            let execution = inner.cursors.get_mut(cursor.name()).ok_or_else(|| {
                Error::server("34000", format!("portal \"{}\" does not exist", cursor.name()))
            })?;
            let page = execution.next_page(fetch_size);
            if execution.is_exhausted() {
                inner.cursors.remove(cursor.name());
                tracing::trace!("{} exhausted", cursor);
            }
            return Ok(Fetched::page(page));
        }

        let (sets, fetch_size) = match statement {
            Statement::Simple(sql) => {
                let mut sets = VecDeque::new();
                for part in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                    let results = inner.results.get(part).ok_or_else(|| undefined(part))?;
                    sets.extend(results.iter().cloned());
                }
                // Simple queries are never suspended.
                (sets, FetchSize::UNBOUNDED)
            }
            Statement::Prepared { statement, params } => {
                if params.len() != statement.param_count {
                    return Err(Error::server(
                        "08P01",
                        format!(
                            "bind message supplies {} parameters, but prepared statement \"{}\" requires {}",
                            params.len(),
                            statement.name,
                            statement.param_count
                        ),
                    ));
                }
                let results = inner
                    .results
                    .get(statement.sql.trim())
                    .ok_or_else(|| undefined(&statement.sql))?;
                (results.iter().cloned().collect(), fetch_size)
            }
        };

        let mut execution = Execution { sets, offset: 0 };
        let page = execution.next_page(fetch_size);
        if execution.is_exhausted() {
            return Ok(Fetched::page(page));
        }

        inner.cursor_counter += 1;
        let name = format!("_zq_c_{}", inner.cursor_counter);
        tracing::trace!("opened cursor {:?}", name);
        inner.cursors.insert(name.clone(), execution);
        Ok(Fetched::with_cursor(page, CursorHandle::new(name)))
    }

    fn release_now(&self, cursor: CursorHandle) -> Result<()> {
        self.check_connection()?;
        let mut inner = self.lock();
        inner.releases += 1;
        if inner.cursors.remove(cursor.name()).is_none() {
            // Already closed by the server after its last page
            tracing::trace!("{} was already closed", cursor);
        }
        Ok(())
    }
}

fn undefined(sql: &str) -> Error {
    Error::server("42P01", format!("no result registered for {:?}", sql.trim()))
}

/// Highest `$n` placeholder in `sql`.
fn count_params(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut max = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let mut n = 0usize;
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                n = n * 10 + usize::from(bytes[j] - b'0');
                j += 1;
            }
            max = max.max(n);
            i = j;
        } else {
            i += 1;
        }
    }
    max
}

#[cfg(feature = "sync")]
impl crate::sync::QueryExecutor for MemoryExecutor {
    fn submit(
        &mut self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> Result<Fetched> {
        self.submit_now(statement, fetch_size, cursor)
    }

    fn release(&mut self, cursor: CursorHandle) -> Result<()> {
        self.release_now(cursor)
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

/// Lets a blocking query borrow the executor while the test still inspects
/// counters or injects faults through a shared reference.
#[cfg(feature = "sync")]
impl crate::sync::QueryExecutor for &MemoryExecutor {
    fn submit(
        &mut self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> Result<Fetched> {
        self.submit_now(statement, fetch_size, cursor)
    }

    fn release(&mut self, cursor: CursorHandle) -> Result<()> {
        self.release_now(cursor)
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}

#[cfg(feature = "tokio")]
impl crate::tokio::QueryExecutor for MemoryExecutor {
    async fn submit(
        &self,
        statement: &Statement,
        fetch_size: FetchSize,
        cursor: Option<&CursorHandle>,
    ) -> Result<Fetched> {
        // Complete on a later poll, like a reply from the server.
        tokio::task::yield_now().await;
        self.submit_now(statement, fetch_size, cursor)
    }

    async fn release(&self, cursor: CursorHandle) -> Result<()> {
        tokio::task::yield_now().await;
        self.release_now(cursor)
    }

    fn is_broken(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }
}
