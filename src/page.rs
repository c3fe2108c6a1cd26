//! One batch of rows delivered by a single execute.

use std::sync::Arc;

use crate::error::Result;
use crate::row::{Column, FromRow, Row};
use crate::value::Value;

/// What a query still has pending after a page was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Nothing left; the cursor is closed.
    Done,
    /// The current result set has more rows (PortalSuspended).
    MoreRows,
    /// The current result set is complete and another one follows.
    NextResult,
}

/// Immutable batch of rows returned for one execute call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    columns: Arc<[Column]>,
    rows: Vec<Row>,
    rows_affected: Option<u64>,
    more_rows_available: bool,
    more_results_available: bool,
}

impl ResultPage {
    /// Create a complete page from column metadata and row values.
    pub fn new(columns: impl Into<Arc<[Column]>>, rows: Vec<Vec<Value>>) -> Self {
        let columns: Arc<[Column]> = columns.into();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self {
            columns,
            rows,
            rows_affected: None,
            more_rows_available: false,
            more_results_available: false,
        }
    }

    /// A page with no columns and no rows (empty query, DDL).
    pub fn empty() -> Self {
        Self::new(Vec::<Column>::new(), Vec::new())
    }

    pub fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = Some(rows_affected);
        self
    }

    pub fn with_more_rows(mut self, more: bool) -> Self {
        self.more_rows_available = more;
        self
    }

    pub fn with_more_results(mut self, more: bool) -> Self {
        self.more_results_available = more;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows affected by INSERT/UPDATE/DELETE, from the command completion tag.
    pub fn rows_affected(&self) -> Option<u64> {
        self.rows_affected
    }

    /// The server has more rows of the current result set.
    pub fn more_rows_available(&self) -> bool {
        self.more_rows_available
    }

    /// A subsequent result set exists.
    pub fn more_results_available(&self) -> bool {
        self.more_results_available
    }

    /// Whether another execute is needed to drain the query.
    pub fn has_more(&self) -> bool {
        self.more_rows_available || self.more_results_available
    }

    /// Rows of the current result set come before the next result set.
    pub fn continuation(&self) -> Continuation {
        if self.more_rows_available {
            Continuation::MoreRows
        } else if self.more_results_available {
            Continuation::NextResult
        } else {
            Continuation::Done
        }
    }

    /// Decode all rows.
    pub fn collect<'a, T: FromRow<'a>>(&'a self) -> Result<Vec<T>> {
        self.rows.iter().map(T::from_row).collect()
    }

    /// Decode the first row, if any.
    pub fn first<'a, T: FromRow<'a>>(&'a self) -> Result<Option<T>> {
        self.rows.first().map(T::from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> ResultPage {
        ResultPage::new(
            vec![Column::new("id"), Column::new("name")],
            vec![
                vec![Value::Int(1), Value::Text("a".into())],
                vec![Value::Int(2), Value::Null],
            ],
        )
    }

    #[test]
    fn test_collect_typed_rows() {
        let page = page();
        let rows: Vec<(i32, Option<String>)> = page.collect().unwrap();
        assert_eq!(rows, vec![(1, Some("a".into())), (2, None)]);
        assert_eq!(page.first::<(i64,)>().unwrap(), Some((1,)));
        assert_eq!(page.rows()[1].get_by_name::<i32>("id").unwrap(), 2);
    }

    #[test]
    fn test_continuation() {
        assert_eq!(page().continuation(), Continuation::Done);
        assert!(!page().has_more());

        let p = page().with_more_results(true);
        assert_eq!(p.continuation(), Continuation::NextResult);
        assert!(p.has_more());

        let p = page().with_more_rows(true).with_more_results(true);
        assert_eq!(p.continuation(), Continuation::MoreRows);
    }
}
