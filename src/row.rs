//! Rows, column metadata and typed row decoding.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{FromValue, Value, decode};

/// PostgreSQL type OID.
pub type Oid = u32;

/// Column description shared by all rows of a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Data type OID (0 if unknown)
    pub type_oid: Oid,
}

impl Column {
    /// Create a column with an unknown type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_oid: 0,
        }
    }

    /// Set the data type OID.
    pub fn with_type_oid(mut self, type_oid: Oid) -> Self {
        self.type_oid = type_oid;
        self
    }
}

/// One row of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[Column]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[Column]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Decode the value at `idx`.
    pub fn get<'a, T: FromValue<'a>>(&'a self, idx: usize) -> Result<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            Error::Decode(format!(
                "column index {} out of range ({} columns)",
                idx,
                self.values.len()
            ))
        })?;
        decode(value)
    }

    /// Decode the value at `idx`, or `None` if the row has no such column.
    pub fn try_get<'a, T: FromValue<'a>>(&'a self, idx: usize) -> Result<Option<T>> {
        self.values.get(idx).map(decode::<T>).transpose()
    }

    /// Decode the value of the first column named `name`.
    pub fn get_by_name<'a, T: FromValue<'a>>(&'a self, name: &str) -> Result<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| Error::Decode(format!("no column named {:?}", name)))?;
        self.get(idx)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Trait for decoding a row into a Rust type.
pub trait FromRow<'a>: Sized {
    fn from_row(row: &'a Row) -> Result<Self>;
}

/// Implementation for empty tuple - used for statements that don't return rows
impl FromRow<'_> for () {
    fn from_row(_row: &Row) -> Result<Self> {
        Ok(())
    }
}

impl FromRow<'_> for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

macro_rules! impl_from_row_tuple {
    ($count:literal: $($idx:tt => $T:ident),+) => {
        impl<'a, $($T: FromValue<'a>),+> FromRow<'a> for ($($T,)+) {
            fn from_row(row: &'a Row) -> Result<Self> {
                if row.len() < $count {
                    return Err(Error::Decode("not enough columns for tuple".into()));
                }
                Ok(($(row.get::<$T>($idx)?,)+))
            }
        }
    };
}

impl_from_row_tuple!(1: 0 => T1);
impl_from_row_tuple!(2: 0 => T1, 1 => T2);
impl_from_row_tuple!(3: 0 => T1, 1 => T2, 2 => T3);
impl_from_row_tuple!(4: 0 => T1, 1 => T2, 2 => T3, 3 => T4);
impl_from_row_tuple!(5: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5);
impl_from_row_tuple!(6: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6);
impl_from_row_tuple!(7: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7);
impl_from_row_tuple!(8: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8);
impl_from_row_tuple!(9: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9);
impl_from_row_tuple!(10: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10);
impl_from_row_tuple!(11: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10, 10 => T11);
impl_from_row_tuple!(12: 0 => T1, 1 => T2, 2 => T3, 3 => T4, 4 => T5, 5 => T6, 6 => T7, 7 => T8, 8 => T9, 9 => T10, 10 => T11, 11 => T12);
