//! Seam between the mapper and a database driver.

use std::collections::VecDeque;

use crate::error::SqlMapperError;
use crate::mapping::FromRow;
use crate::params::ParameterBinding;
use crate::registry::TypeMappings;
use crate::types::RowValues;

/// Forward-only, row-at-a-time result handle.
pub trait Cursor {
    /// Column names as reported by the driver.
    fn columns(&self) -> &[String];

    /// Advance to the next row.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the driver fails to produce the row.
    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlMapperError>;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn columns(&self) -> &[String] {
        (**self).columns()
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlMapperError> {
        (**self).next_row()
    }
}

/// Issues commands on behalf of the mapper.
///
/// Implementations own statement and cursor lifetimes: everything they open is released before
/// the call returns.
pub trait Executor {
    /// Run a statement and return the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if preparing, binding or running the statement fails.
    fn execute(&self, sql: &str, params: &[ParameterBinding]) -> Result<usize, SqlMapperError>;

    /// Run a query and hand its cursor to `visit`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the statement fails or `visit` returns an error.
    fn query(
        &self,
        sql: &str,
        params: &[ParameterBinding],
        visit: &mut dyn FnMut(&mut dyn Cursor) -> Result<(), SqlMapperError>,
    ) -> Result<(), SqlMapperError>;
}

/// In-memory cursor over rows the caller already holds.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let mut cursor = VecCursor::new(vec!["n".into()], vec![vec![RowValues::Int(1)]]);
/// assert_eq!(cursor.next_row().unwrap(), Some(vec![RowValues::Int(1)]));
/// assert_eq!(cursor.next_row().unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
}

impl VecCursor {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }
}

impl Cursor for VecCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlMapperError> {
        Ok(self.rows.pop_front())
    }
}

/// A cursor yielding mapped items.
///
/// The mapping plan is built lazily from the column names when the first row arrives and reused
/// for the rest of the cursor. Rows the scalar path cannot convert are skipped.
pub struct MappedCursor<'m, C, T: FromRow> {
    cursor: C,
    mappings: &'m TypeMappings,
    plan: Option<T::Plan>,
}

impl<'m, C: Cursor, T: FromRow> MappedCursor<'m, C, T> {
    pub fn new(cursor: C, mappings: &'m TypeMappings) -> Self {
        Self {
            cursor,
            mappings,
            plan: None,
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.cursor.columns()
    }

    /// Release the underlying cursor.
    pub fn close(self) {
        drop(self);
    }

    fn next_item(&mut self) -> Result<Option<T>, SqlMapperError> {
        while let Some(row) = self.cursor.next_row()? {
            let plan = match self.plan.take() {
                Some(plan) => plan,
                None => T::plan(self.cursor.columns())?,
            };
            let item = T::from_row(&plan, &row, self.mappings);
            self.plan = Some(plan);
            if let Some(item) = item? {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

impl<C: Cursor, T: FromRow> Iterator for MappedCursor<'_, C, T> {
    type Item = Result<T, SqlMapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}
