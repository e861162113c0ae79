//! Entry points: bind parameters, run a statement, map its rows.

use tracing::{debug, trace};

use crate::error::SqlMapperError;
use crate::executor::{Cursor, Executor, MappedCursor};
use crate::mapping::{DynamicRow, FromRow, FromScalar};
use crate::params::{ParameterBinding, Params, normalize_params};
use crate::registry::TypeMappings;

/// Maps parameters out to and rows back from an [`Executor`].
///
/// Each mapper owns its [`TypeMappings`]; two mappers never share overrides.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let conn = SqliteOptions::in_memory().open().unwrap();
/// let mapper = SqlMapper::new();
/// let sums: Vec<i32> = mapper.query(&conn, "SELECT 1 + 1", ()).unwrap();
/// assert_eq!(sums, vec![2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlMapper {
    mappings: TypeMappings,
}

impl SqlMapper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mappings(mappings: TypeMappings) -> Self {
        Self { mappings }
    }

    #[must_use]
    pub fn mappings(&self) -> &TypeMappings {
        &self.mappings
    }

    pub fn mappings_mut(&mut self) -> &mut TypeMappings {
        &mut self.mappings
    }

    /// Normalize parameters through this mapper's type mappings.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError::ParameterError` if a value cannot be normalized.
    pub fn bind(&self, params: impl Into<Params>) -> Result<Vec<ParameterBinding>, SqlMapperError> {
        normalize_params(&params.into(), &self.mappings)
    }

    /// Run a query and map every row to `T`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if binding, execution or mapping fails.
    pub fn query<T, E>(
        &self,
        executor: &E,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Vec<T>, SqlMapperError>
    where
        T: FromRow,
        E: Executor + ?Sized,
    {
        let bindings = self.bind(params)?;
        debug!(sql = %sql, params = bindings.len(), "mapping query");
        let mut items = Vec::new();
        executor.query(sql, &bindings, &mut |cursor: &mut dyn Cursor| {
            items = self.map_rows::<T, _>(cursor)?;
            Ok(())
        })?;
        Ok(items)
    }

    /// Run a query and map only the first item.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if binding, execution or mapping fails.
    pub fn query_first<T, E>(
        &self,
        executor: &E,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Option<T>, SqlMapperError>
    where
        T: FromRow,
        E: Executor + ?Sized,
    {
        let bindings = self.bind(params)?;
        debug!(sql = %sql, params = bindings.len(), "mapping first row");
        let mut first = None;
        executor.query(sql, &bindings, &mut |cursor: &mut dyn Cursor| {
            first = MappedCursor::<_, T>::new(cursor, &self.mappings)
                .next()
                .transpose()?;
            Ok(())
        })?;
        Ok(first)
    }

    /// Run a query and return every row as a [`DynamicRow`].
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError::DuplicateColumn` if two columns normalize to the same name, or
    /// any binding or execution error.
    pub fn query_dynamic<E: Executor + ?Sized>(
        &self,
        executor: &E,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Vec<DynamicRow>, SqlMapperError> {
        self.query::<DynamicRow, E>(executor, sql, params)
    }

    /// First column of the first row, through the scalar conversion matrix.
    ///
    /// `None` when there are no rows or the value has no conversion to `T`.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if binding or execution fails.
    pub fn query_scalar<T, E>(
        &self,
        executor: &E,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<Option<T>, SqlMapperError>
    where
        T: FromScalar,
        E: Executor + ?Sized,
    {
        let bindings = self.bind(params)?;
        debug!(sql = %sql, params = bindings.len(), "mapping scalar");
        let mut scalar = None;
        executor.query(sql, &bindings, &mut |cursor: &mut dyn Cursor| {
            if let Some(row) = cursor.next_row()? {
                scalar = crate::mapping::scalar_from_row::<T>(&row);
            } else {
                trace!("scalar query returned no rows");
            }
            Ok(())
        })?;
        Ok(scalar)
    }

    /// Run a statement and return the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if binding or execution fails.
    pub fn execute<E: Executor + ?Sized>(
        &self,
        executor: &E,
        sql: &str,
        params: impl Into<Params>,
    ) -> Result<usize, SqlMapperError> {
        let bindings = self.bind(params)?;
        debug!(sql = %sql, params = bindings.len(), "executing statement");
        executor.execute(sql, &bindings)
    }

    /// Run one statement once per parameter set, in order, and sum the affected rows.
    ///
    /// Nothing is wrapped in a transaction: when a run fails, earlier runs stay applied.
    ///
    /// # Errors
    ///
    /// Returns the first binding or execution error.
    pub fn execute_many<E, I, P>(
        &self,
        executor: &E,
        sql: &str,
        param_sets: I,
    ) -> Result<usize, SqlMapperError>
    where
        E: Executor + ?Sized,
        I: IntoIterator<Item = P>,
        P: Into<Params>,
    {
        let mut total = 0;
        for (i, params) in param_sets.into_iter().enumerate() {
            let bindings = self.bind(params)?;
            debug!(sql = %sql, run = i, params = bindings.len(), "executing batched statement");
            total += executor.execute(sql, &bindings)?;
        }
        Ok(total)
    }

    /// Map every remaining row of `cursor`.
    ///
    /// # Errors
    ///
    /// Returns the first cursor or mapping error.
    pub fn map_rows<T, C>(&self, cursor: &mut C) -> Result<Vec<T>, SqlMapperError>
    where
        T: FromRow,
        C: Cursor + ?Sized,
    {
        MappedCursor::<_, T>::new(cursor, &self.mappings).collect()
    }

    /// Bind `params` to a statement the caller prepared and stream mapped rows from it.
    ///
    /// The statement stays owned by the caller; dropping or closing the returned cursor resets
    /// it for reuse.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the parameters cannot be normalized or bound.
    #[cfg(feature = "sqlite")]
    pub fn open_cursor<'s, T: FromRow>(
        &'s self,
        stmt: &'s mut rusqlite::Statement<'_>,
        params: impl Into<Params>,
    ) -> Result<MappedCursor<'s, crate::sqlite::SqliteCursor<'s>, T>, SqlMapperError> {
        let bindings = self.bind(params)?;
        debug!(params = bindings.len(), "opening cursor");
        let cursor = crate::sqlite::SqliteCursor::open(stmt, &bindings)?;
        Ok(MappedCursor::new(cursor, &self.mappings))
    }
}
