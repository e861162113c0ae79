use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::SqlMapperError;
use crate::naming::normalize_column_name;
use crate::registry::TypeMappings;
use crate::types::RowValues;

use super::FromRow;

/// Normalized column keys of a result set, shared by all of its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicColumns {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl DynamicColumns {
    /// Normalize every column name.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError::DuplicateColumn` if two columns normalize to the same key.
    pub fn new(columns: &[String]) -> Result<Self, SqlMapperError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let key = normalize_column_name(column);
            if index.insert(key.clone(), i).is_some() {
                return Err(SqlMapperError::DuplicateColumn(key));
            }
            names.push(key);
        }
        Ok(DynamicColumns { names, index })
    }
}

/// A row from a query result as a bag of named values.
///
/// Lookups are case- and punctuation-insensitive; values keep column order.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRow {
    columns: Arc<DynamicColumns>,
    values: Vec<RowValues>,
}

impl DynamicRow {
    #[must_use]
    pub fn new(columns: Arc<DynamicColumns>, values: Vec<RowValues>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column name, in any spelling that normalizes to the column key.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use sql_mapper::prelude::*;
    ///
    /// let columns = Arc::new(DynamicColumns::new(&["User_Name".to_string()]).unwrap());
    /// let row = DynamicRow::new(columns, vec![RowValues::Text("ada".into())]);
    /// assert_eq!(row.get("username"), Some(&RowValues::Text("ada".into())));
    /// assert_eq!(row.get("missing"), None);
    /// ```
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RowValues> {
        let idx = self.columns.index.get(&normalize_column_name(name))?;
        self.values.get(*idx)
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Normalized column keys in column order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.columns
            .names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for DynamicRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl FromRow for DynamicRow {
    type Plan = Arc<DynamicColumns>;

    fn plan(columns: &[String]) -> Result<Self::Plan, SqlMapperError> {
        DynamicColumns::new(columns).map(Arc::new)
    }

    fn from_row(
        plan: &Self::Plan,
        row: &[RowValues],
        _mappings: &TypeMappings,
    ) -> Result<Option<Self>, SqlMapperError> {
        Ok(Some(DynamicRow::new(Arc::clone(plan), row.to_vec())))
    }
}
