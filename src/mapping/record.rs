use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::coercion::FieldFault;
use crate::error::SqlMapperError;
use crate::naming::normalize_column_name;
use crate::registry::TypeMappings;
use crate::types::{RowValues, SqlType};

use super::{FromSql, decode_field};

type Assign<T> = Box<dyn Fn(&mut T, &RowValues, &TypeMappings) -> Result<(), FieldFault>>;

/// A settable field of a structured record.
pub struct FieldSetter<T> {
    name: &'static str,
    declared: SqlType,
    assign: Assign<T>,
}

impl<T: 'static> FieldSetter<T> {
    /// Describe a field of type `F` written by `set`.
    ///
    /// ```rust
    /// use sql_mapper::prelude::*;
    ///
    /// #[derive(Default)]
    /// struct Device {
    ///     name: String,
    /// }
    ///
    /// let setter = FieldSetter::new("name", |d: &mut Device, v: String| d.name = v);
    /// assert_eq!(setter.name(), "name");
    /// ```
    pub fn new<F, S>(name: &'static str, set: S) -> Self
    where
        F: FromSql,
        S: Fn(&mut T, F) + 'static,
    {
        FieldSetter {
            name,
            declared: F::sql_type(),
            assign: Box::new(move |record, value, mappings| {
                if let Some(decoded) = decode_field::<F>(value, mappings)? {
                    set(record, decoded);
                }
                Ok(())
            }),
        }
    }
}

impl<T> FieldSetter<T> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn declared(&self) -> &SqlType {
        &self.declared
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.declared.is_nullable()
    }

    #[must_use]
    pub fn is_collection_like(&self) -> bool {
        self.declared.is_collection_like()
    }

    /// Coerce `value` into this field of `record`.
    ///
    /// # Errors
    ///
    /// Returns the coercion fault annotated with the record and field names.
    pub fn assign(
        &self,
        record: &mut T,
        value: &RowValues,
        mappings: &TypeMappings,
    ) -> Result<(), SqlMapperError> {
        (self.assign)(record, value, mappings)
            .map_err(|fault| fault.into_error(value, &self.declared, record_name::<T>(), self.name))
    }
}

impl<T> fmt::Debug for FieldSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSetter")
            .field("name", &self.name)
            .field("declared", &self.declared.name())
            .finish_non_exhaustive()
    }
}

/// Short type name used in error messages.
fn record_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A structured record: default-constructible with independently settable fields.
///
/// Usually implemented through [`crate::impl_record!`].
pub trait FromRecord: Default + 'static {
    /// Fields in declaration order.
    fn fields() -> Vec<FieldSetter<Self>>;
}

/// Normalized column name to field setter, for one destination type.
pub struct ColumnSetterMap<T> {
    setters: Vec<FieldSetter<T>>,
    index: HashMap<String, usize>,
}

impl<T: FromRecord> ColumnSetterMap<T> {
    /// Build from the record's field table. When two fields normalize to the same key the first
    /// declared one wins.
    #[must_use]
    pub fn build() -> Self {
        let setters = T::fields();
        let mut index = HashMap::with_capacity(setters.len());
        for (i, setter) in setters.iter().enumerate() {
            index.entry(normalize_column_name(setter.name)).or_insert(i);
        }
        ColumnSetterMap { setters, index }
    }
}

impl<T> ColumnSetterMap<T> {
    /// Setter for a column name, in any spelling that normalizes to the field's key.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&FieldSetter<T>> {
        self.position(column).map(|i| &self.setters[i])
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.index.get(&normalize_column_name(column)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Per-query mapping of column positions to field setters.
pub struct RecordPlan<T> {
    setters: ColumnSetterMap<T>,
    slots: Vec<Option<usize>>,
}

impl<T: FromRecord> RecordPlan<T> {
    #[must_use]
    pub fn new(columns: &[String]) -> Self {
        let setters = ColumnSetterMap::<T>::build();
        let slots = columns
            .iter()
            .map(|column| {
                let slot = setters.position(column);
                if slot.is_none() {
                    trace!(column = %column, record = record_name::<T>(), "column has no matching field");
                }
                slot
            })
            .collect();
        RecordPlan { setters, slots }
    }

    /// Construct a record and assign every matched column.
    ///
    /// # Errors
    ///
    /// Returns the first coercion fault.
    pub fn map_row(&self, row: &[RowValues], mappings: &TypeMappings) -> Result<T, SqlMapperError> {
        let mut record = T::default();
        for (slot, value) in self.slots.iter().zip(row) {
            if let Some(i) = slot {
                self.setters.setters[*i].assign(&mut record, value, mappings)?;
            }
        }
        Ok(record)
    }
}
