//! Per-type conversion overrides.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::types::RowValues;

/// Database value to application value. `None` means the mapped value is null.
pub type Inbound<T> = Box<dyn Fn(&RowValues) -> Option<T> + Send + Sync>;
/// Application value to database value. `None` binds a database NULL.
pub type Outbound<T> = Box<dyn Fn(&T) -> Option<RowValues> + Send + Sync>;

type ErasedInbound = Arc<dyn Fn(&RowValues) -> Option<Box<dyn Any>> + Send + Sync>;
type ErasedOutbound = Arc<dyn Fn(&dyn Any) -> Option<RowValues> + Send + Sync>;

#[derive(Clone)]
struct MappingEntry {
    type_name: &'static str,
    inbound: Option<ErasedInbound>,
    outbound: Option<ErasedOutbound>,
}

/// Type mapping registry consulted before the built-in conversion rules.
///
/// The registry is an explicit context object: a [`crate::SqlMapper`] owns one and passes it to
/// the parameter normalizer and the field coercer. Independent mappers never see each other's
/// overrides.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// #[derive(Debug, PartialEq)]
/// struct Cents(i64);
///
/// let mut mappings = TypeMappings::new();
/// mappings.set::<Cents>(
///     Some(Box::new(|v: &RowValues| v.as_int().map(Cents))),
///     Some(Box::new(|c: &Cents| Some(RowValues::Int(c.0)))),
/// );
/// assert!(mappings.has_inbound::<Cents>());
/// ```
#[derive(Clone, Default)]
pub struct TypeMappings {
    entries: HashMap<TypeId, MappingEntry>,
}

impl TypeMappings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the mapping for `T`, replacing both directions.
    ///
    /// Passing `None` for a direction removes that direction; when both are `None` the entry
    /// disappears and `T` falls back to the built-in rules.
    pub fn set<T: 'static>(&mut self, inbound: Option<Inbound<T>>, outbound: Option<Outbound<T>>) {
        let inbound = inbound.map(|f| -> ErasedInbound {
            Arc::new(move |value: &RowValues| {
                f(value).map(|mapped| Box::new(mapped) as Box<dyn Any>)
            })
        });
        let outbound = outbound.map(|f| -> ErasedOutbound {
            Arc::new(move |value: &dyn Any| value.downcast_ref::<T>().and_then(|v| f(v)))
        });

        let key = TypeId::of::<T>();
        if inbound.is_none() && outbound.is_none() {
            self.entries.remove(&key);
            return;
        }
        self.entries.insert(
            key,
            MappingEntry {
                type_name: std::any::type_name::<T>(),
                inbound,
                outbound,
            },
        );
    }

    /// Drop both directions for `T`.
    pub fn remove<T: 'static>(&mut self) {
        self.entries.remove(&TypeId::of::<T>());
    }

    #[must_use]
    pub fn has_inbound<T: 'static>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|e| e.inbound.is_some())
    }

    #[must_use]
    pub fn has_outbound<T: 'static>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|e| e.outbound.is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply the inbound mapping for `T`.
    ///
    /// Outer `None`: no mapping registered. Inner `None`: the mapping produced null.
    #[must_use]
    pub fn map_inbound<T: 'static>(&self, value: &RowValues) -> Option<Option<T>> {
        let inbound = self.entries.get(&TypeId::of::<T>())?.inbound.as_ref()?;
        Some(inbound(value).and_then(|mapped| mapped.downcast::<T>().ok().map(|b| *b)))
    }

    /// Apply the outbound mapping registered for the concrete type behind `value`.
    ///
    /// Outer `None`: no mapping registered. Inner `None`: the mapping produced null.
    #[must_use]
    pub fn map_outbound(&self, value: &dyn Any) -> Option<Option<RowValues>> {
        let outbound = self.entries.get(&value.type_id())?.outbound.as_ref()?;
        Some(outbound(value))
    }
}

impl fmt::Debug for TypeMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for entry in self.entries.values() {
            list.entry(&format_args!(
                "{} (inbound: {}, outbound: {})",
                entry.type_name,
                entry.inbound.is_some(),
                entry.outbound.is_some()
            ));
        }
        list.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Celsius(f64);

    fn celsius_in() -> Inbound<Celsius> {
        Box::new(|v: &RowValues| v.as_float().map(Celsius))
    }

    fn celsius_out() -> Outbound<Celsius> {
        Box::new(|c: &Celsius| Some(RowValues::Float(c.0)))
    }

    #[test]
    fn both_directions_apply() {
        let mut mappings = TypeMappings::new();
        mappings.set::<Celsius>(Some(celsius_in()), Some(celsius_out()));

        assert_eq!(
            mappings.map_inbound::<Celsius>(&RowValues::Float(21.5)),
            Some(Some(Celsius(21.5)))
        );
        assert_eq!(
            mappings.map_outbound(&Celsius(3.0)),
            Some(Some(RowValues::Float(3.0)))
        );
    }

    #[test]
    fn mapped_null_is_distinct_from_missing_mapping() {
        let mut mappings = TypeMappings::new();
        mappings.set::<Celsius>(Some(celsius_in()), None);

        assert_eq!(
            mappings.map_inbound::<Celsius>(&RowValues::Text("hot".into())),
            Some(None)
        );
        assert_eq!(mappings.map_inbound::<String>(&RowValues::Null), None);
    }

    #[test]
    fn none_removes_only_that_direction() {
        let mut mappings = TypeMappings::new();
        mappings.set::<Celsius>(Some(celsius_in()), Some(celsius_out()));
        mappings.set::<Celsius>(None, Some(celsius_out()));

        assert!(!mappings.has_inbound::<Celsius>());
        assert!(mappings.has_outbound::<Celsius>());
        assert_eq!(mappings.map_inbound::<Celsius>(&RowValues::Float(1.0)), None);

        mappings.set::<Celsius>(None, None);
        assert!(mappings.is_empty());
    }

    #[test]
    fn independent_contexts_do_not_share_entries() {
        let mut first = TypeMappings::new();
        let second = TypeMappings::new();
        first.set::<Celsius>(Some(celsius_in()), None);

        assert_eq!(first.len(), 1);
        assert!(!second.has_inbound::<Celsius>());
    }

    #[test]
    fn outbound_keys_on_concrete_type() {
        let mut mappings = TypeMappings::new();
        mappings.set::<Celsius>(None, Some(celsius_out()));
        assert_eq!(mappings.map_outbound(&42_i64), None);
    }
}
