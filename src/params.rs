//! Outbound parameter normalization.
//!
//! Application values are described by [`ToParam`], collected under names in [`Params`], and
//! normalized into database-safe [`RowValues`] by [`normalize_params`].

use std::any::{Any, TypeId};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::SqlMapperError;
use crate::registry::TypeMappings;
use crate::types::{CollectionKind, RowValues, ValueKind};

/// Runtime shape of an application value before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    /// A value that already is one of the runtime types.
    Value(RowValues),
    /// An enum member, as its discriminant at the enum's underlying width.
    Enum(RowValues),
    /// Contiguous bytes (`Vec<u8>`, `&[u8]`, `[u8; N]`).
    Bytes(Vec<u8>),
    /// Any other collection. `element` is the static element type when the collection has one.
    Collection {
        kind: CollectionKind,
        element: Option<TypeId>,
        items: Vec<ParamValue>,
    },
}

/// An application value that can be bound as a query parameter.
///
/// Implementations return `Some(self)` from [`ToParam::mapped`] so the type mapping registry can
/// key on the concrete type; nullable wrappers forward to their inner value.
pub trait ToParam: 'static {
    fn to_param(&self) -> ParamValue;

    /// The value the type mapping registry looks up, `None` for null.
    fn mapped(&self) -> Option<&dyn Any>;
}

/// A record whose readable fields can be enumerated as named parameters.
pub trait ToParams {
    fn to_params(&self) -> Params;
}

/// Ordered name → value mapping of query parameters.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let params = Params::new().add("id", 1_i64).add("name", "alice");
/// assert_eq!(params.names().collect::<Vec<_>>(), ["id", "name"]);
/// ```
#[derive(Default)]
pub struct Params {
    entries: Vec<(String, Box<dyn ToParam>)>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named value.
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, value: impl ToParam) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl ToParam) {
        self.entries.push((name.into(), Box::new(value)));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, value)| (name, value.to_param())))
            .finish()
    }
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::new()
    }
}

impl<T: ToParams> From<&T> for Params {
    fn from(record: &T) -> Self {
        record.to_params()
    }
}

/// How the driver should type a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Let the driver infer the database type from the value.
    Inferred,
    /// Database NULL.
    DbNull,
}

/// One named, normalized parameter ready for the execution layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    /// Name as given by the caller, not normalized.
    pub name: String,
    pub raw: ParamValue,
    pub value: RowValues,
    pub kind: ParamKind,
}

/// Normalize every parameter, consulting `mappings` first.
///
/// # Errors
///
/// Returns `SqlMapperError::ParameterError` if an untyped sequence mixes element types.
pub fn normalize_params(
    params: &Params,
    mappings: &TypeMappings,
) -> Result<Vec<ParameterBinding>, SqlMapperError> {
    params
        .entries
        .iter()
        .map(|(name, value)| {
            let raw = value.to_param();
            let normalized = normalize_param(value.as_ref(), &raw, mappings)
                .map_err(|e| SqlMapperError::ParameterError(format!("{name}: {e}")))?;
            let kind = if normalized.is_null() {
                ParamKind::DbNull
            } else {
                ParamKind::Inferred
            };
            Ok(ParameterBinding {
                name: name.clone(),
                raw,
                value: normalized,
                kind,
            })
        })
        .collect()
}

fn normalize_param(
    param: &dyn ToParam,
    raw: &ParamValue,
    mappings: &TypeMappings,
) -> Result<RowValues, String> {
    if let Some(mapped) = param
        .mapped()
        .and_then(|value| mappings.map_outbound(value))
    {
        return Ok(mapped.unwrap_or(RowValues::Null));
    }
    normalize_value(raw)
}

/// Apply the built-in outbound rules to one value.
///
/// # Errors
///
/// Returns a description of the problem if an untyped sequence mixes element types.
pub fn normalize_value(raw: &ParamValue) -> Result<RowValues, String> {
    match raw {
        ParamValue::Null => Ok(RowValues::Null),
        ParamValue::Enum(discriminant) => Ok(discriminant.clone()),
        ParamValue::Bytes(bytes) => Ok(RowValues::Blob(bytes.clone())),
        ParamValue::Value(value) => normalize_scalar(value),
        ParamValue::Collection {
            kind,
            element,
            items,
        } => normalize_collection(*kind, *element, items),
    }
}

#[allow(clippy::cast_possible_wrap)]
fn normalize_scalar(value: &RowValues) -> Result<RowValues, String> {
    Ok(match value {
        RowValues::UInt32(v) => RowValues::Int32(*v as i32),
        RowValues::UInt64(v) => RowValues::Int(*v as i64),
        RowValues::TimestampTz(dt) => RowValues::Timestamp(dt.naive_local()),
        RowValues::List(items) => {
            RowValues::List(items.iter().map(normalize_scalar).collect::<Result<_, _>>()?)
        }
        other => other.clone(),
    })
}

/// Element shape used to check that an untyped sequence is singly typed.
#[derive(Debug, PartialEq)]
enum Shape {
    Null,
    Value(ValueKind),
    Enum,
    Bytes,
    Collection,
}

fn shape_of(item: &ParamValue) -> Shape {
    match item {
        ParamValue::Null => Shape::Null,
        ParamValue::Value(v) => Shape::Value(v.kind()),
        ParamValue::Enum(_) => Shape::Enum,
        ParamValue::Bytes(_) => Shape::Bytes,
        ParamValue::Collection { .. } => Shape::Collection,
    }
}

fn normalize_collection(
    kind: CollectionKind,
    element: Option<TypeId>,
    items: &[ParamValue],
) -> Result<RowValues, String> {
    let first_value = items.iter().find(|i| !matches!(i, ParamValue::Null));
    if element.is_none() {
        if let Some(first) = first_value {
            let expected = shape_of(first);
            if let Some(odd) = items
                .iter()
                .find(|i| !matches!(i, ParamValue::Null) && shape_of(i) != expected)
            {
                return Err(format!(
                    "{kind:?} mixes element types ({expected:?} and {:?})",
                    shape_of(odd)
                ));
            }
        }
    }

    let is_bytes = match element {
        Some(id) => id == TypeId::of::<u8>(),
        None => matches!(first_value, Some(ParamValue::Value(RowValues::UTinyInt(_)))),
    };
    if is_bytes {
        let bytes = items
            .iter()
            .map(|item| match item {
                ParamValue::Value(RowValues::UTinyInt(b)) => Ok(*b),
                other => Err(format!("expected a byte, found {other:?}")),
            })
            .collect::<Result<Vec<u8>, _>>()?;
        return Ok(RowValues::Blob(bytes));
    }

    Ok(RowValues::List(
        items.iter().map(normalize_value).collect::<Result<_, _>>()?,
    ))
}

macro_rules! scalar_params {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl ToParam for $ty {
            fn to_param(&self) -> ParamValue {
                ParamValue::Value(RowValues::$variant(self.clone()))
            }

            fn mapped(&self) -> Option<&dyn Any> {
                Some(self)
            }
        })*
    };
}

scalar_params!(
    bool => Bool,
    i8 => TinyInt,
    u8 => UTinyInt,
    i16 => SmallInt,
    u16 => USmallInt,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float,
    char => Char,
    String => Text,
    NaiveDateTime => Timestamp,
    DateTime<FixedOffset> => TimestampTz,
    JsonValue => JSON,
);

impl ToParam for &'static str {
    fn to_param(&self) -> ParamValue {
        ParamValue::Value(RowValues::Text((*self).to_string()))
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl ToParam for DateTime<Utc> {
    fn to_param(&self) -> ParamValue {
        ParamValue::Value(RowValues::TimestampTz(self.fixed_offset()))
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Already-normalized values pass through untouched; NULL stays NULL.
impl ToParam for RowValues {
    fn to_param(&self) -> ParamValue {
        if self.is_null() {
            ParamValue::Null
        } else {
            ParamValue::Value(self.clone())
        }
    }

    fn mapped(&self) -> Option<&dyn Any> {
        (!self.is_null()).then_some(self as &dyn Any)
    }
}

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(&self) -> ParamValue {
        self.as_ref().map_or(ParamValue::Null, ToParam::to_param)
    }

    fn mapped(&self) -> Option<&dyn Any> {
        self.as_ref().and_then(ToParam::mapped)
    }
}

fn collection_param<'a, T: ToParam>(
    kind: CollectionKind,
    items: impl IntoIterator<Item = &'a T>,
) -> ParamValue {
    ParamValue::Collection {
        kind,
        element: Some(TypeId::of::<T>()),
        items: items.into_iter().map(ToParam::to_param).collect(),
    }
}

fn as_bytes(items: &dyn Any) -> Option<Vec<u8>> {
    if let Some(v) = items.downcast_ref::<Vec<u8>>() {
        return Some(v.clone());
    }
    items.downcast_ref::<Box<[u8]>>().map(|b| b.to_vec())
}

impl<T: ToParam> ToParam for Vec<T> {
    fn to_param(&self) -> ParamValue {
        as_bytes(self).map_or_else(
            || collection_param(CollectionKind::List, self),
            ParamValue::Bytes,
        )
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<T: ToParam> ToParam for Box<[T]> {
    fn to_param(&self) -> ParamValue {
        as_bytes(self).map_or_else(
            || collection_param(CollectionKind::Array, self.iter()),
            ParamValue::Bytes,
        )
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<T: ToParam, const N: usize> ToParam for [T; N] {
    fn to_param(&self) -> ParamValue {
        collection_param(CollectionKind::Array, self)
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl ToParam for &'static [u8] {
    fn to_param(&self) -> ParamValue {
        ParamValue::Bytes(self.to_vec())
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<T: ToParam> ToParam for VecDeque<T> {
    fn to_param(&self) -> ParamValue {
        collection_param(CollectionKind::Sequence, self)
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<T: ToParam> ToParam for BTreeSet<T> {
    fn to_param(&self) -> ParamValue {
        collection_param(CollectionKind::Sequence, self)
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// A sequence without a static element type; the element type is taken from the first element.
pub struct ParamSeq(pub Vec<Box<dyn ToParam>>);

impl ParamSeq {
    #[must_use]
    pub fn new() -> Self {
        ParamSeq(Vec::new())
    }

    #[must_use]
    pub fn with(mut self, item: impl ToParam) -> Self {
        self.0.push(Box::new(item));
        self
    }
}

impl Default for ParamSeq {
    fn default() -> Self {
        Self::new()
    }
}

impl ToParam for ParamSeq {
    fn to_param(&self) -> ParamValue {
        ParamValue::Collection {
            kind: CollectionKind::Sequence,
            element: None,
            items: self.0.iter().map(|item| item.to_param()).collect(),
        }
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}
