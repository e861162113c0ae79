//! Inbound mapping: database rows into scalars, records and dynamic rows.

mod dynamic;
mod record;

use std::any::Any;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::coercion::{ConversionError, FieldFault, coerce_field, coerce_scalar, stringify_scalar};
use crate::error::SqlMapperError;
use crate::registry::TypeMappings;
use crate::types::{CollectionKind, CollectionType, RowValues, SqlType, ValueKind};

pub use dynamic::{DynamicColumns, DynamicRow};
pub use record::{ColumnSetterMap, FieldSetter, FromRecord, RecordPlan};

/// A type a record field can be declared as.
///
/// [`FromSql::sql_type`] describes the declared type to the field coercer; [`FromSql::from_value`]
/// accepts a value already coerced to exactly that shape.
pub trait FromSql: Sized + 'static {
    fn sql_type() -> SqlType;

    /// Build from a value whose runtime type matches [`FromSql::sql_type`].
    fn from_value(value: RowValues) -> Option<Self>;

    /// Value assigned for a database NULL. `None` leaves the field untouched.
    fn from_null() -> Option<Self> {
        None
    }

    /// Registry lookup. Outer `None`: no inbound mapping for this type.
    fn from_mapped(mappings: &TypeMappings, value: &RowValues) -> Option<Option<Self>> {
        mappings.map_inbound::<Self>(value)
    }
}

/// A type the scalar path can produce from column 0.
pub trait FromScalar: Sized {
    fn from_scalar(value: &RowValues) -> Option<Self>;
}

/// A query result item.
///
/// `Plan` is built once per query from the column names and reused for every row.
pub trait FromRow: Sized {
    type Plan;

    /// # Errors
    ///
    /// Returns `SqlMapperError` if the columns cannot be mapped to this type at all.
    fn plan(columns: &[String]) -> Result<Self::Plan, SqlMapperError>;

    /// Map one row. `Ok(None)` skips the row.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if a column value cannot be coerced into its field.
    fn from_row(
        plan: &Self::Plan,
        row: &[RowValues],
        mappings: &TypeMappings,
    ) -> Result<Option<Self>, SqlMapperError>;
}

/// Decode one non-structured field value.
///
/// `Ok(None)` means nothing should be assigned (a NULL reaching a non-nullable field).
///
/// # Errors
///
/// Returns `FieldFault` if the value cannot be coerced into `F`.
pub fn decode_field<F: FromSql>(
    value: &RowValues,
    mappings: &TypeMappings,
) -> Result<Option<F>, FieldFault> {
    if value.is_null() {
        return Ok(F::from_null());
    }

    match F::from_mapped(mappings, value) {
        Some(Some(mapped)) => return Ok(Some(mapped)),
        Some(None) => return Ok(F::from_null()),
        None => {}
    }

    let declared = F::sql_type();
    let coerced = coerce_field(value, &declared)?;
    F::from_value(coerced).map(Some).ok_or_else(|| {
        FieldFault::Conversion(ConversionError::Unsupported {
            source_type: value.type_name(),
            target: declared.name(),
        })
    })
}

macro_rules! sql_scalars {
    ($($ty:ty => $kind:ident, $variant:ident);* $(;)?) => {
        $(
            impl FromSql for $ty {
                fn sql_type() -> SqlType {
                    SqlType::Scalar(ValueKind::$kind)
                }

                fn from_value(value: RowValues) -> Option<Self> {
                    match value {
                        RowValues::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl FromScalar for $ty {
                fn from_scalar(value: &RowValues) -> Option<Self> {
                    coerce_scalar(value, ValueKind::$kind).and_then(<$ty as FromSql>::from_value)
                }
            }
        )*
    };
}

sql_scalars! {
    bool => Bool, Bool;
    i8 => I8, TinyInt;
    u8 => U8, UTinyInt;
    i16 => I16, SmallInt;
    u16 => U16, USmallInt;
    i32 => I32, Int32;
    u32 => U32, UInt32;
    i64 => I64, Int;
    u64 => U64, UInt64;
    f32 => F32, Float32;
    f64 => F64, Float;
    char => Char, Char;
    NaiveDateTime => Timestamp, Timestamp;
    DateTime<FixedOffset> => TimestampTz, TimestampTz;
}

impl FromSql for String {
    fn sql_type() -> SqlType {
        SqlType::Scalar(ValueKind::Text)
    }

    fn from_value(value: RowValues) -> Option<Self> {
        match value {
            RowValues::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromScalar for String {
    fn from_scalar(value: &RowValues) -> Option<Self> {
        stringify_scalar(value)
    }
}

impl FromSql for JsonValue {
    fn sql_type() -> SqlType {
        SqlType::Scalar(ValueKind::Json)
    }

    fn from_value(value: RowValues) -> Option<Self> {
        match value {
            RowValues::JSON(json) => Some(json),
            _ => None,
        }
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn sql_type() -> SqlType {
        SqlType::Nullable(Box::new(T::sql_type()))
    }

    fn from_value(value: RowValues) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn from_null() -> Option<Self> {
        Some(None)
    }

    fn from_mapped(mappings: &TypeMappings, value: &RowValues) -> Option<Option<Self>> {
        T::from_mapped(mappings, value).map(|mapped| mapped.map(Some))
    }
}

/// Elements of a coerced collection value.
fn collection_items(value: RowValues) -> Option<Vec<RowValues>> {
    match value {
        RowValues::List(items) => Some(items),
        RowValues::Blob(bytes) => Some(bytes.into_iter().map(RowValues::UTinyInt).collect()),
        _ => None,
    }
}

fn collect_from<C, T>(value: RowValues) -> Option<C>
where
    C: FromIterator<T>,
    T: FromSql,
{
    collection_items(value)?
        .into_iter()
        .map(T::from_value)
        .collect()
}

/// `Vec<u8>` read straight from a blob without going element by element.
fn bytes_as<C: 'static>(value: &mut RowValues) -> Option<C> {
    let RowValues::Blob(bytes) = value else {
        return None;
    };
    let boxed: Box<dyn Any> = Box::new(std::mem::take(bytes));
    match boxed.downcast::<C>() {
        Ok(collection) => Some(*collection),
        Err(boxed) => {
            if let Ok(bytes) = boxed.downcast::<Vec<u8>>() {
                *value = RowValues::Blob(*bytes);
            }
            None
        }
    }
}

impl<T: FromSql> FromSql for Vec<T> {
    fn sql_type() -> SqlType {
        SqlType::collection("Vec", CollectionKind::List, T::sql_type())
    }

    fn from_value(mut value: RowValues) -> Option<Self> {
        bytes_as::<Self>(&mut value).or_else(|| collect_from(value))
    }
}

impl<T: FromSql> FromSql for Box<[T]> {
    fn sql_type() -> SqlType {
        let element = T::sql_type();
        SqlType::Collection(CollectionType {
            name: format!("Box<[{}]>", element.name()),
            kind: CollectionKind::Array,
            element: Box::new(element),
            from_sequence: true,
        })
    }

    fn from_value(value: RowValues) -> Option<Self> {
        Vec::<T>::from_value(value).map(Vec::into_boxed_slice)
    }
}

impl<T: FromSql> FromSql for VecDeque<T> {
    fn sql_type() -> SqlType {
        SqlType::collection("VecDeque", CollectionKind::Sequence, T::sql_type())
    }

    fn from_value(value: RowValues) -> Option<Self> {
        collect_from(value)
    }
}

impl<T: FromSql + Ord> FromSql for BTreeSet<T> {
    fn sql_type() -> SqlType {
        SqlType::collection("BTreeSet", CollectionKind::Sequence, T::sql_type())
    }

    fn from_value(value: RowValues) -> Option<Self> {
        collect_from(value)
    }
}

impl<T: FromSql + Eq + Hash> FromSql for HashSet<T> {
    fn sql_type() -> SqlType {
        SqlType::collection("HashSet", CollectionKind::Sequence, T::sql_type())
    }

    fn from_value(value: RowValues) -> Option<Self> {
        collect_from(value)
    }
}

/// Scalar result types read column 0 and skip rows without a conversion.
macro_rules! scalar_rows {
    ($($ty:ty),* $(,)?) => {
        $(impl FromRow for $ty {
            type Plan = ();

            fn plan(_columns: &[String]) -> Result<Self::Plan, SqlMapperError> {
                Ok(())
            }

            fn from_row(
                _plan: &Self::Plan,
                row: &[RowValues],
                _mappings: &TypeMappings,
            ) -> Result<Option<Self>, SqlMapperError> {
                Ok(scalar_from_row::<$ty>(row))
            }
        })*
    };
}

/// Column 0 through the scalar path, tracing skipped rows.
pub fn scalar_from_row<T: FromScalar>(row: &[RowValues]) -> Option<T> {
    let value = row.first().unwrap_or(&RowValues::Null);
    let converted = T::from_scalar(value);
    if converted.is_none() {
        trace!(
            source = value.type_name(),
            target = std::any::type_name::<T>(),
            "skipping row without a scalar conversion"
        );
    }
    converted
}

scalar_rows!(
    bool,
    i8,
    u8,
    i16,
    u16,
    i32,
    u32,
    i64,
    u64,
    f32,
    f64,
    char,
    String,
    NaiveDateTime,
    DateTime<FixedOffset>,
);
