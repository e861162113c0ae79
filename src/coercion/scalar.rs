//! Scalar conversion matrix used when a query maps to a single primitive, enum, string or date.
//!
//! Conversions here never fail loudly: a pair outside the matrix produces `None` and the caller
//! skips the row.

use crate::types::{EnumType, RowValues, ValueKind};

#[derive(Clone, Copy)]
enum Source {
    Int(i64),
    Float(f64),
}

fn matrix_source(value: &RowValues) -> Option<Source> {
    Some(match value {
        RowValues::Int32(v) => Source::Int(i64::from(*v)),
        RowValues::Int(v) => Source::Int(*v),
        RowValues::SmallInt(v) => Source::Int(i64::from(*v)),
        RowValues::TinyInt(v) => Source::Int(i64::from(*v)),
        RowValues::UTinyInt(v) => Source::Int(i64::from(*v)),
        RowValues::Float32(v) => Source::Float(f64::from(*v)),
        RowValues::Float(v) => Source::Float(*v),
        _ => return None,
    })
}

/// Convert `value` to `target` through the scalar matrix.
///
/// Integer narrowing truncates (two's complement), float to integer truncates toward zero and
/// saturates. A boolean from an integer is `value != 0`; a boolean from a float is false only
/// strictly inside `(-1, 1)`.
///
/// ```rust
/// use sql_mapper::coercion::coerce_scalar;
/// use sql_mapper::prelude::*;
///
/// assert_eq!(coerce_scalar(&RowValues::Int(2), ValueKind::U32), Some(RowValues::UInt32(2)));
/// assert_eq!(coerce_scalar(&RowValues::Float(0.5), ValueKind::Bool), Some(RowValues::Bool(false)));
/// assert_eq!(coerce_scalar(&RowValues::Text("2".into()), ValueKind::I32), None);
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]
pub fn coerce_scalar(value: &RowValues, target: ValueKind) -> Option<RowValues> {
    if value.kind() == target {
        return Some(value.clone());
    }

    match matrix_source(value)? {
        Source::Int(v) => Some(match target {
            ValueKind::I32 => RowValues::Int32(v as i32),
            ValueKind::U32 => RowValues::UInt32(v as u32),
            ValueKind::I64 => RowValues::Int(v),
            ValueKind::U64 => RowValues::UInt64(v as u64),
            ValueKind::I16 => RowValues::SmallInt(v as i16),
            ValueKind::U16 => RowValues::USmallInt(v as u16),
            ValueKind::I8 => RowValues::TinyInt(v as i8),
            ValueKind::U8 => RowValues::UTinyInt(v as u8),
            ValueKind::Bool => RowValues::Bool(v != 0),
            ValueKind::F32 => RowValues::Float32(v as f32),
            ValueKind::F64 => RowValues::Float(v as f64),
            ValueKind::Char => RowValues::Char(char::from_u32(u32::from(v as u16))?),
            _ => return None,
        }),
        Source::Float(v) => Some(match target {
            ValueKind::I32 => RowValues::Int32(v as i32),
            ValueKind::U32 => RowValues::UInt32(v as u32),
            ValueKind::I64 => RowValues::Int(v as i64),
            ValueKind::U64 => RowValues::UInt64(v as u64),
            ValueKind::I16 => RowValues::SmallInt(v as i16),
            ValueKind::U16 => RowValues::USmallInt(v as u16),
            ValueKind::I8 => RowValues::TinyInt(v as i8),
            ValueKind::U8 => RowValues::UTinyInt(v as u8),
            ValueKind::Bool => RowValues::Bool(!(v < 1.0 && v > -1.0)),
            ValueKind::F32 => RowValues::Float32(v as f32),
            ValueKind::F64 => RowValues::Float(v),
            ValueKind::Char => RowValues::Char(char::from_u32(u32::from(v as u16))?),
            _ => return None,
        }),
    }
}

/// Reinterpret `value` as a member of `enum_type` without any name lookup.
///
/// Returns the discriminant encoded at the enum's underlying width, or `None` when the value is
/// not numeric or not a defined member.
#[must_use]
pub fn coerce_enum_scalar(value: &RowValues, enum_type: &EnumType) -> Option<RowValues> {
    let discriminant = coerce_scalar(value, ValueKind::I64)?.as_int()?;
    enum_type
        .is_defined(discriminant)
        .then(|| enum_type.repr_value(discriminant))
}

/// String destination: stringify anything but NULL.
#[must_use]
pub fn stringify_scalar(value: &RowValues) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES: [RowValues; 7] = [
        RowValues::Int32(2),
        RowValues::Int(2),
        RowValues::SmallInt(2),
        RowValues::TinyInt(2),
        RowValues::UTinyInt(2),
        RowValues::Float32(2.0),
        RowValues::Float(2.0),
    ];

    #[test]
    fn every_numeric_pair_converts_a_small_value() {
        let expected = [
            (ValueKind::I32, RowValues::Int32(2)),
            (ValueKind::U32, RowValues::UInt32(2)),
            (ValueKind::I64, RowValues::Int(2)),
            (ValueKind::U64, RowValues::UInt64(2)),
            (ValueKind::I16, RowValues::SmallInt(2)),
            (ValueKind::U16, RowValues::USmallInt(2)),
            (ValueKind::I8, RowValues::TinyInt(2)),
            (ValueKind::U8, RowValues::UTinyInt(2)),
            (ValueKind::F32, RowValues::Float32(2.0)),
            (ValueKind::F64, RowValues::Float(2.0)),
            (ValueKind::Bool, RowValues::Bool(true)),
            (ValueKind::Char, RowValues::Char('\u{2}')),
        ];
        for source in &SOURCES {
            for (target, want) in &expected {
                assert_eq!(
                    coerce_scalar(source, *target).as_ref(),
                    Some(want),
                    "{source:?} -> {target:?}"
                );
            }
        }
    }

    #[test]
    fn narrowing_truncates_like_twos_complement() {
        assert_eq!(
            coerce_scalar(&RowValues::Int(-1), ValueKind::U32),
            Some(RowValues::UInt32(u32::MAX))
        );
        assert_eq!(
            coerce_scalar(&RowValues::Int(0x1_0000_0005), ValueKind::I32),
            Some(RowValues::Int32(5))
        );
        assert_eq!(
            coerce_scalar(&RowValues::SmallInt(-2), ValueKind::U8),
            Some(RowValues::UTinyInt(254))
        );
    }

    #[test]
    fn bool_rules_differ_for_integers_and_floats() {
        assert_eq!(coerce_scalar(&RowValues::Int(0), ValueKind::Bool), Some(RowValues::Bool(false)));
        assert_eq!(coerce_scalar(&RowValues::Int(-3), ValueKind::Bool), Some(RowValues::Bool(true)));
        assert_eq!(
            coerce_scalar(&RowValues::Float(0.5), ValueKind::Bool),
            Some(RowValues::Bool(false))
        );
        assert_eq!(
            coerce_scalar(&RowValues::Float(-0.99), ValueKind::Bool),
            Some(RowValues::Bool(false))
        );
        assert_eq!(
            coerce_scalar(&RowValues::Float(1.5), ValueKind::Bool),
            Some(RowValues::Bool(true))
        );
        assert_eq!(
            coerce_scalar(&RowValues::Float32(-1.0), ValueKind::Bool),
            Some(RowValues::Bool(true))
        );
    }

    #[test]
    fn out_of_matrix_is_none() {
        assert_eq!(coerce_scalar(&RowValues::Text("1".into()), ValueKind::I32), None);
        assert_eq!(coerce_scalar(&RowValues::Bool(true), ValueKind::I32), None);
        assert_eq!(coerce_scalar(&RowValues::UInt64(1), ValueKind::I32), None);
        assert_eq!(coerce_scalar(&RowValues::Null, ValueKind::I32), None);
        assert_eq!(coerce_scalar(&RowValues::Int(1), ValueKind::Text), None);
        assert_eq!(coerce_scalar(&RowValues::Text("2024-01-01".into()), ValueKind::Timestamp), None);
    }

    #[test]
    fn surrogate_code_units_are_not_chars() {
        assert_eq!(coerce_scalar(&RowValues::Int(0xD800), ValueKind::Char), None);
        assert_eq!(
            coerce_scalar(&RowValues::Int(65), ValueKind::Char),
            Some(RowValues::Char('A'))
        );
    }

    #[test]
    fn enum_reinterpretation() {
        const MEMBERS: &[(&str, i64)] = &[("Low", 1), ("High", 5)];
        let level = EnumType {
            name: "Level",
            repr: ValueKind::U8,
            members: MEMBERS,
        };
        assert_eq!(
            coerce_enum_scalar(&RowValues::Int(5), &level),
            Some(RowValues::UTinyInt(5))
        );
        assert_eq!(coerce_enum_scalar(&RowValues::Int(2), &level), None);
        assert_eq!(coerce_enum_scalar(&RowValues::Text("High".into()), &level), None);
    }

    #[test]
    fn strings_stringify_everything_but_null() {
        assert_eq!(stringify_scalar(&RowValues::Int(12)), Some("12".to_string()));
        assert_eq!(stringify_scalar(&RowValues::Null), None);
    }
}
