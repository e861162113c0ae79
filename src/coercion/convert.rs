//! General-purpose value conversion, the last resort of the structured field coercer.
//!
//! Unlike the scalar matrix this conversion is checked: narrowing that loses information is an
//! error, and text is parsed into numbers, booleans, characters and timestamps.

use chrono::DateTime;
use thiserror::Error;

use crate::types::{RowValues, ValueKind, parse_timestamp};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("value {value} is out of range for {target}")]
    Overflow { value: String, target: &'static str },

    #[error("'{value}' is not a valid {target}")]
    InvalidFormat { value: String, target: &'static str },

    #[error("no conversion from {source_type} to {target}")]
    Unsupported {
        source_type: &'static str,
        target: String,
    },

    #[error("{value} is not a defined member of {target}")]
    UndefinedMember { value: i64, target: &'static str },

    #[error("{source_type} is not a sequence")]
    NotASequence { source_type: &'static str },

    #[error("null element in a sequence of {target}")]
    NullElement { target: String },
}

enum Number {
    Int(i128),
    Float(f64),
}

/// Convert `value` to the runtime type `target`.
///
/// # Errors
///
/// Returns `ConversionError` when the pair is unsupported, the value does not fit, or text does
/// not parse.
pub fn change_type(value: &RowValues, target: ValueKind) -> Result<RowValues, ConversionError> {
    if value.kind() == target {
        return Ok(value.clone());
    }

    match target {
        ValueKind::Text => Ok(RowValues::Text(value.to_string())),
        ValueKind::Bool => to_bool(value),
        ValueKind::Char => to_char(value),
        ValueKind::Timestamp => to_timestamp(value),
        ValueKind::TimestampTz => to_timestamp_tz(value),
        ValueKind::Json => to_json(value),
        ValueKind::F32 | ValueKind::F64 => to_float(value, target),
        kind if kind.is_integer() => to_integer(value, target),
        _ => Err(unsupported(value, target)),
    }
}

fn unsupported(value: &RowValues, target: ValueKind) -> ConversionError {
    ConversionError::Unsupported {
        source_type: value.type_name(),
        target: target.rust_name().to_string(),
    }
}

fn invalid(value: &str, target: ValueKind) -> ConversionError {
    ConversionError::InvalidFormat {
        value: value.to_string(),
        target: target.rust_name(),
    }
}

fn number_of(value: &RowValues) -> Option<Number> {
    Some(match value {
        RowValues::Bool(b) => Number::Int(i128::from(*b)),
        RowValues::TinyInt(v) => Number::Int(i128::from(*v)),
        RowValues::UTinyInt(v) => Number::Int(i128::from(*v)),
        RowValues::SmallInt(v) => Number::Int(i128::from(*v)),
        RowValues::USmallInt(v) => Number::Int(i128::from(*v)),
        RowValues::Int32(v) => Number::Int(i128::from(*v)),
        RowValues::UInt32(v) => Number::Int(i128::from(*v)),
        RowValues::Int(v) => Number::Int(i128::from(*v)),
        RowValues::UInt64(v) => Number::Int(i128::from(*v)),
        RowValues::Char(c) => Number::Int(i128::from(u32::from(*c))),
        RowValues::Float32(v) => Number::Float(f64::from(*v)),
        RowValues::Float(v) => Number::Float(*v),
        _ => return None,
    })
}

fn to_integer(value: &RowValues, target: ValueKind) -> Result<RowValues, ConversionError> {
    let wide = match value {
        RowValues::Text(s) => s.trim().parse::<i128>().map_err(|_| invalid(s, target))?,
        other => match number_of(other) {
            Some(Number::Int(v)) => v,
            Some(Number::Float(f)) => {
                let rounded = f.round_ties_even();
                if !rounded.is_finite() || rounded.abs() > 1e38 {
                    return Err(ConversionError::Overflow {
                        value: f.to_string(),
                        target: target.rust_name(),
                    });
                }
                #[allow(clippy::cast_possible_truncation)]
                let v = rounded as i128;
                v
            }
            None => return Err(unsupported(other, target)),
        },
    };

    narrow_integer(wide, target).ok_or_else(|| ConversionError::Overflow {
        value: wide.to_string(),
        target: target.rust_name(),
    })
}

fn narrow_integer(v: i128, target: ValueKind) -> Option<RowValues> {
    Some(match target {
        ValueKind::I8 => RowValues::TinyInt(i8::try_from(v).ok()?),
        ValueKind::U8 => RowValues::UTinyInt(u8::try_from(v).ok()?),
        ValueKind::I16 => RowValues::SmallInt(i16::try_from(v).ok()?),
        ValueKind::U16 => RowValues::USmallInt(u16::try_from(v).ok()?),
        ValueKind::I32 => RowValues::Int32(i32::try_from(v).ok()?),
        ValueKind::U32 => RowValues::UInt32(u32::try_from(v).ok()?),
        ValueKind::I64 => RowValues::Int(i64::try_from(v).ok()?),
        ValueKind::U64 => RowValues::UInt64(u64::try_from(v).ok()?),
        _ => return None,
    })
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_float(value: &RowValues, target: ValueKind) -> Result<RowValues, ConversionError> {
    let f = match value {
        RowValues::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid(s, target))?,
        RowValues::Char(_) => return Err(unsupported(value, target)),
        other => match number_of(other) {
            Some(Number::Int(v)) => v as f64,
            Some(Number::Float(f)) => f,
            None => return Err(unsupported(other, target)),
        },
    };
    Ok(if target == ValueKind::F32 {
        RowValues::Float32(f as f32)
    } else {
        RowValues::Float(f)
    })
}

fn to_bool(value: &RowValues) -> Result<RowValues, ConversionError> {
    match value {
        RowValues::Text(s) => match s.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(RowValues::Bool(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(RowValues::Bool(false)),
            _ => Err(invalid(s, ValueKind::Bool)),
        },
        RowValues::Char(_) => Err(unsupported(value, ValueKind::Bool)),
        other => match number_of(other) {
            Some(Number::Int(v)) => Ok(RowValues::Bool(v != 0)),
            Some(Number::Float(f)) => Ok(RowValues::Bool(f != 0.0)),
            None => Err(unsupported(other, ValueKind::Bool)),
        },
    }
}

fn to_char(value: &RowValues) -> Result<RowValues, ConversionError> {
    match value {
        RowValues::Text(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(RowValues::Char(c)),
                _ => Err(invalid(s, ValueKind::Char)),
            }
        }
        RowValues::Bool(_) | RowValues::Float32(_) | RowValues::Float(_) => {
            Err(unsupported(value, ValueKind::Char))
        }
        other => match number_of(other) {
            Some(Number::Int(v)) => u32::try_from(v)
                .ok()
                .and_then(char::from_u32)
                .map(RowValues::Char)
                .ok_or_else(|| ConversionError::Overflow {
                    value: v.to_string(),
                    target: ValueKind::Char.rust_name(),
                }),
            _ => Err(unsupported(other, ValueKind::Char)),
        },
    }
}

fn to_timestamp(value: &RowValues) -> Result<RowValues, ConversionError> {
    match value {
        RowValues::TimestampTz(dt) => Ok(RowValues::Timestamp(dt.naive_local())),
        RowValues::Text(s) => parse_timestamp(s.trim())
            .or_else(|| DateTime::parse_from_rfc3339(s.trim()).ok().map(|dt| dt.naive_local()))
            .map(RowValues::Timestamp)
            .ok_or_else(|| invalid(s, ValueKind::Timestamp)),
        other => Err(unsupported(other, ValueKind::Timestamp)),
    }
}

fn to_timestamp_tz(value: &RowValues) -> Result<RowValues, ConversionError> {
    match value {
        RowValues::Text(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(RowValues::TimestampTz)
            .map_err(|_| invalid(s, ValueKind::TimestampTz)),
        other => Err(unsupported(other, ValueKind::TimestampTz)),
    }
}

fn to_json(value: &RowValues) -> Result<RowValues, ConversionError> {
    match value {
        RowValues::Text(s) => serde_json::from_str(s)
            .map(RowValues::JSON)
            .map_err(|_| invalid(s, ValueKind::Json)),
        other => Ok(RowValues::JSON(other.to_json())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_and_checked_narrowing() {
        assert_eq!(
            change_type(&RowValues::Int32(7), ValueKind::I64),
            Ok(RowValues::Int(7))
        );
        assert_eq!(
            change_type(&RowValues::Int(300), ValueKind::U8),
            Err(ConversionError::Overflow {
                value: "300".into(),
                target: "u8"
            })
        );
        assert!(change_type(&RowValues::Int(-1), ValueKind::U32).is_err());
    }

    #[test]
    fn floats_round_half_to_even() {
        assert_eq!(
            change_type(&RowValues::Float(2.5), ValueKind::I32),
            Ok(RowValues::Int32(2))
        );
        assert_eq!(
            change_type(&RowValues::Float(3.5), ValueKind::I32),
            Ok(RowValues::Int32(4))
        );
        assert!(change_type(&RowValues::Float(f64::NAN), ValueKind::I64).is_err());
    }

    #[test]
    fn text_is_parsed() {
        assert_eq!(
            change_type(&RowValues::Text(" 42 ".into()), ValueKind::I16),
            Ok(RowValues::SmallInt(42))
        );
        assert_eq!(
            change_type(&RowValues::Text("TRUE".into()), ValueKind::Bool),
            Ok(RowValues::Bool(true))
        );
        assert_eq!(
            change_type(&RowValues::Text("x".into()), ValueKind::Char),
            Ok(RowValues::Char('x'))
        );
        assert!(matches!(
            change_type(&RowValues::Text("2.5".into()), ValueKind::I32),
            Err(ConversionError::InvalidFormat { .. })
        ));
        assert!(matches!(
            change_type(
                &RowValues::Text("2024-03-01 10:00:00".into()),
                ValueKind::Timestamp
            ),
            Ok(RowValues::Timestamp(_))
        ));
    }

    #[test]
    fn bool_from_numbers_is_plain_nonzero() {
        assert_eq!(
            change_type(&RowValues::Float(0.5), ValueKind::Bool),
            Ok(RowValues::Bool(true))
        );
        assert_eq!(
            change_type(&RowValues::Int(0), ValueKind::Bool),
            Ok(RowValues::Bool(false))
        );
    }

    #[test]
    fn blobs_do_not_become_numbers() {
        assert!(matches!(
            change_type(&RowValues::Blob(vec![1]), ValueKind::I32),
            Err(ConversionError::Unsupported { .. })
        ));
    }
}
