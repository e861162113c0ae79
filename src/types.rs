use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

/// Values that can be read from a database row or used as query parameters.
///
/// Every variant carries its runtime type, which drives both the scalar conversion matrix and the
/// structured field coercer:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// let values = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// assert_eq!(values[0].type_name(), "i64");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// NULL value
    Null,
    Bool(bool),
    TinyInt(i8),
    UTinyInt(u8),
    SmallInt(i16),
    USmallInt(u16),
    Int32(i32),
    UInt32(u32),
    /// Integer value (64-bit)
    Int(i64),
    UInt64(u64),
    Float32(f32),
    /// Floating point value (64-bit)
    Float(f64),
    Char(char),
    /// Text/string value
    Text(String),
    /// Timestamp without an offset annotation
    Timestamp(NaiveDateTime),
    /// Timestamp carrying an offset annotation
    TimestampTz(DateTime<FixedOffset>),
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// Singly-typed list of values
    List(Vec<RowValues>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            RowValues::Null => ValueKind::Null,
            RowValues::Bool(_) => ValueKind::Bool,
            RowValues::TinyInt(_) => ValueKind::I8,
            RowValues::UTinyInt(_) => ValueKind::U8,
            RowValues::SmallInt(_) => ValueKind::I16,
            RowValues::USmallInt(_) => ValueKind::U16,
            RowValues::Int32(_) => ValueKind::I32,
            RowValues::UInt32(_) => ValueKind::U32,
            RowValues::Int(_) => ValueKind::I64,
            RowValues::UInt64(_) => ValueKind::U64,
            RowValues::Float32(_) => ValueKind::F32,
            RowValues::Float(_) => ValueKind::F64,
            RowValues::Char(_) => ValueKind::Char,
            RowValues::Text(_) => ValueKind::Text,
            RowValues::Timestamp(_) => ValueKind::Timestamp,
            RowValues::TimestampTz(_) => ValueKind::TimestampTz,
            RowValues::JSON(_) => ValueKind::Json,
            RowValues::Blob(_) => ValueKind::Blob,
            RowValues::List(_) => ValueKind::List,
        }
    }

    /// Name of the runtime type, `"none"` for NULL.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind().rust_name()
    }

    /// Integer view of any integer variant that fits in an `i64`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RowValues::TinyInt(v) => Some(i64::from(*v)),
            RowValues::UTinyInt(v) => Some(i64::from(*v)),
            RowValues::SmallInt(v) => Some(i64::from(*v)),
            RowValues::USmallInt(v) => Some(i64::from(*v)),
            RowValues::Int32(v) => Some(i64::from(*v)),
            RowValues::UInt32(v) => Some(i64::from(*v)),
            RowValues::Int(v) => Some(*v),
            RowValues::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            RowValues::Float32(value) => Some(f64::from(*value)),
            _ => None,
        }
    }

    /// JSON rendering used for list binding and dynamic row serialization.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Null => JsonValue::Null,
            RowValues::Bool(b) => JsonValue::Bool(*b),
            RowValues::TinyInt(v) => JsonValue::from(*v),
            RowValues::UTinyInt(v) => JsonValue::from(*v),
            RowValues::SmallInt(v) => JsonValue::from(*v),
            RowValues::USmallInt(v) => JsonValue::from(*v),
            RowValues::Int32(v) => JsonValue::from(*v),
            RowValues::UInt32(v) => JsonValue::from(*v),
            RowValues::Int(v) => JsonValue::from(*v),
            RowValues::UInt64(v) => JsonValue::from(*v),
            RowValues::Float32(v) => JsonValue::from(f64::from(*v)),
            RowValues::Float(v) => JsonValue::from(*v),
            RowValues::Char(c) => JsonValue::String(c.to_string()),
            RowValues::Text(s) => JsonValue::String(s.clone()),
            RowValues::Timestamp(_) | RowValues::TimestampTz(_) => {
                JsonValue::String(self.to_string())
            }
            RowValues::JSON(json) => json.clone(),
            RowValues::Blob(bytes) => JsonValue::from(bytes.clone()),
            RowValues::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Inverse of [`RowValues::to_json`] for plain JSON scalars and arrays; objects stay `JSON`.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> RowValues {
        match json {
            JsonValue::Null => RowValues::Null,
            JsonValue::Bool(b) => RowValues::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RowValues::Int(i)
                } else if let Some(u) = n.as_u64() {
                    RowValues::UInt64(u)
                } else {
                    RowValues::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => RowValues::Text(s.clone()),
            JsonValue::Array(items) => RowValues::List(items.iter().map(Self::from_json).collect()),
            JsonValue::Object(_) => RowValues::JSON(json.clone()),
        }
    }
}

/// Parse the text timestamp layouts `SQLite` stores.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    // Try "YYYY-MM-DD HH:MM:SS" with optional fraction
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Stringification used by the string destination of both coercion paths.
impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValues::Null => Ok(()),
            RowValues::Bool(b) => write!(f, "{b}"),
            RowValues::TinyInt(v) => write!(f, "{v}"),
            RowValues::UTinyInt(v) => write!(f, "{v}"),
            RowValues::SmallInt(v) => write!(f, "{v}"),
            RowValues::USmallInt(v) => write!(f, "{v}"),
            RowValues::Int32(v) => write!(f, "{v}"),
            RowValues::UInt32(v) => write!(f, "{v}"),
            RowValues::Int(v) => write!(f, "{v}"),
            RowValues::UInt64(v) => write!(f, "{v}"),
            RowValues::Float32(v) => write!(f, "{v}"),
            RowValues::Float(v) => write!(f, "{v}"),
            RowValues::Char(c) => write!(f, "{c}"),
            RowValues::Text(s) => f.write_str(s),
            RowValues::Timestamp(dt) => write!(f, "{}", dt.format("%F %T%.f")),
            RowValues::TimestampTz(dt) => f.write_str(&dt.to_rfc3339()),
            RowValues::JSON(json) => write!(f, "{json}"),
            RowValues::Blob(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            RowValues::List(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Null => serializer.serialize_none(),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::TinyInt(v) => serializer.serialize_i8(*v),
            RowValues::UTinyInt(v) => serializer.serialize_u8(*v),
            RowValues::SmallInt(v) => serializer.serialize_i16(*v),
            RowValues::USmallInt(v) => serializer.serialize_u16(*v),
            RowValues::Int32(v) => serializer.serialize_i32(*v),
            RowValues::UInt32(v) => serializer.serialize_u32(*v),
            RowValues::Int(v) => serializer.serialize_i64(*v),
            RowValues::UInt64(v) => serializer.serialize_u64(*v),
            RowValues::Float32(v) => serializer.serialize_f32(*v),
            RowValues::Float(v) => serializer.serialize_f64(*v),
            RowValues::Char(c) => serializer.serialize_char(*c),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Timestamp(_) | RowValues::TimestampTz(_) => {
                serializer.serialize_str(&self.to_string())
            }
            RowValues::JSON(json) => json.serialize(serializer),
            RowValues::Blob(bytes) => serializer.serialize_bytes(bytes),
            RowValues::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

/// Runtime type tag of a [`RowValues`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Char,
    Text,
    Timestamp,
    TimestampTz,
    Json,
    Blob,
    List,
}

impl ValueKind {
    #[must_use]
    pub fn rust_name(self) -> &'static str {
        match self {
            ValueKind::Null => "none",
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::U8 => "u8",
            ValueKind::I16 => "i16",
            ValueKind::U16 => "u16",
            ValueKind::I32 => "i32",
            ValueKind::U32 => "u32",
            ValueKind::I64 => "i64",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Char => "char",
            ValueKind::Text => "String",
            ValueKind::Timestamp => "NaiveDateTime",
            ValueKind::TimestampTz => "DateTime<FixedOffset>",
            ValueKind::Json => "serde_json::Value",
            ValueKind::Blob => "Vec<u8>",
            ValueKind::List => "list",
        }
    }

    /// Integer kinds usable as an enum's underlying representation.
    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ValueKind::I8
                | ValueKind::U8
                | ValueKind::I16
                | ValueKind::U16
                | ValueKind::I32
                | ValueKind::U32
                | ValueKind::I64
                | ValueKind::U64
        )
    }
}

/// How a collection is shaped, on either side of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Fixed-length contiguous storage (`[T; N]`, `Box<[T]>`, slices).
    Array,
    /// Concretely typed growable list (`Vec<T>`).
    List,
    /// Any other sequence (`VecDeque<T>`, sets, untyped sequences).
    Sequence,
}

/// Description of an enum destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: &'static str,
    /// Underlying integer representation.
    pub repr: ValueKind,
    /// Member names and discriminants in declaration order.
    pub members: &'static [(&'static str, i64)],
}

impl EnumType {
    #[must_use]
    pub fn discriminant_of(&self, member: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(name, _)| *name == member)
            .map(|(_, value)| *value)
    }

    #[must_use]
    pub fn is_defined(&self, discriminant: i64) -> bool {
        self.members.iter().any(|(_, value)| *value == discriminant)
    }

    /// Encode a discriminant at the enum's underlying width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn repr_value(&self, discriminant: i64) -> RowValues {
        match self.repr {
            ValueKind::I8 => RowValues::TinyInt(discriminant as i8),
            ValueKind::U8 => RowValues::UTinyInt(discriminant as u8),
            ValueKind::I16 => RowValues::SmallInt(discriminant as i16),
            ValueKind::U16 => RowValues::USmallInt(discriminant as u16),
            ValueKind::I32 => RowValues::Int32(discriminant as i32),
            ValueKind::U32 => RowValues::UInt32(discriminant as u32),
            ValueKind::U64 => RowValues::UInt64(discriminant as u64),
            _ => RowValues::Int(discriminant),
        }
    }
}

/// Description of a collection destination.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionType {
    pub name: String,
    pub kind: CollectionKind,
    pub element: Box<SqlType>,
    /// Whether the type can be built from a sequence of its elements.
    pub from_sequence: bool,
}

/// Declared type of a destination field or scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    Scalar(ValueKind),
    Enum(EnumType),
    Collection(CollectionType),
    /// `Option<T>`
    Nullable(Box<SqlType>),
    /// A type only the type mapping registry knows how to produce.
    Custom(&'static str),
}

impl SqlType {
    /// Collection built through `FromIterator`.
    #[must_use]
    pub fn collection(name: &str, kind: CollectionKind, element: SqlType) -> Self {
        SqlType::Collection(CollectionType {
            name: format!("{name}<{}>", element.name()),
            kind,
            element: Box::new(element),
            from_sequence: true,
        })
    }

    /// Iterable type without a sequence constructor; mapping into it always fails.
    #[must_use]
    pub fn opaque_collection(name: &str, element: SqlType) -> Self {
        SqlType::Collection(CollectionType {
            name: name.to_string(),
            kind: CollectionKind::Sequence,
            element: Box::new(element),
            from_sequence: false,
        })
    }

    #[must_use]
    pub fn name(&self) -> String {
        match self {
            SqlType::Scalar(kind) => kind.rust_name().to_string(),
            SqlType::Enum(e) => e.name.to_string(),
            SqlType::Collection(c) => c.name.clone(),
            SqlType::Nullable(inner) => format!("Option<{}>", inner.name()),
            SqlType::Custom(name) => (*name).to_string(),
        }
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self, SqlType::Nullable(_))
    }

    /// Strip any `Option` wrappers.
    #[must_use]
    pub fn unwrap_nullable(&self) -> &SqlType {
        match self {
            SqlType::Nullable(inner) => inner.unwrap_nullable(),
            other => other,
        }
    }

    #[must_use]
    pub fn is_collection_like(&self) -> bool {
        matches!(self.unwrap_nullable(), SqlType::Collection(_))
    }
}

/// Integer types usable as the underlying representation of a mapped enum.
pub trait EnumRepr {
    const KIND: ValueKind;
}

macro_rules! enum_repr {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(impl EnumRepr for $ty {
            const KIND: ValueKind = ValueKind::$kind;
        })*
    };
}

enum_repr!(i8 => I8, u8 => U8, i16 => I16, u16 => U16, i32 => I32, u32 => U32, i64 => I64, u64 => U64);

/// A fieldless enum stored as its integer discriminant. Implemented by [`crate::sql_enum!`].
pub trait SqlEnum: Sized + Copy + 'static {
    fn enum_type() -> EnumType;

    fn discriminant(self) -> i64;

    fn from_discriminant(discriminant: i64) -> Option<Self>;

    /// Member name as declared.
    fn name(self) -> &'static str;

    /// Exact, case-sensitive member lookup.
    fn from_name(name: &str) -> Option<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reports_none_type() {
        assert_eq!(RowValues::Null.type_name(), "none");
        assert_eq!(RowValues::Float32(1.0).type_name(), "f32");
    }

    #[test]
    fn display_formats() {
        let ts = parse_timestamp("2024-01-01 08:00:01").unwrap();
        assert_eq!(RowValues::Timestamp(ts).to_string(), "2024-01-01 08:00:01");
        assert_eq!(RowValues::Blob(vec![0xde, 0xad]).to_string(), "dead");
        assert_eq!(
            RowValues::List(vec![RowValues::Int(1), RowValues::Int(2)]).to_string(),
            "[1,2]"
        );
        assert_eq!(RowValues::Null.to_string(), "");
    }

    #[test]
    fn json_round_trip_of_arrays() {
        let list = RowValues::List(vec![RowValues::Int(3), RowValues::Text("x".into())]);
        assert_eq!(RowValues::from_json(&list.to_json()), list);
    }

    #[test]
    fn sql_type_names() {
        let t = SqlType::Nullable(Box::new(SqlType::collection(
            "Vec",
            CollectionKind::List,
            SqlType::Scalar(ValueKind::U8),
        )));
        assert_eq!(t.name(), "Option<Vec<u8>>");
        assert!(t.is_collection_like());
        assert!(t.is_nullable());
    }
}
