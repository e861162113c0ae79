//! Structured field coercion: one column value into one declared field type.

use crate::error::SqlMapperError;
use crate::types::{CollectionType, EnumType, RowValues, SqlType, ValueKind};

use super::convert::{ConversionError, change_type};

/// Why a single field could not be coerced. Turned into a [`SqlMapperError`] once the record and
/// field are known.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFault {
    Conversion(ConversionError),
    MissingConstructor,
    EnumParse { enum_name: &'static str, value: String },
}

impl FieldFault {
    #[must_use]
    pub fn into_error(
        self,
        source: &RowValues,
        declared: &SqlType,
        record: &str,
        field: &str,
    ) -> SqlMapperError {
        match self {
            FieldFault::Conversion(cause) => SqlMapperError::CoercionFault {
                source_type: source.type_name().to_string(),
                dest_type: declared.name(),
                record: record.to_string(),
                field: field.to_string(),
                cause,
            },
            FieldFault::MissingConstructor => SqlMapperError::MissingConstructor {
                dest_type: declared.name(),
                record: record.to_string(),
                field: field.to_string(),
            },
            FieldFault::EnumParse { enum_name, value } => SqlMapperError::EnumParse {
                enum_name: enum_name.to_string(),
                value,
                record: record.to_string(),
                field: field.to_string(),
            },
        }
    }
}

impl From<ConversionError> for FieldFault {
    fn from(err: ConversionError) -> Self {
        FieldFault::Conversion(err)
    }
}

/// Coerce a non-null `value` into the shape described by `declared`.
///
/// The result is a value whose runtime type matches `declared` exactly (enums come back as their
/// discriminant at the underlying width, collections as `List` or `Blob`). Registry overrides are
/// applied by the caller before this runs.
///
/// # Errors
///
/// Returns `FieldFault` if no conversion applies.
pub fn coerce_field(value: &RowValues, declared: &SqlType) -> Result<RowValues, FieldFault> {
    match declared {
        SqlType::Nullable(inner) => coerce_field(value, inner),
        SqlType::Scalar(kind) if value.kind() == *kind => Ok(value.clone()),
        SqlType::Enum(enum_type) => coerce_enum(value, enum_type),
        SqlType::Collection(collection) => coerce_collection(value, collection),
        SqlType::Scalar(ValueKind::Text) => Ok(RowValues::Text(value.to_string())),
        SqlType::Scalar(kind) => Ok(change_type(value, *kind)?),
        SqlType::Custom(name) => Err(FieldFault::Conversion(ConversionError::Unsupported {
            source_type: value.type_name(),
            target: (*name).to_string(),
        })),
    }
}

fn coerce_enum(value: &RowValues, enum_type: &EnumType) -> Result<RowValues, FieldFault> {
    let discriminant = match value {
        RowValues::Text(name) => {
            enum_type
                .discriminant_of(name)
                .ok_or_else(|| FieldFault::EnumParse {
                    enum_name: enum_type.name,
                    value: name.clone(),
                })?
        }
        other => {
            let converted = change_type(other, enum_type.repr)?;
            let discriminant = converted.as_int().ok_or(ConversionError::Unsupported {
                source_type: other.type_name(),
                target: enum_type.name.to_string(),
            })?;
            if !enum_type.is_defined(discriminant) {
                return Err(ConversionError::UndefinedMember {
                    value: discriminant,
                    target: enum_type.name,
                }
                .into());
            }
            discriminant
        }
    };
    Ok(enum_type.repr_value(discriminant))
}

fn json_array_items(json: &serde_json::Value) -> Option<Vec<RowValues>> {
    match RowValues::from_json(json) {
        RowValues::List(items) => Some(items),
        _ => None,
    }
}

fn sequence_items(value: &RowValues) -> Result<Vec<RowValues>, ConversionError> {
    let items = match value {
        RowValues::List(items) => Some(items.clone()),
        RowValues::Blob(bytes) => Some(bytes.iter().map(|b| RowValues::UTinyInt(*b)).collect()),
        RowValues::JSON(json) => json_array_items(json),
        RowValues::Text(text) if text.trim_start().starts_with('[') => {
            serde_json::from_str::<serde_json::Value>(text)
                .ok()
                .and_then(|json| json_array_items(&json))
        }
        _ => None,
    };
    items.ok_or(ConversionError::NotASequence {
        source_type: value.type_name(),
    })
}

fn coerce_collection(
    value: &RowValues,
    collection: &CollectionType,
) -> Result<RowValues, FieldFault> {
    if !collection.from_sequence {
        return Err(FieldFault::MissingConstructor);
    }

    let element = collection.element.as_ref();
    if let (RowValues::Blob(_), SqlType::Scalar(ValueKind::U8)) = (value, element) {
        return Ok(value.clone());
    }

    let items = sequence_items(value)?;
    let mut coerced = Vec::with_capacity(items.len());
    for item in &items {
        if item.is_null() {
            if element.is_nullable() {
                coerced.push(RowValues::Null);
                continue;
            }
            return Err(ConversionError::NullElement {
                target: element.name(),
            }
            .into());
        }
        coerced.push(coerce_field(item, element)?);
    }
    Ok(RowValues::List(coerced))
}
