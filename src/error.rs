use thiserror::Error;

use crate::coercion::ConversionError;

#[derive(Debug, Error)]
pub enum SqlMapperError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    /// The execution layer could not provide a parameter collection for the statement.
    #[error("Setup error: {0}")]
    SetupError(String),

    #[error(
        "Error mapping column to {record}.{field}: cannot convert {source_type} to {dest_type}: {cause}"
    )]
    CoercionFault {
        source_type: String,
        dest_type: String,
        record: String,
        field: String,
        #[source]
        cause: ConversionError,
    },

    #[error("{record}.{field}: {dest_type} has no constructor taking a sequence of its elements")]
    MissingConstructor {
        dest_type: String,
        record: String,
        field: String,
    },

    #[error("{record}.{field}: requested value '{value}' was not found in enum {enum_name}")]
    EnumParse {
        enum_name: String,
        value: String,
        record: String,
        field: String,
    },

    #[error("Duplicate column in result row: {0}")]
    DuplicateColumn(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
