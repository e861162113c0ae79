//! Convenient imports for common functionality.

pub use crate::error::SqlMapperError;
pub use crate::executor::{Cursor, Executor, MappedCursor, VecCursor};
pub use crate::mapper::SqlMapper;
pub use crate::mapping::{
    DynamicColumns, DynamicRow, FieldSetter, FromRecord, FromRow, FromScalar, FromSql,
};
pub use crate::naming::normalize_column_name;
pub use crate::params::{ParamKind, ParamSeq, ParamValue, ParameterBinding, Params, ToParam, ToParams};
pub use crate::registry::{Inbound, Outbound, TypeMappings};
pub use crate::types::{CollectionKind, EnumType, RowValues, SqlEnum, SqlType, ValueKind};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteOptions, SqliteOptionsBuilder};
