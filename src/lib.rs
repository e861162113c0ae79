//! Maps application values to query parameters and database rows back to typed values.
//!
//! ```rust
//! use sql_mapper::prelude::*;
//!
//! #[derive(Debug, Default, Clone)]
//! struct Device {
//!     device_id: i64,
//!     name: String,
//! }
//! sql_mapper::impl_record!(Device { device_id, name });
//!
//! let conn = SqliteOptions::in_memory().open()?;
//! let mapper = SqlMapper::new();
//! mapper.execute(&conn, "CREATE TABLE devices (device_id INTEGER, name TEXT)", ())?;
//! mapper.execute(
//!     &conn,
//!     "INSERT INTO devices VALUES (:device_id, :name)",
//!     &Device { device_id: 1, name: "probe".into() },
//! )?;
//!
//! let devices: Vec<Device> = mapper.query(&conn, "SELECT * FROM devices", ())?;
//! assert_eq!(devices[0].name, "probe");
//! # Ok::<(), SqlMapperError>(())
//! ```

pub mod coercion;
pub mod error;
pub mod executor;
mod macros;
pub mod mapper;
pub mod mapping;
pub mod naming;
pub mod params;
pub mod prelude;
pub mod registry;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

pub use error::SqlMapperError;
pub use executor::{Cursor, Executor, MappedCursor, VecCursor};
pub use mapper::SqlMapper;
pub use mapping::{DynamicRow, FromRow, FromScalar, FromSql};
pub use naming::normalize_column_name;
pub use params::{ParamSeq, Params, ToParam, ToParams};
pub use registry::TypeMappings;
pub use types::{RowValues, SqlEnum, SqlType, ValueKind};
