// SQLite execution layer:
// - config: connection options and opening
// - params: binding normalized parameters by name
// - query: the live row cursor
// - executor: the `Executor` implementation for `rusqlite::Connection`

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use params::{bind_parameters, to_sqlite_value};
pub use query::SqliteCursor;
