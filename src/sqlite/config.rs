use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SqlMapperError;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
#[allow(clippy::cast_sign_loss)]
const MAX_BUSY_TIMEOUT_MS: u64 = i32::MAX as u64;

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteOptions {
    /// File path, or `:memory:`.
    pub db_path: String,
    #[serde(default = "default_journal_wal")]
    pub journal_wal: bool,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_journal_wal() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            journal_wal: default_journal_wal(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// In-memory database. WAL does not apply to it.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            journal_wal: false,
            ..Self::new(":memory:")
        }
    }

    #[must_use]
    pub fn builder(db_path: impl Into<String>) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Open and configure a connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError::ConfigError` if the timeout is out of range, or
    /// `SqlMapperError::SqliteError` if the database cannot be opened or configured.
    pub fn open(&self) -> Result<Connection, SqlMapperError> {
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(SqlMapperError::ConfigError(format!(
                "busy timeout of {}ms is too large",
                self.busy_timeout_ms
            )));
        }

        let conn = Connection::open(&self.db_path)?;
        conn.busy_timeout(std::time::Duration::from_millis(self.busy_timeout_ms))?;
        if self.journal_wal {
            conn.execute_batch(
                "
            PRAGMA journal_mode = WAL;
        ",
            )?;
        }
        debug!(db_path = %self.db_path, wal = self.journal_wal, "opened sqlite connection");
        Ok(conn)
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn journal_wal(mut self, journal_wal: bool) -> Self {
        self.opts.journal_wal = journal_wal;
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.opts.busy_timeout_ms = busy_timeout_ms;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Finish and open the connection.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the connection cannot be opened.
    pub fn open(self) -> Result<Connection, SqlMapperError> {
        self.finish().open()
    }
}
