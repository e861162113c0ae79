#![allow(dead_code)]

use rusqlite::Connection;
use sql_mapper::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for tests
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// In-memory connection with `ddl` applied.
pub fn memory_db(ddl: &str) -> Result<Connection, SqlMapperError> {
    init_logging();
    let conn = SqliteOptions::in_memory().open()?;
    conn.execute_batch(ddl)?;
    Ok(conn)
}
