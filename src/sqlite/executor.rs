use rusqlite::Connection;
use tracing::debug;

use crate::error::SqlMapperError;
use crate::executor::{Cursor, Executor};
use crate::params::ParameterBinding;

use super::params::bind_parameters;
use super::query::SqliteCursor;

/// Each call prepares its own statement and drops it before returning. A `rusqlite::Transaction`
/// can be used through `&*tx`.
impl Executor for Connection {
    fn execute(&self, sql: &str, params: &[ParameterBinding]) -> Result<usize, SqlMapperError> {
        let mut stmt = self.prepare(sql)?;
        bind_parameters(&mut stmt, params)?;
        let affected = stmt.raw_execute()?;
        debug!(affected, "sqlite execute finished");
        Ok(affected)
    }

    fn query(
        &self,
        sql: &str,
        params: &[ParameterBinding],
        visit: &mut dyn FnMut(&mut dyn Cursor) -> Result<(), SqlMapperError>,
    ) -> Result<(), SqlMapperError> {
        let mut stmt = self.prepare(sql)?;
        let mut cursor = SqliteCursor::open(&mut stmt, params)?;
        visit(&mut cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Params, normalize_params};
    use crate::registry::TypeMappings;

    #[test]
    fn transactions_execute_through_deref() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();

        let tx = conn.transaction().unwrap();
        let params = normalize_params(&Params::new().add("v", 3_i32), &TypeMappings::new()).unwrap();
        assert_eq!(
            Executor::execute(&*tx, "INSERT INTO t VALUES (:v)", &params).unwrap(),
            1
        );
        tx.rollback().unwrap();

        let mut seen = 0;
        Executor::query(&conn, "SELECT v FROM t", &[], &mut |cursor: &mut dyn Cursor| {
            while cursor.next_row()?.is_some() {
                seen += 1;
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, 0);
    }
}
