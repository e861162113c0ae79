use chrono::DateTime;
use rusqlite::types::ValueRef;
use rusqlite::{Rows, Statement};

use crate::error::SqlMapperError;
use crate::executor::Cursor;
use crate::params::ParameterBinding;
use crate::types::{RowValues, parse_timestamp};

use super::params::bind_parameters;

/// How a column's text values are read, from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnHint {
    Plain,
    Timestamp,
    Json,
}

impl ColumnHint {
    fn from_decl_type(decl_type: Option<&str>) -> Self {
        let Some(decl) = decl_type.map(str::to_ascii_uppercase) else {
            return ColumnHint::Plain;
        };
        if decl.contains("DATE") || decl.contains("TIME") {
            ColumnHint::Timestamp
        } else if decl.contains("JSON") {
            ColumnHint::Json
        } else {
            ColumnHint::Plain
        }
    }
}

/// Extract a `RowValues` from a `SQLite` row.
fn extract_value(
    row: &rusqlite::Row<'_>,
    idx: usize,
    hint: ColumnHint,
) -> Result<RowValues, SqlMapperError> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => RowValues::Null,
        ValueRef::Integer(i) => RowValues::Int(i),
        ValueRef::Real(f) => RowValues::Float(f),
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(rusqlite::Error::Utf8Error)?
                .to_owned();
            match hint {
                ColumnHint::Plain => RowValues::Text(s),
                ColumnHint::Timestamp => parse_timestamp(&s)
                    .map(RowValues::Timestamp)
                    .or_else(|| {
                        DateTime::parse_from_rfc3339(&s)
                            .ok()
                            .map(RowValues::TimestampTz)
                    })
                    .unwrap_or(RowValues::Text(s)),
                ColumnHint::Json => match serde_json::from_str(&s) {
                    Ok(json) => RowValues::JSON(json),
                    Err(_) => RowValues::Text(s),
                },
            }
        }
        ValueRef::Blob(b) => RowValues::Blob(b.to_vec()),
    })
}

/// Live cursor over a prepared `SQLite` statement.
///
/// The statement is reset when the cursor is dropped.
pub struct SqliteCursor<'s> {
    columns: Vec<String>,
    hints: Vec<ColumnHint>,
    rows: Rows<'s>,
}

impl<'s> SqliteCursor<'s> {
    /// Bind `params` and start the query.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the parameters cannot be bound.
    pub fn open(
        stmt: &'s mut Statement<'_>,
        params: &[ParameterBinding],
    ) -> Result<Self, SqlMapperError> {
        let (columns, hints): (Vec<String>, Vec<ColumnHint>) = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), ColumnHint::from_decl_type(c.decl_type())))
            .unzip();
        bind_parameters(stmt, params)?;
        Ok(SqliteCursor {
            columns,
            hints,
            rows: stmt.raw_query(),
        })
    }
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlMapperError> {
        let Some(row) = self.rows.next()? else {
            return Ok(None);
        };
        let mut values = Vec::with_capacity(self.hints.len());
        for (idx, hint) in self.hints.iter().enumerate() {
            values.push(extract_value(row, idx, *hint)?);
        }
        Ok(Some(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn declared_types_shape_text_values() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (at DATETIME, doc JSON, note TEXT);
             INSERT INTO t VALUES ('2024-02-03 04:05:06', '{\"a\":1}', '2024-02-03');",
        )
        .unwrap();

        let mut stmt = conn.prepare("SELECT at, doc, note FROM t").unwrap();
        let mut cursor = SqliteCursor::open(&mut stmt, &[]).unwrap();
        assert_eq!(cursor.columns(), ["at", "doc", "note"]);

        let row = cursor.next_row().unwrap().unwrap();
        assert!(matches!(row[0], RowValues::Timestamp(_)));
        assert_eq!(row[1], RowValues::JSON(serde_json::json!({"a": 1})));
        assert_eq!(row[2], RowValues::Text("2024-02-03".into()));
        assert!(cursor.next_row().unwrap().is_none());
    }

    #[test]
    fn expressions_have_no_declared_type() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT 1 + 1, 2.5, NULL, x'0102'").unwrap();
        let mut cursor = SqliteCursor::open(&mut stmt, &[]).unwrap();
        assert_eq!(
            cursor.next_row().unwrap(),
            Some(vec![
                RowValues::Int(2),
                RowValues::Float(2.5),
                RowValues::Null,
                RowValues::Blob(vec![1, 2]),
            ])
        );
    }

    #[test]
    fn invalid_utf8_text_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT CAST(x'66ff6f' AS TEXT)").unwrap();
        let mut cursor = SqliteCursor::open(&mut stmt, &[]).unwrap();
        let err = cursor.next_row().unwrap_err();
        assert!(
            matches!(err, SqlMapperError::SqliteError(rusqlite::Error::Utf8Error(_))),
            "{err:?}"
        );
    }
}
