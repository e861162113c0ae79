use rusqlite::Statement;
use rusqlite::types::Value;
use tracing::trace;

use crate::error::SqlMapperError;
use crate::params::{ParamKind, ParameterBinding};
use crate::types::RowValues;

const PLACEHOLDER_MARKERS: [char; 3] = [':', '@', '$'];

/// Convert a single normalized value to a rusqlite `Value`.
///
/// Lists bind as JSON array text and timestamps as `YYYY-MM-DD HH:MM:SS[.fff]` text.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Null => Value::Null,
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::TinyInt(v) => Value::Integer(i64::from(*v)),
        RowValues::UTinyInt(v) => Value::Integer(i64::from(*v)),
        RowValues::SmallInt(v) => Value::Integer(i64::from(*v)),
        RowValues::USmallInt(v) => Value::Integer(i64::from(*v)),
        RowValues::Int32(v) => Value::Integer(i64::from(*v)),
        RowValues::UInt32(v) => Value::Integer(i64::from(*v)),
        RowValues::Int(v) => Value::Integer(*v),
        RowValues::UInt64(v) => Value::Integer(*v as i64),
        RowValues::Float32(v) => Value::Real(f64::from(*v)),
        RowValues::Float(v) => Value::Real(*v),
        RowValues::Char(c) => Value::Text(c.to_string()),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::TimestampTz(dt) => Value::Text(dt.to_rfc3339()),
        RowValues::JSON(json) => Value::Text(json.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::List(_) => Value::Text(value.to_json().to_string()),
    }
}

/// Statement index of a named parameter, trying each placeholder marker when the name has none.
fn parameter_index(stmt: &Statement<'_>, name: &str) -> Result<Option<usize>, SqlMapperError> {
    if name.starts_with(PLACEHOLDER_MARKERS) {
        return Ok(stmt.parameter_index(name)?);
    }
    for marker in PLACEHOLDER_MARKERS {
        if let Some(idx) = stmt.parameter_index(&format!("{marker}{name}"))? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

/// Bind parameters to a prepared statement by name.
///
/// # Errors
///
/// Returns `SqlMapperError::SetupError` if the statement uses positional placeholders while named
/// parameters were supplied, or `SqlMapperError::SqliteError` if binding fails.
pub fn bind_parameters(
    stmt: &mut Statement<'_>,
    params: &[ParameterBinding],
) -> Result<(), SqlMapperError> {
    stmt.clear_bindings();
    if params.is_empty() {
        return Ok(());
    }

    if let Some(idx) = (1..=stmt.parameter_count()).find(|i| stmt.parameter_name(*i).is_none()) {
        return Err(SqlMapperError::SetupError(format!(
            "placeholder {idx} has no name; parameters can only be bound by name"
        )));
    }

    for binding in params {
        let Some(idx) = parameter_index(stmt, &binding.name)? else {
            trace!(param = %binding.name, "parameter not referenced by statement");
            continue;
        };
        let value = match binding.kind {
            ParamKind::DbNull => Value::Null,
            ParamKind::Inferred => to_sqlite_value(&binding.value),
        };
        stmt.raw_bind_parameter(idx, value)?;
    }
    Ok(())
}
