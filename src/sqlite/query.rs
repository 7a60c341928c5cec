use std::sync::Arc;

use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::DbFacadeError;
use crate::results::ResultSet;
use crate::types::DbValue;

fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<DbValue, DbFacadeError> {
    let value: Value = row.get(idx).map_err(DbFacadeError::SqliteError)?;
    Ok(match value {
        Value::Null => DbValue::Null,
        Value::Integer(i) => DbValue::Int(i),
        Value::Real(f) => DbValue::Float(f),
        Value::Text(s) => DbValue::Text(s),
        Value::Blob(b) => DbValue::Blob(b),
    })
}

/// Run a prepared statement and collect its rows. Bind values were already
/// interpolated, so the statement executes with no parameters.
///
/// # Errors
///
/// Returns driver errors from execution or value extraction.
pub(crate) fn build_result_set(stmt: &mut Statement) -> Result<ResultSet, DbFacadeError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}
