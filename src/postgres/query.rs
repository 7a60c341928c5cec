use std::sync::Arc;

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::DbFacadeError;
use crate::results::ResultSet;
use crate::types::DbValue;

/// Extract one column of a driver row, matched on the column's type name.
fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<DbValue, DbFacadeError> {
    let type_name = row.columns()[idx].type_().name();

    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, |v| DbValue::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, |v| DbValue::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Int))
        }
        "float4" | "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Bool))
        }
        "timestamp" | "timestamptz" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Json))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Blob))
        }
        // Everything else comes back as text
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(DbValue::Null, DbValue::Text))
        }
    }
}

/// Collect driver rows into a [`ResultSet`]. An empty row list yields an
/// empty set.
///
/// # Errors
///
/// Returns driver errors from value extraction.
pub(crate) fn build_result_set_from_rows(
    rows: &[tokio_postgres::Row],
) -> Result<ResultSet, DbFacadeError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    let Some(first) = rows.first() else {
        return Ok(result_set);
    };

    let column_names: Vec<String> = first.columns().iter().map(|c| c.name().to_string()).collect();
    let column_count = column_names.len();
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        result_set.add_row_values(values);
    }

    Ok(result_set)
}
