use std::sync::Arc;

use mysql_async::{Row, Value};

use crate::results::ResultSet;
use crate::types::DbValue;

fn value_to_db(value: Value) -> DbValue {
    match value {
        Value::NULL => DbValue::Null,
        Value::Int(i) => DbValue::Int(i),
        Value::UInt(u) => i64::try_from(u)
            .map(DbValue::Int)
            .unwrap_or_else(|_| DbValue::Text(u.to_string())),
        Value::Float(f) => DbValue::Float(f64::from(f)),
        Value::Double(d) => DbValue::Float(d),
        // The text protocol ships strings as bytes; fall back to a blob
        // when they are not UTF-8.
        Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => DbValue::Text(s),
            Err(e) => DbValue::Blob(e.into_bytes()),
        },
        Value::Date(y, mo, d, h, mi, s, us) => {
            chrono::NaiveDate::from_ymd_opt(i32::from(y), u32::from(mo), u32::from(d))
                .and_then(|date| {
                    date.and_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us)
                })
                .map_or(DbValue::Null, DbValue::Timestamp)
        }
        Value::Time(neg, days, h, mi, s, us) => {
            let sign = if neg { "-" } else { "" };
            let hours = days * 24 + u32::from(h);
            DbValue::Text(format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}"))
        }
    }
}

/// Collect driver rows into a [`ResultSet`], preserving driver-native row
/// and column order. An empty row list yields an empty set.
pub(crate) fn build_result_set(rows: Vec<Row>) -> ResultSet {
    let mut result_set = ResultSet::with_capacity(rows.len());
    let Some(first) = rows.first() else {
        return result_set;
    };

    let column_names: Vec<String> = first
        .columns_ref()
        .iter()
        .map(|col| col.name_str().to_string())
        .collect();
    let column_count = column_names.len();
    result_set.set_column_names(Arc::new(column_names));

    for mut row in rows {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row.take::<Value, _>(idx).unwrap_or(Value::NULL);
            values.push(value_to_db(value));
        }
        result_set.add_row_values(values);
    }

    result_set
}
