//! Row to JSON conversion.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

use crate::db::{QueryResult, Value};

/// Converts a warehouse value to JSON.
///
/// Null, booleans, integers, finite floats and strings map directly. Binary
/// data becomes base64 text; every other type becomes its string form.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::String(s) | Value::Opaque(s) => JsonValue::String(s.clone()),
        Value::Bytes(bytes) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Converts every row of a result into a JSON object keyed by column name.
///
/// Keys keep the result's column order. When two columns share a name the
/// later one wins.
pub fn rows_to_json(result: &QueryResult) -> Vec<Map<String, JsonValue>> {
    result
        .rows
        .iter()
        .map(|row| {
            let mut object = Map::with_capacity(result.columns.len());
            for (column, value) in result.columns.iter().zip(row) {
                object.insert(column.name.clone(), value_to_json(value));
            }
            object
        })
        .collect()
}
