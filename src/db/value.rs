//! Mapping between libsql values and serde's data model.
//!
//! Rows are decoded through `serde_json::Value` so any `Deserialize` type can
//! be scanned from a result set, and any `Serialize` type can be inserted.

use libsql::{Rows, Value};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value as JsonValue};

use super::DatabaseError;

pub fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::Number(i.into()),
        Value::Real(f) => Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(bytes) => JsonValue::Array(
            bytes
                .into_iter()
                .map(|b| JsonValue::Number(b.into()))
                .collect(),
        ),
    }
}

pub fn from_json(value: JsonValue) -> Result<Value, DatabaseError> {
    Ok(match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Integer(i64::from(b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if n.is_u64() {
                return Err(DatabaseError::Encode(format!(
                    "number {n} does not fit a sqlite integer"
                )));
            } else if let Some(f) = n.as_f64() {
                Value::Real(f)
            } else {
                return Err(DatabaseError::Encode(format!("number {n} is not representable")));
            }
        }
        JsonValue::String(s) => Value::Text(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Text(nested.to_string()),
    })
}

/// Serializes a model into `(column, value)` pairs in field order.
pub fn model_columns<T: Serialize>(model: &T) -> Result<Vec<(String, Value)>, DatabaseError> {
    match serde_json::to_value(model).map_err(|e| DatabaseError::Encode(e.to_string()))? {
        JsonValue::Object(fields) => fields
            .into_iter()
            .map(|(column, value)| Ok((column, from_json(value)?)))
            .collect(),
        other => Err(DatabaseError::Encode(format!(
            "expected a struct or map, got {other}"
        ))),
    }
}

/// Decodes one row. Rows map onto structs by column name; a single-column row
/// also decodes straight into a scalar.
pub fn decode_row<T: DeserializeOwned>(row: Map<String, JsonValue>) -> Result<T, DatabaseError> {
    let lone = if row.len() == 1 {
        row.values().next().cloned()
    } else {
        None
    };
    match serde_json::from_value(JsonValue::Object(row)) {
        Ok(decoded) => Ok(decoded),
        Err(err) => match lone {
            Some(value) => {
                serde_json::from_value(value).map_err(|e| DatabaseError::Decode(e.to_string()))
            }
            None => Err(DatabaseError::Decode(err.to_string())),
        },
    }
}

pub async fn collect_rows(mut rows: Rows) -> Result<Vec<Map<String, JsonValue>>, DatabaseError> {
    let columns: Vec<String> = (0..rows.column_count())
        .map(|idx| {
            rows.column_name(idx)
                .map_or_else(|| format!("column_{idx}"), str::to_string)
        })
        .collect();

    let mut collected = Vec::new();
    while let Some(row) = rows.next().await? {
        let mut fields = Map::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let value = row.get_value(idx as i32)?;
            fields.insert(column.clone(), to_json(value));
        }
        collected.push(fields);
    }
    Ok(collected)
}

/// Renders a value as a SQL literal; used only for statement logging.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("x'{hex}'")
        }
    }
}
