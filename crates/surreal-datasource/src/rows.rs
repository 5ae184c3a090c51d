//! Row conversion between framework rows and SurrealDB records.
//!
//! Outbound rows are coerced per field using the table schema: DATETIME
//! values become native datetimes and BOOLEAN values default to `false`.
//! Inbound records are not coerced; SurrealDB values are only rendered as
//! JSON, since the framework consumes them directly.

use crate::error::{AdapterError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use datasource_types::{FieldType, Row, TableSchema, ID_FIELD};
use std::collections::BTreeMap;
use surrealdb::sql::{Array, Datetime, Number, Object, Strand, Value};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Convert a framework row to a SurrealDB record for `schema`.
///
/// Only schema fields are copied and `id` is never written. A missing row
/// yields an empty record.
pub fn to_external(schema: &TableSchema, row: Option<&Row>) -> Result<BTreeMap<String, Value>> {
    let mut record = BTreeMap::new();
    let Some(row) = row else {
        return Ok(record);
    };

    for field in schema.iter().filter(|f| f.name != ID_FIELD) {
        let name = field.name.as_str();
        let value = row.get(name);

        let converted = match field.field_type {
            FieldType::Datetime => match value {
                Some(v) => Some(coerce_datetime(name, v)?),
                None => None,
            },
            FieldType::Boolean => match value {
                None | Some(serde_json::Value::Null) => Some(Value::Bool(false)),
                Some(v) => Some(json_to_surreal(v.clone())),
            },
            _ => value.cloned().map(json_to_surreal),
        };

        if let Some(converted) = converted {
            record.insert(name.to_string(), converted);
        }
    }

    Ok(record)
}

/// Wrap a converted record as bindable `CONTENT`.
pub fn to_content(record: BTreeMap<String, Value>) -> Value {
    Value::Object(Object::from(record))
}

/// Convert a SurrealDB record to a framework row.
///
/// Values pass through unchanged apart from their JSON rendering; record
/// ids become `table:key` strings.
pub fn to_framework(_schema: &TableSchema, record: Value) -> Row {
    match record.into_json() {
        serde_json::Value::Object(map) => map,
        other => {
            tracing::debug!("Ignoring non-object record in result: {other}");
            Row::new()
        }
    }
}

/// Convert a single JSON value to a SurrealDB value.
pub fn json_to_surreal(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(Number::Int(i))
            } else if let Some(f) = n.as_f64() {
                Value::Number(Number::Float(f))
            } else {
                Value::Strand(Strand::from(n.to_string()))
            }
        }
        serde_json::Value::String(s) => Value::Strand(Strand::from(s)),
        serde_json::Value::Array(arr) => {
            let values: Vec<Value> = arr.into_iter().map(json_to_surreal).collect();
            Value::Array(Array::from(values))
        }
        serde_json::Value::Object(map) => {
            let obj: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, json_to_surreal(v)))
                .collect();
            Value::Object(Object::from(obj))
        }
    }
}

fn coerce_datetime(field: &str, value: &serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::String(s) => parse_datetime(s)
            .map(|dt| Value::Datetime(Datetime::from(dt)))
            .ok_or_else(|| AdapterError::invalid_value(field, format!("'{s}' is not a datetime"))),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| Value::Datetime(Datetime::from(dt)))
            .ok_or_else(|| {
                AdapterError::invalid_value(field, format!("{n} is not a millisecond timestamp"))
            }),
        other => Err(AdapterError::invalid_value(
            field,
            format!("expected a datetime string or timestamp, got {other}"),
        )),
    }
}

/// Parse the datetime representations the framework sends.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}
