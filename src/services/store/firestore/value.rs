//! JSON <-> Firestore typed value codec.
//!
//! Firestore REST represents every field as a single-key object naming its
//! type (`{"stringValue": "a"}`, `{"integerValue": "42"}`, ...). Documents in
//! this gateway are plain JSON objects, so the mapping is:
//!
//! - null / bool / string map one to one
//! - integers travel as `integerValue` strings, other numbers as `doubleValue`
//! - arrays and objects map to `arrayValue` / `mapValue`
//! - `timestampValue`, `referenceValue` and `bytesValue` decode to strings,
//!   `geoPointValue` to `{latitude, longitude}`
use chrono::DateTime;
use serde_json::{Map, Value, json};

use crate::services::store::client::{Document, StoreError, StoreResult};
use crate::services::store::format_timestamp;

pub fn encode_value(v: &Value) -> Value {
    match v {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(doc: &Document) -> Map<String, Value> {
    doc.iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

fn decode_error(msg: impl Into<String>) -> StoreError {
    StoreError::Decode(msg.into())
}

pub fn decode_value(v: &Value) -> StoreResult<Value> {
    let obj = v
        .as_object()
        .ok_or_else(|| decode_error("firestore value is not an object"))?;
    let (kind, inner) = obj
        .iter()
        .next()
        .ok_or_else(|| decode_error("empty firestore value"))?;

    let decoded = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(
            inner
                .as_bool()
                .ok_or_else(|| decode_error("booleanValue is not a bool"))?,
        ),
        "integerValue" => {
            // int64 is sent as a decimal string, but accept a bare number too.
            let i = match inner {
                Value::String(s) => s
                    .parse::<i64>()
                    .map_err(|e| decode_error(format!("integerValue {s:?}: {e}")))?,
                other => other
                    .as_i64()
                    .ok_or_else(|| decode_error("integerValue is not an integer"))?,
            };
            Value::from(i)
        }
        "doubleValue" => match inner {
            Value::Number(n) => Value::Number(n.clone()),
            // "NaN" / "Infinity" have no JSON number form.
            _ => Value::Null,
        },
        "timestampValue" => {
            let raw = inner
                .as_str()
                .ok_or_else(|| decode_error("timestampValue is not a string"))?;
            let ts = DateTime::parse_from_rfc3339(raw)
                .map_err(|e| decode_error(format!("timestampValue {raw:?}: {e}")))?;
            Value::String(format_timestamp(ts.to_utc()))
        }
        "stringValue" | "referenceValue" | "bytesValue" => Value::String(
            inner
                .as_str()
                .ok_or_else(|| decode_error(format!("{kind} is not a string")))?
                .to_string(),
        ),
        "geoPointValue" => json!({
            "latitude": inner.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": inner.get("longitude").cloned().unwrap_or(json!(0.0)),
        }),
        "arrayValue" => {
            // Empty arrays omit `values`.
            let items = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<StoreResult<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Value::Array(items)
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                _ => Map::new(),
            };
            Value::Object(fields)
        }
        other => return Err(decode_error(format!("unsupported firestore value type {other}"))),
    };

    Ok(decoded)
}

pub fn decode_fields(fields: &Map<String, Value>) -> StoreResult<Document> {
    fields
        .iter()
        .map(|(k, v)| Ok((k.clone(), decode_value(v)?)))
        .collect()
}
