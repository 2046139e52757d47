use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::object::DataObject;
use crate::record::Record;
use crate::value::Value;

use super::field_type::{FieldKind, FieldType};

/// Canonical wire form for temporal values: `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Export an entity as a flat record. Columns using the internal naming
/// convention (leading underscore) are dropped; everything else is expected
/// to already be a flat scalar or canonical string from the entity's
/// `export` impl.
pub fn to_record(object: &dyn DataObject) -> Record {
    object
        .export()
        .into_iter()
        .filter(|(column, _)| !column.starts_with('_'))
        .collect()
}

/// Coerce every column of a raw database record to its declared field type
/// before it is handed to the entity's `import`. Columns without a declared
/// type pass through untouched.
pub fn coerce_record(record: &Record, fields: &BTreeMap<String, FieldType>) -> Record {
    record
        .iter()
        .map(|(column, value)| {
            let coerced = match fields.get(column) {
                Some(field_type) => coerce(value, field_type),
                None => value.clone(),
            };
            (column.clone(), coerced)
        })
        .collect()
}

/// Coerce one raw value to a declared field type.
///
/// The fallback chain matters: heterogeneous legacy rows must degrade
/// gracefully instead of failing the whole load. Nullable empties become
/// null; timestamps re-render canonically or fall to null; collections fall
/// to the empty collection; scalars try a direct cast, then a JSON decode of
/// the text form, then the zero value of the declared kind.
pub fn coerce(value: &Value, field_type: &FieldType) -> Value {
    if field_type.nullable && is_empty_wire_value(value) {
        return Value::Null;
    }

    match field_type.kind {
        FieldKind::Timestamp => match decode_timestamp(value) {
            Some(ts) => encode_timestamp(&ts),
            None => Value::Null,
        },
        FieldKind::Collection => coerce_collection(value),
        _ => coerce_scalar(value, field_type.kind),
    }
}

fn is_empty_wire_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        _ => false,
    }
}

fn coerce_collection(value: &Value) -> Value {
    if let Value::Text(s) = value {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(s) {
            if json.is_array() || json.is_object() {
                return value.clone();
            }
        }
    }

    Value::Text("[]".to_string())
}

fn coerce_scalar(value: &Value, kind: FieldKind) -> Value {
    if let Some(cast) = cast_scalar(value, kind) {
        return cast;
    }

    // Direct cast failed; the text may carry an opaque serialized scalar.
    if let Value::Text(s) = value {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(s) {
            if let Some(decoded) = json_scalar(&json) {
                if let Some(cast) = cast_scalar(&decoded, kind) {
                    return cast;
                }
            }
        }
    }

    zero_value(kind)
}

fn cast_scalar(value: &Value, kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Integer => value.as_i64().map(Value::Integer),
        FieldKind::Real => value.as_f64().map(Value::Real),
        FieldKind::Boolean => value.as_bool().map(Value::Boolean),
        FieldKind::Text => match value {
            Value::Null => None,
            other => Some(Value::Text(other.to_string())),
        },
        _ => None,
    }
}

fn json_scalar(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Bool(b) => Some(Value::Boolean(*b)),
        serde_json::Value::String(s) => Some(Value::Text(s.clone())),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::Integer(i))
            } else {
                n.as_f64().map(Value::Real)
            }
        }
        _ => None,
    }
}

fn zero_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Integer => Value::Integer(0),
        FieldKind::Real => Value::Real(0.0),
        FieldKind::Boolean => Value::Boolean(false),
        _ => Value::Text(String::new()),
    }
}

/// Render a timestamp in the canonical wire form.
pub fn encode_timestamp(ts: &PrimitiveDateTime) -> Value {
    match ts.format(TIMESTAMP_FORMAT) {
        Ok(formatted) => Value::Text(formatted),
        Err(_) => Value::Null,
    }
}

/// Parse a canonical-form timestamp value.
pub fn decode_timestamp(value: &Value) -> Option<PrimitiveDateTime> {
    let text = value.as_str()?;
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT).ok()
}

/// Serialize any non-scalar field value to its opaque string form.
pub fn encode_collection<T: Serialize>(value: &T) -> Value {
    match serde_json::to_string(value) {
        Ok(json) => Value::Text(json),
        Err(_) => Value::Text("[]".to_string()),
    }
}

/// Deserialize an opaque string form; empty or failed parses produce the
/// type's default (the empty collection).
pub fn decode_collection<T: DeserializeOwned + Default>(value: &Value) -> T {
    value
        .as_str()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
