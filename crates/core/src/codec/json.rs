//! JSON schemes (tags 0 and 1)

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::value::{from_value_lenient, to_value, Value};

pub(super) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub(super) fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(data)?)
}

/// Encode with every number rendered as a decimal string.
pub(super) fn encode_stringified<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let value = stringify_numbers(to_value(value)?);
    Ok(serde_json::to_vec(&value)?)
}

/// Decode a stringified payload; numeric targets parse their strings back.
pub(super) fn decode_stringified<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let value: Value = serde_json::from_slice(data)?;
    from_value_lenient(value)
}

pub(super) fn stringify_numbers(value: Value) -> Value {
    match value {
        Value::Int(i) => Value::String(i.to_string()),
        Value::Uint(u) => Value::String(u.to_string()),
        Value::Float(f) => Value::String(f.to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_numbers).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, stringify_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}
