//! Payload ↔ item conversion (spec §4.6).
//!
//! Normalizes arbitrary JSON into `[item]`, where an item is a string-keyed
//! map. This is a pure function, called at integration boundaries and by the
//! usage collector — no I/O, no engine state.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single unit of data flow: a string-keyed map of arbitrary JSON values.
pub type Item = Map<String, Value>;

/// Errors from decoding or serializing a payload.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("payload is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("value could not be serialized to JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Decode a raw payload (JSON-encoded bytes) into a sequence of items.
pub fn bytes_to_items(payload: &[u8]) -> Result<Vec<Item>, ValueError> {
    let value: Value = serde_json::from_slice(payload).map_err(ValueError::Decode)?;
    Ok(value_to_items(value))
}

/// Normalize an already-decoded JSON value into a sequence of items, per the
/// spec §4.6 table:
///
/// | Input shape                | Rule |
/// |-----------------------------|------|
/// | null                        | `[]` |
/// | sequence                    | recurse on each element, flatten |
/// | map                         | `[item]` (a JSON object is already item-shaped) |
/// | string that parses as JSON  | recurse on the decoded value |
/// | string that does not parse  | `[{"value": <string>}]` |
/// | number / bool                | `[{"value": <scalar>}]` |
#[must_use]
pub fn value_to_items(value: Value) -> Vec<Item> {
    match value {
        Value::Null => vec![],
        Value::Array(elements) => elements.into_iter().flat_map(value_to_items).collect(),
        Value::Object(item) => vec![item],
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(decoded) => value_to_items(decoded),
            Err(_) => vec![scalar_item(Value::String(s))],
        },
        Value::Number(_) | Value::Bool(_) => vec![scalar_item(value)],
    }
}

/// Serialize a struct or other nominal record into items, by first
/// round-tripping it through `serde_json::Value` (the "struct / nominal
/// record" row of the §4.6 table) and then applying the same normalization
/// as any other JSON value.
pub fn to_items<T: Serialize>(value: &T) -> Result<Vec<Item>, ValueError> {
    let json = serde_json::to_value(value).map_err(ValueError::Serialize)?;
    Ok(value_to_items(json))
}

/// Re-encode a sequence of items as a JSON-array payload. Used to build the
/// bytes that travel along an output handle.
pub fn items_to_payload(items: &[Item]) -> Result<Vec<u8>, ValueError> {
    serde_json::to_vec(items).map_err(ValueError::Serialize)
}

fn scalar_item(value: Value) -> Item {
    let mut item = Map::new();
    item.insert("value".to_string(), value);
    item
}
