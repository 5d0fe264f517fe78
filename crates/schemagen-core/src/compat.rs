//! Structural fix-up of exported schemas
//!
//! OpenAPI v3 requires `items` to be a single Schema Object. The exporter
//! emits one schema per observed element instead; this pass collapses such
//! arrays to their first object element and drops the element's `enum` pin.

use serde_json::{Map, Value as JsonValue};

use crate::error::{Result, SchemaError};

/// Rewrite tuple-style `items` everywhere in a raw schema document
pub fn fix_structure(raw: &[u8]) -> Result<Vec<u8>> {
    let mut document: JsonValue = serde_json::from_slice(raw)
        .map_err(|e| SchemaError::decode("cannot unmarshal raw schema", e))?;

    if let JsonValue::Object(map) = &mut document {
        fix_array_items(map);
    }

    serde_json::to_vec(&document)
        .map_err(|e| SchemaError::generation("cannot marshal fixed schema", e))
}

/// Depth-first rewrite of one JSON object and everything below it
pub fn fix_array_items(object: &mut Map<String, JsonValue>) {
    for value in object.values_mut() {
        match value {
            JsonValue::Object(nested) => fix_array_items(nested),
            JsonValue::Null
            | JsonValue::Bool(_)
            | JsonValue::Number(_)
            | JsonValue::String(_)
            | JsonValue::Array(_) => {}
        }
    }

    if object.get("type").and_then(JsonValue::as_str) != Some("array") {
        return;
    }

    let first = match object.get_mut("items") {
        Some(JsonValue::Array(items)) if matches!(items.first(), Some(JsonValue::Object(_))) => {
            items.swap_remove(0)
        }
        _ => return,
    };

    if let JsonValue::Object(mut item) = first {
        fix_array_items(&mut item);
        item.shift_remove("enum");
        object.insert("items".to_string(), JsonValue::Object(item));
    }
}
