//! Field projection and relation expansion over serialized documents.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::directives::Projection;
use super::schema::ResourceSchema;

/// Apply a projection to a serialized document. The id always survives.
pub fn project(doc: Value, projection: &Projection, schema: &ResourceSchema) -> Value {
    let Value::Object(map) = doc else {
        return doc;
    };

    let kept: Map<String, Value> = match projection {
        Projection::Default => map
            .into_iter()
            .filter(|(k, _)| !schema.internal_fields.contains(&k.as_str()))
            .collect(),
        Projection::Fields(fields) => map
            .into_iter()
            .filter(|(k, _)| k == "id" || fields.contains(&k.as_str()))
            .collect(),
    };
    Value::Object(kept)
}

/// Keep only `fields` (and the id) of a related document.
pub fn select_fields(doc: Value, fields: &[&str]) -> Value {
    match doc {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| k == "id" || fields.contains(&k.as_str()))
                .collect(),
        ),
        other => other,
    }
}

/// Replace the reference stored under `path` with the related document,
/// or `null` when the referenced document is gone.
pub fn expand(doc: &mut Value, path: &str, related: &HashMap<String, Value>) {
    let Some(slot) = doc.as_object_mut().and_then(|m| m.get_mut(path)) else {
        return;
    };
    let resolved = slot
        .as_str()
        .and_then(|id| related.get(id))
        .cloned()
        .unwrap_or(Value::Null);
    *slot = resolved;
}

/// Reference ids found under `path` across a page of documents.
pub fn reference_ids(docs: &[Value], path: &str) -> Vec<String> {
    let mut ids: Vec<String> = docs
        .iter()
        .filter_map(|d| d.get(path).and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}
