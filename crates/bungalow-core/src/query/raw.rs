//! Strict parser for the raw JSON `filter` parameter.
//!
//! Accepted shapes:
//!
//! ```text
//! { "field": scalar }
//! { "field": { "$eq" | "$gt" | "$gte" | "$lt" | "$lte": scalar } }
//! { "field": { "$in": [scalar, ...] } }
//! { "field": { "$regex": "pattern", "$options": "i" } }
//! { "$and": [filter, ...] }
//! { "$or": [filter, ...] }
//! ```
//!
//! Anything else is rejected rather than forwarded to the store.

use serde_json::{Map, Value};

use crate::error::{BungalowError, BungalowResult};

use super::filter::{CompareOp, Predicate};
use super::schema::{FieldSpec, ResourceSchema};

pub fn parse_raw_filter(raw: &str, schema: &'static ResourceSchema) -> BungalowResult<Predicate> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| BungalowError::validation(format!("Invalid filter parameter format: {e}")))?;
    parse_object(&value, schema)
}

fn parse_object(value: &Value, schema: &'static ResourceSchema) -> BungalowResult<Predicate> {
    let Value::Object(map) = value else {
        return Err(BungalowError::validation("Filter must be a JSON object."));
    };

    let mut parts = Vec::with_capacity(map.len());
    for (key, operand) in map {
        let part = match key.as_str() {
            "$and" => Predicate::And(parse_list(operand, schema)?),
            "$or" => Predicate::Or(parse_list(operand, schema)?),
            k if k.starts_with('$') => {
                return Err(BungalowError::validation(format!(
                    "Unsupported filter operator: {k}."
                )));
            }
            field => parse_field(schema.require_field(field)?, operand)?,
        };
        parts.push(part);
    }

    Ok(if parts.len() == 1 {
        parts.remove(0)
    } else {
        Predicate::And(parts)
    })
}

fn parse_list(value: &Value, schema: &'static ResourceSchema) -> BungalowResult<Vec<Predicate>> {
    let Value::Array(items) = value else {
        return Err(BungalowError::validation("$and/$or expect an array."));
    };
    if items.is_empty() {
        return Err(BungalowError::validation("$and/$or expect at least one clause."));
    }
    items.iter().map(|item| parse_object(item, schema)).collect()
}

fn parse_field(field: &'static FieldSpec, operand: &Value) -> BungalowResult<Predicate> {
    match operand {
        Value::Object(ops) => parse_operators(field, ops),
        Value::Array(_) | Value::Null => Err(BungalowError::validation(format!(
            "Unsupported operand for {}.",
            field.name
        ))),
        scalar => Ok(Predicate::Equals {
            field,
            value: field.kind.cast_json(field.name, scalar)?,
        }),
    }
}

fn parse_operators(field: &'static FieldSpec, ops: &Map<String, Value>) -> BungalowResult<Predicate> {
    if ops.is_empty() {
        return Err(BungalowError::validation(format!(
            "Empty operator object for {}.",
            field.name
        )));
    }

    let mut parts = Vec::new();
    for (op, operand) in ops {
        match op.as_str() {
            "$regex" => {
                let Value::String(pattern) = operand else {
                    return Err(BungalowError::validation("$regex expects a string."));
                };
                parts.push(Predicate::regex(field, pattern)?);
            }
            "$options" => match operand {
                Value::String(o) if o == "i" => {}
                _ => return Err(BungalowError::validation("Only the \"i\" regex option is supported.")),
            },
            "$in" => {
                let Value::Array(items) = operand else {
                    return Err(BungalowError::validation("$in expects an array."));
                };
                let values = items
                    .iter()
                    .map(|v| field.kind.cast_json(field.name, v))
                    .collect::<BungalowResult<Vec<_>>>()?;
                parts.push(Predicate::OneOf { field, values });
            }
            other => {
                let op = other
                    .strip_prefix('$')
                    .and_then(CompareOp::from_token)
                    .ok_or_else(|| {
                        BungalowError::validation(format!("Unsupported filter operator: {other}."))
                    })?;
                parts.push(Predicate::compare(
                    field,
                    op,
                    field.kind.cast_json(field.name, operand)?,
                )?);
            }
        }
    }

    match parts.len() {
        0 => Err(BungalowError::validation("$options needs a $regex.")),
        1 => Ok(parts.remove(0)),
        _ => Ok(Predicate::And(parts)),
    }
}
