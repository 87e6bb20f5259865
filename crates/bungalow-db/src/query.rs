//! Compiles [`Predicate`] trees and sort keys into SurrealQL.
//!
//! Operands never reach the statement text: every value becomes a field
//! of one bound object (`$f`), cast to the column type where SurrealQL
//! will not coerce a JSON scalar by itself. Column names come from the
//! resource schema whitelist, never from the client.

use bungalow_core::query::{FieldKind, FieldSpec, FilterValue, Predicate, SortKey};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

/// Name of the bound object holding filter operands.
pub(crate) const FILTER_VAR: &str = "f";

/// A compiled `WHERE` clause and its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub clause: String,
    pub vars: Map<String, Value>,
}

impl CompiledFilter {
    pub fn vars_value(&self) -> Value {
        Value::Object(self.vars.clone())
    }
}

pub fn compile_filter(filter: &Predicate) -> CompiledFilter {
    let mut compiler = Compiler { vars: Map::new() };
    let clause = compiler.visit(filter);
    CompiledFilter {
        clause,
        vars: compiler.vars,
    }
}

/// ` ORDER BY ...` for the given keys, or an empty string.
pub fn order_clause(sort: &[SortKey]) -> String {
    if sort.is_empty() {
        return String::new();
    }
    let keys: Vec<String> = sort
        .iter()
        .map(|key| {
            let column = match key.field.kind {
                FieldKind::Id => "id",
                _ => key.field.column,
            };
            let direction = if key.descending { "DESC" } else { "ASC" };
            format!("{column} {direction}")
        })
        .collect();
    format!(" ORDER BY {}", keys.join(", "))
}

/// RFC 3339 with a `Z` suffix, the form `<datetime>` casts accept.
pub(crate) fn datetime_text(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

struct Compiler {
    vars: Map<String, Value>,
}

impl Compiler {
    fn visit(&mut self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Equals { field, value } => {
                let param = self.param(value);
                if field.kind == FieldKind::TextList {
                    format!("{} CONTAINS {param}", field.column)
                } else {
                    format!("{} = {param}", column(field))
                }
            }
            Predicate::OneOf { field, values } => {
                if values.is_empty() {
                    return "false".to_string();
                }
                let alternatives: Vec<String> = values
                    .iter()
                    .map(|value| {
                        self.visit(&Predicate::Equals {
                            field,
                            value: value.clone(),
                        })
                    })
                    .collect();
                format!("({})", alternatives.join(" OR "))
            }
            Predicate::Compare { field, op, value } => {
                let param = self.param(value);
                format!("{} {} {param}", column(field), op.symbol())
            }
            Predicate::Regex { field, pattern } => {
                let param = self.param(&FilterValue::Text(format!("(?i){pattern}")));
                let col = column(field);
                // Optional columns hold NONE, which string::matches rejects.
                format!("({col} != NONE AND string::matches({col}, {param}))")
            }
            Predicate::And(parts) => self.join(parts, " AND ", "true"),
            Predicate::Or(parts) => self.join(parts, " OR ", "false"),
        }
    }

    fn join(&mut self, parts: &[Predicate], separator: &str, empty: &str) -> String {
        match parts {
            [] => empty.to_string(),
            [single] => self.visit(single),
            _ => {
                let clauses: Vec<String> = parts.iter().map(|p| self.visit(p)).collect();
                format!("({})", clauses.join(separator))
            }
        }
    }

    fn param(&mut self, value: &FilterValue) -> String {
        let name = format!("p{}", self.vars.len());
        let (json, cast) = match value {
            FilterValue::Text(s) => (Value::String(s.clone()), ""),
            FilterValue::Integer(i) => (Value::from(*i), ""),
            FilterValue::Decimal(d) => (Value::String(d.to_string()), "<decimal> "),
            FilterValue::Boolean(b) => (Value::Bool(*b), ""),
            FilterValue::DateTime(dt) => (Value::String(datetime_text(dt)), "<datetime> "),
        };
        self.vars.insert(name.clone(), json);
        format!("{cast}${FILTER_VAR}.{name}")
    }
}

fn column(field: &FieldSpec) -> &'static str {
    match field.kind {
        FieldKind::Id => "meta::id(id)",
        _ => field.column,
    }
}
