//! Filter predicate AST and the query-string grammar that produces it.
//!
//! Grammar, per filter key:
//!
//! - `field=value` is an equality clause;
//! - `field=a|b|c` (or a repeated key) must equal one of the alternatives;
//! - `field[gt]=v`, `gte`, `lt`, `lte`, `eq` compare;
//! - `field[regex]=p` matches case-insensitively.
//!
//! All clauses are AND-ed. A raw `filter` parameter replaces the grammar
//! entirely and goes through the strict JSON parser in [`super::raw`].

use std::collections::BTreeMap;

use crate::error::{BungalowError, BungalowResult};

use super::params::QueryParams;
use super::raw::parse_raw_filter;
use super::schema::{FieldKind, FieldSpec, FilterValue, ResourceSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals {
        field: &'static FieldSpec,
        value: FilterValue,
    },
    OneOf {
        field: &'static FieldSpec,
        values: Vec<FilterValue>,
    },
    Compare {
        field: &'static FieldSpec,
        op: CompareOp,
        value: FilterValue,
    },
    /// Case-insensitive pattern match.
    Regex {
        field: &'static FieldSpec,
        pattern: String,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Matches every document.
    pub fn all() -> Self {
        Predicate::And(Vec::new())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::And(parts) if parts.is_empty())
    }

    pub fn eq(field: &'static FieldSpec, value: FilterValue) -> Self {
        Predicate::Equals { field, value }
    }

    pub fn eq_text(field: &'static FieldSpec, value: impl ToString) -> Self {
        Predicate::Equals {
            field,
            value: FilterValue::Text(value.to_string()),
        }
    }

    /// Conjunction that flattens nested ANDs and drops match-all parts.
    pub fn and(self, other: Predicate) -> Predicate {
        let mut parts = Vec::new();
        for p in [self, other] {
            match p {
                Predicate::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Predicate::And(parts)
        }
    }

    pub fn compare(
        field: &'static FieldSpec,
        op: CompareOp,
        value: FilterValue,
    ) -> BungalowResult<Self> {
        if field.kind == FieldKind::TextList && op != CompareOp::Eq {
            return Err(BungalowError::validation(format!(
                "Ordering comparisons are not supported on {}.",
                field.name
            )));
        }
        Ok(Predicate::Compare { field, op, value })
    }

    pub fn regex(field: &'static FieldSpec, pattern: &str) -> BungalowResult<Self> {
        if field.kind != FieldKind::Text {
            return Err(BungalowError::validation(format!(
                "Pattern matching is only supported on text fields, not {}.",
                field.name
            )));
        }
        regex::Regex::new(pattern).map_err(|e| {
            BungalowError::validation(format!("Invalid pattern for {}: {e}", field.name))
        })?;
        Ok(Predicate::Regex {
            field,
            pattern: pattern.to_string(),
        })
    }
}

/// Translate the filter part of a request's query string into a predicate
/// over `schema`.
pub fn translate_filter(
    params: &QueryParams,
    schema: &'static ResourceSchema,
) -> BungalowResult<Predicate> {
    if let Some(raw) = params.raw_filter() {
        return parse_raw_filter(raw, schema);
    }

    // Plain values per field, in first-seen order, so repeated keys fold
    // into a single alternatives group.
    let mut plain: BTreeMap<usize, (&'static FieldSpec, Vec<&str>)> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::new();
    let mut clauses = Vec::new();

    for pair in params.filter_pairs() {
        let field = schema.require_field(&pair.key)?;
        match pair.op.as_deref() {
            None => {
                let slot = match order.iter().position(|k| *k == pair.key) {
                    Some(i) => i,
                    None => {
                        order.push(pair.key.as_str());
                        order.len() - 1
                    }
                };
                plain
                    .entry(slot)
                    .or_insert_with(|| (field, Vec::new()))
                    .1
                    .extend(pair.value.split('|'));
            }
            Some("regex") => clauses.push(Predicate::regex(field, &pair.value)?),
            Some(token) => {
                let op = CompareOp::from_token(token).ok_or_else(|| {
                    BungalowError::validation(format!("Unknown filter operator: {token}."))
                })?;
                clauses.push(Predicate::compare(
                    field,
                    op,
                    field.kind.cast(field.name, &pair.value)?,
                )?);
            }
        }
    }

    let mut groups = Vec::new();
    for (_, (field, raw_values)) in plain {
        let mut values = raw_values
            .into_iter()
            .map(|v| field.kind.cast(field.name, v))
            .collect::<BungalowResult<Vec<_>>>()?;
        if values.len() == 1 {
            groups.push(Predicate::Equals {
                field,
                value: values.remove(0),
            });
        } else {
            groups.push(Predicate::Or(
                values
                    .into_iter()
                    .map(|value| Predicate::Equals { field, value })
                    .collect(),
            ));
        }
    }
    groups.extend(clauses);

    Ok(match groups.len() {
        0 => Predicate::all(),
        1 => groups.remove(0),
        _ => Predicate::And(groups),
    })
}
