//! Per-resource query schema: the whitelist every client-supplied field
//! name, sort key, projection and expansion path is checked against.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{BungalowError, BungalowResult};

/// Storage type of a queryable field; drives how raw query-string values
/// are cast before they reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The document's own record id.
    Id,
    /// A UUID pointing at another resource, stored as a string.
    Reference,
    Text,
    /// An array of strings; equality means membership.
    TextList,
    Integer,
    Decimal,
    Boolean,
    DateTime,
}

/// A typed filter operand.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    DateTime(DateTime<Utc>),
}

impl FieldKind {
    /// Cast a raw query-string value to this field's type.
    pub fn cast(self, field: &str, raw: &str) -> BungalowResult<FilterValue> {
        let raw = raw.trim();
        let invalid = || BungalowError::validation(format!("Invalid {field}: {raw}."));
        match self {
            FieldKind::Id | FieldKind::Reference => Uuid::parse_str(raw)
                .map(|id| FilterValue::Text(id.to_string()))
                .map_err(|_| invalid()),
            FieldKind::Text | FieldKind::TextList => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(FilterValue::Integer)
                .map_err(|_| invalid()),
            FieldKind::Decimal => raw
                .parse::<Decimal>()
                .map(FilterValue::Decimal)
                .map_err(|_| invalid()),
            FieldKind::Boolean => match raw {
                "true" => Ok(FilterValue::Boolean(true)),
                "false" => Ok(FilterValue::Boolean(false)),
                _ => Err(invalid()),
            },
            FieldKind::DateTime => parse_datetime(raw)
                .map(FilterValue::DateTime)
                .ok_or_else(invalid),
        }
    }

    /// Cast a JSON operand from a raw `filter` object.
    pub fn cast_json(self, field: &str, value: &serde_json::Value) -> BungalowResult<FilterValue> {
        match value {
            serde_json::Value::String(s) => self.cast(field, s),
            serde_json::Value::Number(n) => self.cast(field, &n.to_string()),
            serde_json::Value::Bool(b) if self == FieldKind::Boolean => {
                Ok(FilterValue::Boolean(*b))
            }
            other => Err(BungalowError::validation(format!(
                "Invalid {field}: unsupported operand {other}."
            ))),
        }
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (UTC midnight).
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
}

#[derive(Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name as seen by API clients (camelCase).
    pub name: &'static str,
    /// Column name in the store.
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// A reference field clients may ask to have resolved in place.
#[derive(Debug, PartialEq, Eq)]
pub struct ExpansionSpec {
    /// Reference field on this resource, e.g. `cabinId`.
    pub path: &'static str,
    /// Subfields of the referenced document that may be exposed.
    pub fields: &'static [&'static str],
}

#[derive(Debug)]
pub struct ResourceSchema {
    pub entity: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    /// Default sort key (`-` prefix for descending). `None` keeps natural
    /// storage order.
    pub default_sort: Option<&'static str>,
    pub expansions: &'static [ExpansionSpec],
    /// Fields dropped by the default projection.
    pub internal_fields: &'static [&'static str],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    pub fn require_field(&self, name: &str) -> BungalowResult<&'static FieldSpec> {
        self.field(name).ok_or_else(|| {
            BungalowError::validation(format!("Unknown {} field: {name}.", self.entity))
        })
    }

    pub fn expansion(&self, path: &str) -> Option<&'static ExpansionSpec> {
        let expansions: &'static [ExpansionSpec] = self.expansions;
        expansions.iter().find(|e| e.path == path)
    }
}

/// The record id, shared by every schema.
pub static ID_FIELD: FieldSpec = FieldSpec::new("id", "id", FieldKind::Id);
