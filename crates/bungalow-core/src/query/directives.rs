//! Read directives parsed from a request, in the order they are applied:
//! relation expansion, filter, sort, field projection, pagination.

use crate::error::{BungalowError, BungalowResult};
use crate::repository::Pagination;

use super::filter::{Predicate, translate_filter};
use super::params::QueryParams;
use super::schema::{FieldSpec, ResourceSchema};

pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// A whitelisted reference to resolve, with the subfields to expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub path: &'static str,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static FieldSpec,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Everything except the resource's internal fields.
    Default,
    /// Only these fields (plus the id).
    Fields(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListDirectives {
    pub expansions: Vec<Expansion>,
    pub filter: Predicate,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub pagination: Pagination,
}

impl ListDirectives {
    pub fn parse(params: &QueryParams, schema: &'static ResourceSchema) -> BungalowResult<Self> {
        let expansions = parse_expansions(params.get("populate"), schema);
        let filter = translate_filter(params, schema)?;
        let sort = parse_sort(params.get("sort"), schema)?;
        let projection = parse_projection(params.get("fields"), schema)?;
        let pagination = parse_pagination(params.get("page"), params.get("limit"))?;
        Ok(Self {
            expansions,
            filter,
            sort,
            projection,
            pagination,
        })
    }
}

/// `path[:a,b];path2`. Paths outside the whitelist are dropped silently
/// and subfields are narrowed to the whitelist.
pub fn parse_expansions(raw: Option<&str>, schema: &ResourceSchema) -> Vec<Expansion> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(';')
        .filter_map(|entry| {
            let (path, fields) = match entry.split_once(':') {
                Some((path, fields)) => (path.trim(), Some(fields)),
                None => (entry.trim(), None),
            };
            let spec = schema.expansion(path)?;
            let requested: Vec<&'static str> = fields
                .map(|f| {
                    f.split(',')
                        .map(str::trim)
                        .filter_map(|f| spec.fields.iter().copied().find(|allowed| *allowed == f))
                        .collect()
                })
                .unwrap_or_default();
            let fields = if requested.is_empty() {
                spec.fields.to_vec()
            } else {
                requested
            };
            Some(Expansion {
                path: spec.path,
                fields,
            })
        })
        .collect()
}

/// `a,-b` with `-` meaning descending; falls back to the schema default.
pub fn parse_sort(raw: Option<&str>, schema: &ResourceSchema) -> BungalowResult<Vec<SortKey>> {
    let Some(raw) = raw.or(schema.default_sort) else {
        return Ok(Vec::new());
    };

    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|key| {
            let (name, descending) = match key.strip_prefix('-') {
                Some(name) => (name, true),
                None => (key.strip_prefix('+').unwrap_or(key), false),
            };
            Ok(SortKey {
                field: schema.require_field(name)?,
                descending,
            })
        })
        .collect()
}

pub fn parse_projection(raw: Option<&str>, schema: &ResourceSchema) -> BungalowResult<Projection> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Projection::Default);
    };

    let fields = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|name| schema.require_field(name).map(|f| f.name))
        .collect::<BungalowResult<Vec<_>>>()?;
    if fields.is_empty() {
        return Err(BungalowError::validation("Empty field projection."));
    }
    Ok(Projection::Fields(fields))
}

/// Largest offset or limit the store accepts (a signed 64-bit integer).
const MAX_WINDOW: u64 = i64::MAX as u64;

/// 1-based `page`, `limit` defaulting to [`DEFAULT_PAGE_LIMIT`]. Values that
/// are not positive integers fall back to the defaults; a page whose offset
/// does not fit the store's range is rejected.
pub fn parse_pagination(page: Option<&str>, limit: Option<&str>) -> BungalowResult<Pagination> {
    let positive = |v: Option<&str>| v.and_then(|v| v.trim().parse::<u64>().ok()).filter(|v| *v > 0);
    let page = positive(page).unwrap_or(1);
    let limit = positive(limit).unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = (page - 1)
        .checked_mul(limit)
        .filter(|offset| *offset <= MAX_WINDOW && limit <= MAX_WINDOW)
        .ok_or_else(|| BungalowError::validation(format!("Page {page} is out of range.")))?;
    Ok(Pagination { offset, limit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::schema::{ExpansionSpec, FieldKind};

    static FIELDS: &[FieldSpec] = &[
        FieldSpec::new("id", "id", FieldKind::Id),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("regularPrice", "regular_price", FieldKind::Decimal),
        FieldSpec::new("cabinId", "cabin_id", FieldKind::Reference),
    ];
    static EXPANSIONS: &[ExpansionSpec] = &[ExpansionSpec {
        path: "cabinId",
        fields: &["name", "maxCapacity"],
    }];
    static SCHEMA: ResourceSchema = ResourceSchema {
        entity: "booking",
        table: "booking",
        fields: FIELDS,
        default_sort: Some("name"),
        expansions: EXPANSIONS,
        internal_fields: &[],
    };

    #[test]
    fn page_two_of_ten_skips_ten() {
        let p = parse_pagination(Some("2"), Some("10")).unwrap();
        assert_eq!(p.offset, 10);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn pagination_defaults() {
        let p = parse_pagination(None, None).unwrap();
        assert_eq!((p.offset, p.limit), (0, 100));
        let p = parse_pagination(Some("0"), Some("abc")).unwrap();
        assert_eq!((p.offset, p.limit), (0, 100));
    }

    #[test]
    fn offsets_beyond_the_store_range_are_rejected() {
        let err = parse_pagination(Some("18446744073709551615"), Some("100")).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(parse_pagination(Some("1"), Some("18446744073709551615")).is_err());

        let last = parse_pagination(Some("2"), Some("9223372036854775807")).unwrap();
        assert_eq!(last.offset, i64::MAX as u64);
    }

    #[test]
    fn sort_defaults_and_descending_prefix() {
        let sort = parse_sort(None, &SCHEMA).unwrap();
        assert_eq!(sort.len(), 1);
        assert_eq!(sort[0].field.name, "name");
        assert!(!sort[0].descending);

        let sort = parse_sort(Some("-regularPrice,name"), &SCHEMA).unwrap();
        assert_eq!(sort[0].field.column, "regular_price");
        assert!(sort[0].descending);
        assert!(!sort[1].descending);

        assert!(parse_sort(Some("secret"), &SCHEMA).is_err());
    }

    #[test]
    fn expansions_are_whitelisted() {
        let ex = parse_expansions(Some("cabinId:name,secret;guestId:email"), &SCHEMA);
        assert_eq!(
            ex,
            vec![Expansion {
                path: "cabinId",
                fields: vec!["name"],
            }]
        );

        let ex = parse_expansions(Some("cabinId"), &SCHEMA);
        assert_eq!(ex[0].fields, vec!["name", "maxCapacity"]);

        let ex = parse_expansions(Some("cabinId:secret"), &SCHEMA);
        assert_eq!(ex[0].fields, vec!["name", "maxCapacity"]);
    }

    #[test]
    fn projection_checks_field_names() {
        assert_eq!(parse_projection(None, &SCHEMA).unwrap(), Projection::Default);
        assert_eq!(
            parse_projection(Some("name,regularPrice"), &SCHEMA).unwrap(),
            Projection::Fields(vec!["name", "regularPrice"])
        );
        assert!(parse_projection(Some("name,__v"), &SCHEMA).is_err());
    }

    #[test]
    fn full_parse_keeps_directives_apart_from_filter() {
        let params = QueryParams::parse("sort=-name&limit=10&page=2&fields=name&name=Alpine");
        let d = ListDirectives::parse(&params, &SCHEMA).unwrap();
        assert!(d.sort[0].descending);
        assert_eq!(d.pagination.offset, 10);
        assert_eq!(d.projection, Projection::Fields(vec!["name"]));
        assert!(matches!(d.filter, Predicate::Equals { .. }));
    }
}
