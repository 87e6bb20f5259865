//! Raw query-string decoding.
//!
//! Keys of the form `field[op]` are split into the field and the operator
//! token, so `price[gt]=100` arrives as `("price", Some("gt"), "100")`.

/// Keys that steer the query pipeline rather than filter documents.
pub const DIRECTIVE_KEYS: &[&str] = &["page", "sort", "limit", "fields", "lang", "populate"];

/// Key of the raw JSON predicate escape hatch.
pub const RAW_FILTER_KEY: &str = "filter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPair {
    pub key: String,
    pub op: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<QueryPair>,
}

impl QueryParams {
    /// Decode an `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: &str) -> Self {
        let pairs = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| {
                let (key, op) = split_key(&key);
                QueryPair {
                    key,
                    op,
                    value: value.into_owned(),
                }
            })
            .collect();
        Self { pairs }
    }

    /// First plain (operator-less) value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.key == key && p.op.is_none())
            .map(|p| p.value.as_str())
    }

    /// First non-blank plain value for `key`.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn raw_filter(&self) -> Option<&str> {
        self.get(RAW_FILTER_KEY)
    }

    /// Pairs that take part in filter translation.
    pub fn filter_pairs(&self) -> impl Iterator<Item = &QueryPair> {
        self.pairs.iter().filter(|p| {
            !DIRECTIVE_KEYS.contains(&p.key.as_str()) && p.key != RAW_FILTER_KEY
        })
    }
}

fn split_key(key: &str) -> (String, Option<String>) {
    if let Some(open) = key.find('[') {
        if key.ends_with(']') && open > 0 {
            let field = &key[..open];
            let op = &key[open + 1..key.len() - 1];
            return (field.to_string(), Some(op.to_string()));
        }
    }
    (key.to_string(), None)
}
