// ── Entity schema ──
//
// Per-entity configuration for client-side derivation: which fields are
// searched, what each filter key tests, how each sort key extracts and
// orders values. Field paths may be dotted (`author.name`); the path
// `id` resolves to the normalized record identifier.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::DateTime;
use deskly_api::Record;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::query::SortDirection;

/// Resolve a (possibly dotted) field path against a record.
pub fn lookup<'a>(record: &'a Record, path: &str) -> Option<Cow<'a, Value>> {
    if path == "id" {
        return Some(Cow::Owned(Value::String(record.id().as_str().to_owned())));
    }
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = record.get(first)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            _ => return None,
        };
    }
    Some(Cow::Borrowed(current))
}

/// Scalar rendering used for equality tests. Objects and arrays have none.
fn as_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

// ── Filters ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum FilterRule {
    /// Field value equals the filter value. Array fields match if any
    /// element does.
    Equals(String),
    /// Filter value is a comma-separated set; field value must be in it.
    OneOf(String),
}

impl FilterRule {
    pub fn field(&self) -> &str {
        match self {
            Self::Equals(f) | Self::OneOf(f) => f,
        }
    }

    pub fn matches(&self, record: &Record, wanted: &str) -> bool {
        let Some(value) = lookup(record, self.field()) else {
            return false;
        };
        match self {
            Self::Equals(_) => scalar_or_any(&value, |v| v == wanted),
            Self::OneOf(_) => {
                let set = wanted.split(',').map(str::trim).filter(|s| !s.is_empty());
                scalar_or_any(&value, |v| set.clone().any(|s| s == v))
            }
        }
    }
}

fn scalar_or_any(value: &Value, mut test: impl FnMut(&str) -> bool) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(as_text)
            .any(|v| test(v.as_ref())),
        other => as_text(other).is_some_and(|v| test(v.as_ref())),
    }
}

// ── Sort keys ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKind {
    /// Generic ordering: numbers numerically, strings lexically.
    #[default]
    Auto,
    /// Case-insensitive text.
    Text,
    /// Numeric; numeric strings are parsed.
    Number,
    /// RFC 3339 timestamps; unparseable values fall back to text.
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    pub field: String,
    pub kind: SortKind,
}

impl SortKey {
    pub fn new(field: impl Into<String>, kind: SortKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn extract(&self, record: &Record) -> SortValue {
        let Some(value) = lookup(record, &self.field) else {
            return SortValue::Missing;
        };
        match (self.kind, value.as_ref()) {
            (_, Value::Null) => SortValue::Missing,
            (_, Value::Bool(b)) => SortValue::Bool(*b),
            (_, Value::Number(n)) => n.as_f64().map_or(SortValue::Missing, SortValue::Number),
            (SortKind::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_or_else(|_| SortValue::Text(s.clone()), SortValue::Number),
            (SortKind::Date, Value::String(s)) => DateTime::parse_from_rfc3339(s).map_or_else(
                |_| SortValue::Text(s.clone()),
                |d| SortValue::Number(d.timestamp_millis() as f64),
            ),
            (SortKind::Text, Value::String(s)) => SortValue::Text(s.to_lowercase()),
            (SortKind::Auto, Value::String(s)) => SortValue::Text(s.clone()),
            (_, other) => SortValue::Text(other.to_string()),
        }
    }

    /// Compare two records on this key. Missing values sort last when
    /// ascending.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        self.extract(a).cmp(&self.extract(b))
    }
}

/// Totally ordered projection of a field value. Variant order is the
/// cross-type order: booleans, then numbers, then text, then missing.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Missing,
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
            Self::Missing => 3,
        }
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

// ── Schema ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    pub name: String,
    pub endpoint: String,
    pub searchable: Vec<String>,
    pub filters: IndexMap<String, FilterRule>,
    pub sort_keys: IndexMap<String, SortKey>,
    pub default_sort: Option<(String, SortDirection)>,
    /// Fields shown by table renderers, in order.
    pub columns: Vec<String>,
    /// Status vocabulary accepted by the status endpoint; empty if none.
    pub statuses: Vec<String>,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            searchable: Vec::new(),
            filters: IndexMap::new(),
            sort_keys: IndexMap::new(),
            default_sort: None,
            columns: vec!["id".into()],
            statuses: Vec::new(),
        }
    }

    pub fn search<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, key: impl Into<String>, rule: FilterRule) -> Self {
        self.filters.insert(key.into(), rule);
        self
    }

    /// Equality filter whose key is also the field name.
    pub fn filter_eq(self, field: &str) -> Self {
        self.filter(field, FilterRule::Equals(field.to_owned()))
    }

    pub fn sort(mut self, key: impl Into<String>, kind: SortKind) -> Self {
        let key = key.into();
        self.sort_keys.insert(key.clone(), SortKey::new(key, kind));
        self
    }

    pub fn default_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some((key.into(), direction));
        self
    }

    pub fn columns<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn statuses<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = values.into_iter().map(Into::into).collect();
        self
    }

    /// Filter rule for `key`; undeclared keys test the field of that name.
    pub fn filter_rule(&self, key: &str) -> Cow<'_, FilterRule> {
        self.filters.get(key).map_or_else(
            || Cow::Owned(FilterRule::Equals(key.to_owned())),
            Cow::Borrowed,
        )
    }

    /// Sort key for `key`; undeclared keys use generic ordering on the
    /// field of that name.
    pub fn sort_key(&self, key: &str) -> Cow<'_, SortKey> {
        self.sort_keys.get(key).map_or_else(
            || Cow::Owned(SortKey::new(key, SortKind::Auto)),
            Cow::Borrowed,
        )
    }

    /// Case-insensitive substring match over the searchable fields.
    /// `needle` must already be lowercased; empty matches everything.
    pub fn matches_search(&self, record: &Record, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.searchable.iter().any(|field| {
            lookup(record, field).is_some_and(|value| match value.as_ref() {
                Value::String(s) => s.to_lowercase().contains(needle),
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| s.to_lowercase().contains(needle)),
                _ => false,
            })
        })
    }

    pub fn accepts_status(&self, status: &str) -> bool {
        self.statuses.is_empty() || self.statuses.iter().any(|s| s == status)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rec(v: Value) -> Record {
        Record::from_value(v).unwrap()
    }

    #[test]
    fn lookup_follows_dotted_paths_and_id() {
        let r = rec(json!({ "_id": "a1", "author": { "name": "Ada" } }));
        assert_eq!(lookup(&r, "author.name").unwrap().as_ref(), &json!("Ada"));
        assert_eq!(lookup(&r, "id").unwrap().as_ref(), &json!("a1"));
        assert!(lookup(&r, "author.email").is_none());
    }

    #[test]
    fn equals_matches_scalars_and_array_members() {
        let r = rec(json!({ "id": 1, "status": "published", "tags": ["rust", "cms"], "featured": true }));
        assert!(FilterRule::Equals("status".into()).matches(&r, "published"));
        assert!(!FilterRule::Equals("status".into()).matches(&r, "draft"));
        assert!(FilterRule::Equals("tags".into()).matches(&r, "cms"));
        assert!(FilterRule::Equals("featured".into()).matches(&r, "true"));
        assert!(!FilterRule::Equals("missing".into()).matches(&r, "x"));
    }

    #[test]
    fn one_of_uses_comma_set() {
        let r = rec(json!({ "id": 1, "status": "replied" }));
        let rule = FilterRule::OneOf("status".into());
        assert!(rule.matches(&r, "pending, replied"));
        assert!(!rule.matches(&r, "pending,declined"));
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let schema = EntitySchema::new("blog", "/blogs").search(["title", "tags"]);
        let r = rec(json!({ "id": 1, "title": "Intro to Rust", "tags": ["Systems"] }));
        assert!(schema.matches_search(&r, "rust"));
        assert!(schema.matches_search(&r, "system"));
        assert!(schema.matches_search(&r, ""));
        assert!(!schema.matches_search(&r, "python"));
    }

    #[test]
    fn sort_kinds_order_values() {
        let a = rec(json!({ "id": 1, "price": "9", "at": "2024-01-02T00:00:00Z", "t": "b" }));
        let b = rec(json!({ "id": 2, "price": "10", "at": "2023-12-31T23:00:00+00:00", "t": "A" }));
        assert_eq!(SortKey::new("price", SortKind::Number).compare(&a, &b), Ordering::Less);
        assert_eq!(SortKey::new("price", SortKind::Auto).compare(&a, &b), Ordering::Greater);
        assert_eq!(SortKey::new("at", SortKind::Date).compare(&a, &b), Ordering::Greater);
        assert_eq!(SortKey::new("t", SortKind::Text).compare(&a, &b), Ordering::Greater);
        assert_eq!(SortKey::new("t", SortKind::Auto).compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn missing_values_sort_last() {
        let a = rec(json!({ "id": 1 }));
        let b = rec(json!({ "id": 2, "order": 5 }));
        assert_eq!(SortKey::new("order", SortKind::Number).compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn undeclared_keys_fall_back_to_field() {
        let schema = EntitySchema::new("faq", "/faqs");
        assert_eq!(schema.filter_rule("category").field(), "category");
        assert_eq!(schema.sort_key("order").kind, SortKind::Auto);
    }
}
