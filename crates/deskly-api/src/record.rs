// ── Record identity and normalization ──
//
// The backend encodes primary keys as `_id` (Mongo-style) on some
// endpoints and `id` on others. Every payload crossing into this crate
// goes through `Record::from_value`, which folds both into one `id`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical identifier for any record, regardless of wire encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single entity instance: an opaque field map plus its canonical id.
///
/// `fields` never contains `id` or `_id`; the identifier lives only in
/// [`Record::id`]. Serializes back to a flat JSON object with `id` first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Record {
    id: RecordId,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        fields.remove("_id");
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Normalize a raw backend object into a `Record`.
    ///
    /// `id` wins when both keys are present. Ids may arrive as strings,
    /// numbers, or extended-JSON `{"$oid": "..."}` objects.
    pub fn from_value(value: Value) -> Result<Self, String> {
        let Value::Object(mut fields) = value else {
            return Err(format!("expected a JSON object, got {}", kind_of(&value)));
        };

        let primary = fields.remove("id").filter(|v| !v.is_null());
        let legacy = fields.remove("_id").filter(|v| !v.is_null());

        let raw = primary
            .or(legacy)
            .ok_or_else(|| "record has neither `id` nor `_id`".to_owned())?;
        let id = id_from_value(&raw)?;

        Ok(Self { id, fields })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == "id" {
            return None;
        }
        self.fields.get(field)
    }

    /// String view of a field. Numbers and booleans are not coerced.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        if field == "id" {
            return Some(self.id.as_str());
        }
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Set a single field. Attempts to overwrite the identifier are ignored.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field == "id" || field == "_id" {
            return;
        }
        self.fields.insert(field, value);
    }

    /// Shallow-merge a partial object into this record (PATCH semantics).
    pub fn merge(&mut self, patch: &Map<String, Value>) {
        for (k, v) in patch {
            self.set(k.clone(), v.clone());
        }
    }

    /// Flatten back into a JSON object with `id` included.
    pub fn into_value(self) -> Value {
        let mut out = Map::with_capacity(self.fields.len() + 1);
        out.insert("id".into(), Value::String(self.id.0));
        out.extend(self.fields);
        Value::Object(out)
    }
}

impl TryFrom<Value> for Record {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn id_from_value(raw: &Value) -> Result<RecordId, String> {
    match raw {
        Value::String(s) if !s.is_empty() => Ok(RecordId(s.clone())),
        Value::Number(n) => Ok(RecordId(n.to_string())),
        Value::Object(o) => match o.get("$oid") {
            Some(Value::String(s)) => Ok(RecordId(s.clone())),
            _ => Err("object id without `$oid`".to_owned()),
        },
        other => Err(format!("unusable id value of type {}", kind_of(other))),
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
