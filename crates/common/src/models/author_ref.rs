//! Author references as they appear on paper documents
//!
//! Ingested papers list their authors either as bare ids or as embedded author
//! records. Both collapse to a plain id here; anything else is dropped.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Embedded author record on a paper document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecordRef {
    #[serde(default, alias = "_id")]
    pub id: Option<Value>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub org: Option<String>,
}

/// One entry of a paper's `authors` field
///
/// Only JSON objects are read as records; arrays and other shapes are
/// [`AuthorRef::Malformed`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuthorRef {
    Id(String),
    NumericId(i64),
    Record(AuthorRecordRef),
    Malformed(Value),
}

impl<'de> Deserialize<'de> for AuthorRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(AuthorRef::from_value)
    }
}

impl AuthorRef {
    /// Classify one raw entry
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(id) => AuthorRef::Id(id),
            Value::Number(n) => match n.as_i64() {
                Some(id) => AuthorRef::NumericId(id),
                None => AuthorRef::Malformed(Value::Number(n)),
            },
            Value::Object(_) => match AuthorRecordRef::deserialize(&value) {
                Ok(record) => AuthorRef::Record(record),
                Err(_) => AuthorRef::Malformed(value),
            },
            other => AuthorRef::Malformed(other),
        }
    }

    /// Plain author id, or `None` for malformed or id-less entries
    pub fn into_id(self) -> Option<String> {
        match self {
            AuthorRef::Id(id) => non_empty(id),
            AuthorRef::NumericId(id) => Some(id.to_string()),
            AuthorRef::Record(record) => match record.id? {
                Value::String(id) => non_empty(id),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            },
            AuthorRef::Malformed(_) => None,
        }
    }

    /// Parse a raw JSON `authors` value; non-array input yields no ids
    pub fn ids_from_value(value: &Value) -> Vec<String> {
        let Some(entries) = value.as_array() else {
            return Vec::new();
        };
        normalize_author_refs(entries.iter().cloned().map(AuthorRef::from_value))
    }
}

fn non_empty(id: String) -> Option<String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == id.len() {
        Some(id)
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalize author references to distinct plain ids, keeping first-seen order
pub fn normalize_author_refs<I>(refs: I) -> Vec<String>
where
    I: IntoIterator<Item = AuthorRef>,
{
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter_map(AuthorRef::into_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_and_record_ids() {
        let ids = AuthorRef::ids_from_value(&json!([
            "a1",
            {"id": "a2"},
            {"_id": 7},
            {"_id": ["nested"]},
            true,
            "   "
        ]));
        assert_eq!(ids, vec!["a1", "a2", "7"]);
    }

    #[test]
    fn test_array_entries_are_malformed() {
        let ids = AuthorRef::ids_from_value(&json!(["a1", ["x9", "Name"], [42], []]));
        assert_eq!(ids, vec!["a1"]);

        let entry: AuthorRef = serde_json::from_value(json!(["x9", "Name"])).unwrap();
        assert!(matches!(entry, AuthorRef::Malformed(_)));
        assert_eq!(entry.into_id(), None);
    }

    #[test]
    fn test_non_array_value() {
        assert!(AuthorRef::ids_from_value(&json!({"_id": "a1"})).is_empty());
        assert!(AuthorRef::ids_from_value(&Value::Null).is_empty());
    }
}
