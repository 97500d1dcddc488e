//! Dynamic records mapped from decoded JSON responses
//!
//! GitLab endpoints return arbitrarily shaped JSON. Instead of one DTO per
//! endpoint, responses are mapped into [`ApiValue`] trees whose objects
//! become [`ApiRecord`]s: ordered key→value containers with typed access.
//! Each decode produces an independent tree; records are only mutated
//! through explicit set/unset calls by the host.

use crate::error::GitLabError;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::fmt;

/// Field key of an [`ApiRecord`]: a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Str(String),
    Int(i64),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Str(key) => f.write_str(key),
            RecordKey::Int(key) => write!(f, "{key}"),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey::Str(key.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(key: String) -> Self {
        RecordKey::Str(key)
    }
}

impl From<i64> for RecordKey {
    fn from(key: i64) -> Self {
        RecordKey::Int(key)
    }
}

/// A value held by an [`ApiRecord`] field, or a whole mapped response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered sequence whose elements are mapped by the same rules.
    List(Vec<ApiValue>),
    /// A mapped JSON object.
    Record(ApiRecord),
    /// A nested structure left unconverted by a non-recursive build.
    Raw(Value),
}

impl ApiValue {
    /// Map a decoded JSON value into an [`ApiValue`] tree.
    ///
    /// With `recursive` set, nested objects become nested records and
    /// sequences are walked element-wise under the same rule. Without it,
    /// only the top level is converted: nested objects and sequences stay
    /// behind as [`ApiValue::Raw`].
    ///
    /// Scalars pass through unchanged, so mapping is a no-op on inputs
    /// that are neither objects nor sequences.
    pub fn build(raw: &Value, recursive: bool) -> ApiValue {
        match raw {
            Value::Object(map) => {
                let mut record = ApiRecord::new();
                for (key, value) in map {
                    let mapped = if recursive {
                        ApiValue::build(value, true)
                    } else {
                        ApiValue::leaf(value)
                    };
                    record.set(key.as_str(), mapped);
                }
                ApiValue::Record(record)
            }
            Value::Array(items) => ApiValue::List(
                items
                    .iter()
                    .map(|item| {
                        if recursive {
                            ApiValue::build(item, true)
                        } else {
                            ApiValue::leaf(item)
                        }
                    })
                    .collect(),
            ),
            scalar => ApiValue::leaf(scalar),
        }
    }

    /// Convert a scalar; leave nested structures raw.
    fn leaf(value: &Value) -> ApiValue {
        match value {
            Value::Null => ApiValue::Null,
            Value::Bool(flag) => ApiValue::Bool(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(int) => ApiValue::Int(int),
                None => ApiValue::Float(number.as_f64().unwrap_or_default()),
            },
            Value::String(text) => ApiValue::Str(text.clone()),
            nested => ApiValue::Raw(nested.clone()),
        }
    }

    /// Serialize back into a `serde_json::Value`.
    ///
    /// For values built from decoded JSON this is a lossless inverse of
    /// [`ApiValue::build`], including field order.
    pub fn to_json(&self) -> Value {
        match self {
            ApiValue::Null => Value::Null,
            ApiValue::Bool(flag) => Value::Bool(*flag),
            ApiValue::Int(int) => Value::from(*int),
            ApiValue::Float(float) => serde_json::Number::from_f64(*float)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ApiValue::Str(text) => Value::String(text.clone()),
            ApiValue::List(items) => Value::Array(items.iter().map(ApiValue::to_json).collect()),
            ApiValue::Record(record) => {
                let mut map = serde_json::Map::with_capacity(record.len());
                for (key, value) in record.iter() {
                    map.insert(key.to_string(), value.to_json());
                }
                Value::Object(map)
            }
            ApiValue::Raw(raw) => raw.clone(),
        }
    }

    pub fn as_record(&self) -> Option<&ApiRecord> {
        match self {
            ApiValue::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ApiValue]> {
        match self {
            ApiValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ApiValue::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ApiValue::Int(int) => Some(*int),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ApiValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            ApiValue::Null => "null",
            ApiValue::Bool(_) => "bool",
            ApiValue::Int(_) => "int",
            ApiValue::Float(_) => "float",
            ApiValue::Str(_) => "string",
            ApiValue::List(_) => "list",
            ApiValue::Record(_) => "record",
            ApiValue::Raw(_) => "raw",
        }
    }
}

impl Serialize for ApiValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiValue::Null => serializer.serialize_unit(),
            ApiValue::Bool(flag) => serializer.serialize_bool(*flag),
            ApiValue::Int(int) => serializer.serialize_i64(*int),
            ApiValue::Float(float) => serializer.serialize_f64(*float),
            ApiValue::Str(text) => serializer.serialize_str(text),
            ApiValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ApiValue::Record(record) => record.serialize(serializer),
            ApiValue::Raw(raw) => raw.serialize(serializer),
        }
    }
}

/// Ordered key→value container mapped from one JSON object.
///
/// Keys are unique; setting an existing key replaces its value in place.
/// Iteration yields fields in insertion order, which mirrors the order of
/// the decoded object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiRecord {
    fields: Vec<(RecordKey, ApiValue)>,
}

impl ApiRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: impl Into<RecordKey>) -> Option<&ApiValue> {
        let key = key.into();
        self.fields
            .iter()
            .find(|(field, _)| *field == key)
            .map(|(_, value)| value)
    }

    /// Set a field, replacing the value if the key already exists.
    pub fn set(&mut self, key: impl Into<RecordKey>, value: ApiValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(field, _)| *field == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Set a field whose key is itself a decoded value.
    ///
    /// Only string and integer values are indexable; anything else fails
    /// with [`GitLabError::InvalidKey`].
    pub fn try_set(&mut self, key: &ApiValue, value: ApiValue) -> Result<(), GitLabError> {
        let key = match key {
            ApiValue::Str(text) => RecordKey::Str(text.clone()),
            ApiValue::Int(int) => RecordKey::Int(*int),
            other => {
                return Err(GitLabError::InvalidKey {
                    kind: other.type_name(),
                })
            }
        };
        self.set(key, value);
        Ok(())
    }

    pub fn has(&self, key: impl Into<RecordKey>) -> bool {
        self.get(key).is_some()
    }

    /// Remove a field, returning its value if it was present.
    pub fn unset(&mut self, key: impl Into<RecordKey>) -> Option<ApiValue> {
        let key = key.into();
        let index = self.fields.iter().position(|(field, _)| *field == key)?;
        Some(self.fields.remove(index).1)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order. The iterator borrows the record
    /// and can be restarted by calling `iter` again.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &ApiValue)> {
        self.fields.iter().map(|(key, value)| (key, value))
    }

    /// Shortcut for string fields.
    pub fn get_str(&self, key: impl Into<RecordKey>) -> Option<&str> {
        self.get(key).and_then(ApiValue::as_str)
    }
}

impl Serialize for ApiRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            match key {
                RecordKey::Str(text) => map.serialize_entry(text, value)?,
                // JSON object keys are strings; integer keys only occur on
                // host-built records and serialize as their decimal form.
                RecordKey::Int(int) => map.serialize_entry(&int.to_string(), value)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_maps_nested_objects_recursively() {
        let raw = json!({
            "id": 7,
            "name": "gitlab-org",
            "namespace": {"id": 1, "path": "root"},
            "tags": ["a", "b"],
        });

        let mapped = ApiValue::build(&raw, true);
        let record = mapped.as_record().expect("top level is a record");

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("id").and_then(ApiValue::as_int), Some(7));
        let namespace = record
            .get("namespace")
            .and_then(ApiValue::as_record)
            .expect("nested record");
        assert_eq!(namespace.get_str("path"), Some("root"));
        let tags = record.get("tags").and_then(ApiValue::as_list).unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_build_walks_sequences_element_wise() {
        let raw = json!([{"id": 1}, {"id": 2}]);

        let mapped = ApiValue::build(&raw, true);
        let items = mapped.as_list().expect("top level is a list");

        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_record().unwrap().get("id").unwrap().as_int(),
            Some(2)
        );
    }

    #[test]
    fn test_non_recursive_build_leaves_nested_maps_raw() {
        let raw = json!({"id": 1, "namespace": {"id": 2}});

        let mapped = ApiValue::build(&raw, false);
        let record = mapped.as_record().unwrap();

        assert_eq!(record.get("id").and_then(ApiValue::as_int), Some(1));
        assert!(matches!(
            record.get("namespace"),
            Some(ApiValue::Raw(Value::Object(_)))
        ));
    }

    #[test]
    fn test_empty_object_builds_empty_record() {
        let mapped = ApiValue::build(&json!({}), true);
        let record = mapped.as_record().unwrap();
        assert!(record.is_empty());
        assert_eq!(record.iter().count(), 0);
    }

    #[test]
    fn test_scalar_passes_through_unchanged() {
        assert_eq!(ApiValue::build(&json!("ok"), true).as_str(), Some("ok"));
        assert_eq!(ApiValue::build(&json!(42), true).as_int(), Some(42));
        assert_eq!(ApiValue::build(&json!(null), true), ApiValue::Null);
    }

    #[test]
    fn test_round_trip_preserves_fields_and_order() {
        let text = r#"{"zeta":1,"alpha":{"c":true,"b":null},"list":[1,"x",2.5]}"#;
        let raw: Value = serde_json::from_str(text).unwrap();

        let mapped = ApiValue::build(&raw, true);

        assert_eq!(mapped.to_json(), raw);
        assert_eq!(serde_json::to_string(&mapped).unwrap(), text);
    }

    #[test]
    fn test_set_replaces_and_preserves_order() {
        let mut record = ApiRecord::new();
        record.set("a", ApiValue::Int(1));
        record.set("b", ApiValue::Int(2));
        record.set("a", ApiValue::Int(3));

        assert_eq!(record.len(), 2);
        let keys: Vec<String> = record.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a").and_then(ApiValue::as_int), Some(3));
    }

    #[test]
    fn test_unset_removes_field() {
        let mut record = ApiRecord::new();
        record.set("a", ApiValue::Int(1));

        assert_eq!(record.unset("a"), Some(ApiValue::Int(1)));
        assert!(!record.has("a"));
        assert_eq!(record.unset("a"), None);
    }

    #[test]
    fn test_integer_keys_are_distinct_from_strings() {
        let mut record = ApiRecord::new();
        record.set(1i64, ApiValue::Str("int".into()));
        record.set("1", ApiValue::Str("str".into()));

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_str(1i64), Some("int"));
        assert_eq!(record.get_str("1"), Some("str"));
    }

    #[test]
    fn test_try_set_rejects_non_scalar_keys() {
        let mut record = ApiRecord::new();

        let list_key = ApiValue::List(vec![]);
        let result = record.try_set(&list_key, ApiValue::Null);
        assert!(matches!(
            result,
            Err(GitLabError::InvalidKey { kind: "list" })
        ));

        record
            .try_set(&ApiValue::Str("ok".into()), ApiValue::Int(1))
            .unwrap();
        assert_eq!(record.get("ok").and_then(ApiValue::as_int), Some(1));
    }
}
