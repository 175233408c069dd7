//! Record and batch types moved between pipeline stages

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A finite, ordered sequence of records processed together in one run.
///
/// Held fully in memory; each stage produces a fresh batch rather than
/// mutating its input in place.
pub type Batch = Vec<Record>;

/// A schema-free record: an ordered mapping from field name to JSON value.
///
/// Raw records carry source-native field names; transformed records carry the
/// target-schema shape. The core enforces no schema, so field presence is
/// entirely stage-defined. Field order is preserved (serde_json is built with
/// `preserve_order`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String value of a field, if present and actually a string
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.0.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.0.get(field).and_then(Value::as_bool)
    }

    /// First non-null value among the given field names.
    ///
    /// Connectors use this for sources with inconsistent header casing
    /// (`ID` vs `id`).
    pub fn first_of<'a>(&'a self, fields: &[&str]) -> Option<&'a Value> {
        fields
            .iter()
            .filter_map(|f| self.0.get(*f))
            .find(|v| !v.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whole record as a JSON value (used to persist raw payloads as jsonb)
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        let mut r = Record::new();
        r.insert("id", 42);
        r.insert("name", "Ada");
        r.insert("active", true);
        r.insert("meta", json!({"tier": "gold"}));
        r
    }

    #[test]
    fn test_typed_accessors() {
        let r = sample();
        assert_eq!(r.get_i64("id"), Some(42));
        assert_eq!(r.get_str("name"), Some("Ada"));
        assert_eq!(r.get_bool("active"), Some(true));
        assert_eq!(r.get_str("id"), None);
        assert_eq!(r.get_i64("missing"), None);
    }

    #[test]
    fn test_first_of_skips_null_and_missing() {
        let mut r = Record::new();
        r.insert("ID", Value::Null);
        r.insert("id", "abc");
        assert_eq!(r.first_of(&["ID", "id"]).unwrap(), &json!("abc"));
        assert!(r.first_of(&["x", "y"]).is_none());
    }

    #[test]
    fn test_field_order_preserved() {
        let r = sample();
        let fields: Vec<&str> = r.fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(fields, vec!["id", "name", "active", "meta"]);

        // round-trip keeps order too
        let text = serde_json::to_string(&r).unwrap();
        let back: Record = serde_json::from_str(&text).unwrap();
        let fields: Vec<&str> = back.fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(fields, vec!["id", "name", "active", "meta"]);
    }

    #[test]
    fn test_to_value_is_object() {
        let r = sample();
        let v = r.to_value();
        assert_eq!(v["meta"]["tier"], json!("gold"));
    }
}
