//! Free-form connector options
//!
//! The pipeline core passes options through to connector constructors without
//! interpreting any key. Known keys are connector-private (`table_name`,
//! `api_url`, `api_key`, `timeout_secs`, `file_path`, `delimiter`,
//! `encoding`, ...).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use intake_common::{ImportError, Result};

/// Ordered key/value options consumed by a connector constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorOptions(Map<String, Value>);

impl ConnectorOptions {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build options from an arbitrary JSON value
    ///
    /// Accepts an object or null (null -> empty options); anything else is a
    /// malformed payload.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::new()),
            other => Err(ImportError::InvalidEvent(format!(
                "options must be an object, got {}",
                value_kind(&other)
            ))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String option with a default for absent/non-string values
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
