//! Trigger event and invocation context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use intake_common::{ImportError, Result};
use intake_core::ConnectorOptions;

/// The opaque trigger payload
///
/// The runner reads only `connector` (a kind string) and `options` (a
/// free-form object handed to the connector constructor); everything else is
/// carried through uninterpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub connector: Option<String>,
    #[serde(default)]
    pub options: ConnectorOptions,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Parse an event from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| ImportError::InvalidEvent(format!("malformed event payload: {}", e)))
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| ImportError::InvalidEvent(format!("malformed event payload: {}", e)))
    }
}

/// Invocation metadata built by the entry point
///
/// Logged for traceability; never interpreted by the pipeline core.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    pub invocation_id: Uuid,
    pub invoked_at: DateTime<Utc>,
    /// What triggered this invocation, e.g. "cli" or "schedule"
    pub source: String,
}

impl Context {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            invoked_at: Utc::now(),
            source: source.into(),
        }
    }
}
