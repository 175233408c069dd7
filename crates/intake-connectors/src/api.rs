//! HTTP API source connector
//!
//! Fetches a JSON payload from a configured endpoint, normalizes each object
//! into the target contact shape, and upserts the batch keyed by
//! `external_id`. The raw record travels along as jsonb metadata.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

use intake_common::{ImportError, Result};
use intake_core::db::{Database, SqlValue};
use intake_core::record::{Batch, Record};
use intake_core::stats::RunStats;
use intake_core::{ConnectorOptions, Importer};

const DEFAULT_TABLE: &str = "imported_data";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Importer for JSON records served over HTTP
#[derive(Debug)]
pub struct ApiImporter {
    api_url: String,
    api_key: Option<String>,
    table_name: String,
    client: reqwest::Client,
    db: Database,
}

impl ApiImporter {
    /// Build the connector from free-form options
    ///
    /// `api_url` is required; `api_key`, `table_name`, and `timeout_secs`
    /// are optional.
    pub fn new(options: &ConnectorOptions, db: Database) -> Result<Self> {
        let api_url = options
            .get_str("api_url")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ImportError::Config("api_url option is required".to_string()))?
            .to_string();

        let timeout_secs = options.get_u64("timeout_secs").unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ImportError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            api_key: options.get_str("api_key").map(str::to_string),
            table_name: options.get_str_or("table_name", DEFAULT_TABLE).to_string(),
            client,
            db,
        })
    }

    async fn fetch_inner(&self) -> Result<Batch> {
        let mut request = self.client.get(&self.api_url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ImportError::source_unavailable("api", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::source_unavailable(
                "api",
                format!("HTTP {} from {}", status, self.api_url),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ImportError::source_unavailable("api", e))?;

        Ok(Self::records_from_body(body))
    }

    /// Accepts a top-level array or an object with a `data` array; anything
    /// else yields an empty batch
    fn records_from_body(body: Value) -> Batch {
        let items = match body {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(items)) => items,
                _ => {
                    warn!("API response object has no 'data' array");
                    return Batch::new();
                }
            },
            _ => {
                warn!("API response is neither an array nor an object");
                return Batch::new();
            }
        };

        let mut batch = Batch::new();
        for item in items {
            match item {
                Value::Object(map) => batch.push(Record::from(map)),
                other => warn!(value = %other, "skipping non-object API record"),
            }
        }
        batch
    }

    fn transform_record(record: &Record) -> Result<Record> {
        let external_id = record
            .get("id")
            .filter(|v| !v.is_null())
            .map(scalar_to_string)
            .transpose()?
            .ok_or_else(|| ImportError::missing_field("id"))?;

        let mut out = Record::new();
        out.insert("external_id", external_id);
        out.insert("name", record.get_str("name").unwrap_or("").trim());
        out.insert(
            "email",
            record.get_str("email").unwrap_or("").trim().to_lowercase(),
        );
        out.insert("status", record.get_str("status").unwrap_or("active"));
        out.insert(
            "created_at",
            record
                .first_of(&["created_at", "date"])
                .map(scalar_to_string)
                .transpose()?
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        // full raw payload kept alongside the normalized columns
        out.insert("metadata", record.to_value());
        Ok(out)
    }

    fn upsert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (external_id, name, email, status, created_at, metadata, updated_at)
             VALUES ($1, $2, $3, $4, $5::timestamptz, $6::jsonb, NOW())
             ON CONFLICT (external_id) DO UPDATE SET
                 name = EXCLUDED.name,
                 email = EXCLUDED.email,
                 status = EXCLUDED.status,
                 created_at = EXCLUDED.created_at,
                 metadata = EXCLUDED.metadata,
                 updated_at = NOW()",
            self.table_name
        )
    }

    fn bind_row(record: &Record) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(record.get_str("external_id").unwrap_or("").to_string()),
            SqlValue::Text(record.get_str("name").unwrap_or("").to_string()),
            SqlValue::Text(record.get_str("email").unwrap_or("").to_string()),
            SqlValue::Text(record.get_str("status").unwrap_or("active").to_string()),
            record
                .get_str("created_at")
                .map(SqlValue::from)
                .unwrap_or(SqlValue::Null),
            SqlValue::Json(record.get("metadata").cloned().unwrap_or(Value::Null)),
        ]
    }
}

/// Render a scalar JSON value as a string; rejects arrays and objects
fn scalar_to_string(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ImportError::RecordTransform(format!(
            "expected a scalar value, got {}",
            value
        ))),
    }
}

#[async_trait]
impl Importer for ApiImporter {
    fn name(&self) -> &str {
        "api"
    }

    async fn fetch(&self) -> Result<Batch> {
        match self.fetch_inner().await {
            Ok(batch) => Ok(batch),
            Err(e) => {
                warn!(url = %self.api_url, error = %e, "API fetch failed, returning empty batch");
                Ok(Batch::new())
            }
        }
    }

    async fn transform(&self, batch: Batch, stats: &mut RunStats) -> Result<Batch> {
        let mut out = Batch::new();
        for record in &batch {
            match Self::transform_record(record) {
                Ok(transformed) => out.push(transformed),
                Err(e) => {
                    warn!(error = %e, "skipping API record");
                    stats.inc_errors();
                }
            }
        }
        Ok(out)
    }

    async fn save(&self, batch: &Batch) -> Result<bool> {
        if !self.validate(batch) {
            return Ok(false);
        }

        let rows: Vec<Vec<SqlValue>> = batch.iter().map(Self::bind_row).collect();
        match self.db.batch_execute(&self.upsert_sql(), &rows).await {
            Ok(affected) => {
                info!(table = %self.table_name, affected, "API batch upserted");
                Ok(true)
            }
            Err(e) => {
                error!(table = %self.table_name, error = %e, "API batch save failed");
                Ok(false)
            }
        }
    }
}
