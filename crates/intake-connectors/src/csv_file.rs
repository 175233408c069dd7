//! CSV file source connector
//!
//! Reads a delimited file with a header row, maps each data row to a record
//! keyed by header name, and upserts the batch keyed by `external_id`.
//! Headers arrive with inconsistent casing in the wild, so the transform
//! accepts both `ID` and `id` style columns.

use async_trait::async_trait;
use csv::ReaderBuilder;
use tracing::{error, info, warn};

use intake_common::{ImportError, Result};
use intake_core::db::{Database, SqlValue};
use intake_core::record::{Batch, Record};
use intake_core::stats::RunStats;
use intake_core::{ConnectorOptions, Importer};

const DEFAULT_TABLE: &str = "imported_data";
const DEFAULT_FILE: &str = "data.csv";

/// Importer for records held in a local delimited file
#[derive(Debug)]
pub struct CsvImporter {
    file_path: String,
    table_name: String,
    delimiter: u8,
    encoding: String,
    db: Database,
}

impl CsvImporter {
    /// Build the connector from free-form options
    ///
    /// All options are optional: `file_path` (default `data.csv`),
    /// `table_name`, `delimiter` (first byte of the option string),
    /// `encoding` (default `utf-8`).
    pub fn new(options: &ConnectorOptions, db: Database) -> Result<Self> {
        let delimiter = options
            .get_str_or("delimiter", ",")
            .bytes()
            .next()
            .unwrap_or(b',');

        Ok(Self {
            file_path: options.get_str_or("file_path", DEFAULT_FILE).to_string(),
            table_name: options.get_str_or("table_name", DEFAULT_TABLE).to_string(),
            delimiter,
            encoding: options.get_str_or("encoding", "utf-8").to_lowercase(),
            db,
        })
    }

    async fn fetch_inner(&self) -> Result<Batch> {
        let bytes = tokio::fs::read(&self.file_path)
            .await
            .map_err(|e| ImportError::source_unavailable(&self.file_path, e))?;

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                // Non-UTF-8 inputs (declared or not) are read lossily rather
                // than failing the whole file.
                warn!(
                    path = %self.file_path,
                    encoding = %self.encoding,
                    "file is not valid UTF-8, decoding lossily"
                );
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ImportError::source_unavailable(&self.file_path, e))?
            .clone();

        let mut batch = Batch::new();
        for (line, row) in reader.records().enumerate() {
            match row {
                Ok(row) => {
                    let mut record = Record::new();
                    for (header, field) in headers.iter().zip(row.iter()) {
                        record.insert(header.to_string(), field.to_string());
                    }
                    batch.push(record);
                }
                Err(e) => {
                    warn!(path = %self.file_path, line = line + 2, error = %e, "skipping malformed CSV row");
                }
            }
        }

        Ok(batch)
    }

    fn transform_record(record: &Record) -> Result<Record> {
        let external_id = field(record, &["ID", "id"])
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ImportError::missing_field("id"))?;

        let mut out = Record::new();
        out.insert("external_id", external_id);
        out.insert("name", field(record, &["Name", "name"]).unwrap_or_default());
        out.insert(
            "email",
            field(record, &["Email", "email"])
                .unwrap_or_default()
                .to_lowercase(),
        );
        out.insert(
            "phone",
            match field(record, &["Phone", "phone"]) {
                Some(phone) if !phone.is_empty() => serde_json::Value::String(phone),
                _ => serde_json::Value::Null,
            },
        );
        out.insert(
            "status",
            field(record, &["Status", "status"])
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "active".to_string()),
        );
        Ok(out)
    }

    fn upsert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (external_id, name, email, phone, status, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW())
             ON CONFLICT (external_id) DO UPDATE SET
                 name = EXCLUDED.name,
                 email = EXCLUDED.email,
                 phone = EXCLUDED.phone,
                 status = EXCLUDED.status,
                 updated_at = NOW()",
            self.table_name
        )
    }

    fn bind_row(record: &Record) -> Vec<SqlValue> {
        vec![
            SqlValue::Text(record.get_str("external_id").unwrap_or("").to_string()),
            SqlValue::Text(record.get_str("name").unwrap_or("").to_string()),
            SqlValue::Text(record.get_str("email").unwrap_or("").to_string()),
            record
                .get_str("phone")
                .map(SqlValue::from)
                .unwrap_or(SqlValue::Null),
            SqlValue::Text(record.get_str("status").unwrap_or("active").to_string()),
        ]
    }
}

/// First present value among alternative header spellings, trimmed
fn field(record: &Record, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| record.get_str(n))
        .map(str::trim)
        .next()
        .map(str::to_string)
}

#[async_trait]
impl Importer for CsvImporter {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch(&self) -> Result<Batch> {
        match self.fetch_inner().await {
            Ok(batch) => Ok(batch),
            Err(e) => {
                warn!(path = %self.file_path, error = %e, "CSV fetch failed, returning empty batch");
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
                    warn!(error = %e, "skipping CSV record");
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
                info!(table = %self.table_name, affected, "CSV batch upserted");
                Ok(true)
            }
            Err(e) => {
                error!(table = %self.table_name, error = %e, "CSV batch save failed");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use intake_core::db::DatabaseConfig;
    use std::io::Write;

    fn importer_for(path: &str, delimiter: Option<&str>) -> CsvImporter {
        let mut options = ConnectorOptions::new();
        options.insert("file_path", path);
        if let Some(d) = delimiter {
            options.insert("delimiter", d);
        }
        let db = Database::connect_lazy(&DatabaseConfig::default()).unwrap();
        CsvImporter::new(&options, db).unwrap()
    }

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_fetch_reads_header_keyed_records() {
        let file = write_fixture("ID,Name,Email\n1,Ada,ada@example.com\n2,Grace,grace@example.com\n");
        let importer = importer_for(file.path().to_str().unwrap(), None);

        let batch = importer.fetch().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].get_str("ID"), Some("1"));
        assert_eq!(batch[1].get_str("Email"), Some("grace@example.com"));
    }

    #[tokio::test]
    async fn test_fetch_with_semicolon_delimiter() {
        let file = write_fixture("id;name\nx-1;Ada\n");
        let importer = importer_for(file.path().to_str().unwrap(), Some(";"));

        let batch = importer.fetch().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].get_str("name"), Some("Ada"));
    }

    #[tokio::test]
    async fn test_fetch_missing_file_swallowed_to_empty() {
        let importer = importer_for("/nonexistent/intake-test.csv", None);
        let batch = importer.fetch().await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_skips_malformed_rows() {
        // second data row has too many fields
        let file = write_fixture("id,name\n1,Ada\n2,too,many,fields\n3,Grace\n");
        let importer = importer_for(file.path().to_str().unwrap(), None);

        let batch = importer.fetch().await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].get_str("id"), Some("1"));
        assert_eq!(batch[1].get_str("id"), Some("3"));
    }

    #[tokio::test]
    async fn test_transform_normalizes_and_defaults() {
        let file = write_fixture(
            "ID,Name,Email,Phone,Status\n7, Ada , ADA@Example.com ,,\n",
        );
        let importer = importer_for(file.path().to_str().unwrap(), None);

        let batch = importer.fetch().await.unwrap();
        let mut stats = RunStats::new();
        let out = importer.transform(batch, &mut stats).await.unwrap();

        assert_eq!(stats.errors, 0);
        let rec = &out[0];
        assert_eq!(rec.get_str("external_id"), Some("7"));
        assert_eq!(rec.get_str("name"), Some("Ada"));
        assert_eq!(rec.get_str("email"), Some("ada@example.com"));
        assert!(rec.get("phone").unwrap().is_null());
        assert_eq!(rec.get_str("status"), Some("active"));
    }

    #[tokio::test]
    async fn test_transform_counts_rows_without_id() {
        let file = write_fixture("id,name\n,NoId\nx-2,Ada\n");
        let importer = importer_for(file.path().to_str().unwrap(), None);

        let batch = importer.fetch().await.unwrap();
        let mut stats = RunStats::new();
        let out = importer.transform(batch, &mut stats).await.unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(out[0].get_str("external_id"), Some("x-2"));
    }

    #[tokio::test]
    async fn test_lowercase_headers_accepted() {
        let file = write_fixture("id,name,email,phone,status\n9,Grace,g@x.io,555,archived\n");
        let importer = importer_for(file.path().to_str().unwrap(), None);

        let batch = importer.fetch().await.unwrap();
        let mut stats = RunStats::new();
        let out = importer.transform(batch, &mut stats).await.unwrap();

        assert_eq!(out[0].get_str("external_id"), Some("9"));
        assert_eq!(out[0].get_str("phone"), Some("555"));
        assert_eq!(out[0].get_str("status"), Some("archived"));
    }

    #[tokio::test]
    async fn test_defaults_applied() {
        let db = Database::connect_lazy(&DatabaseConfig::default()).unwrap();
        let importer = CsvImporter::new(&ConnectorOptions::new(), db).unwrap();
        assert_eq!(importer.file_path, "data.csv");
        assert_eq!(importer.table_name, "imported_data");
        assert_eq!(importer.delimiter, b',');
        assert_eq!(importer.encoding, "utf-8");
    }

    #[tokio::test]
    async fn test_upsert_sql_shape() {
        let importer = importer_for("data.csv", None);
        let sql = importer.upsert_sql();
        assert!(sql.contains("INSERT INTO imported_data "));
        assert!(sql.contains("ON CONFLICT (external_id) DO UPDATE"));
    }
}
