//! Intake Connectors Library
//!
//! Concrete source connectors for the intake pipeline, plus the registry
//! that selects one by kind at construction time.
//!
//! # Supported Sources
//!
//! - **API** ([`ApiImporter`]): JSON records fetched over HTTP
//! - **CSV** ([`CsvImporter`]): delimited records read from a local file
//!
//! # Example
//!
//! ```no_run
//! use intake_connectors::{build, ConnectorKind};
//! use intake_core::{db::{Database, DatabaseConfig}, ConnectorOptions};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect(&DatabaseConfig::from_env()?).await?;
//! let mut options = ConnectorOptions::new();
//! options.insert("file_path", "./contacts.csv");
//!
//! let importer = build(ConnectorKind::Csv, &options, db)?;
//! let result = intake_core::pipeline::run(importer.as_ref()).await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod csv_file;

use intake_common::{ImportError, Result};
use intake_core::db::Database;
use intake_core::{ConnectorOptions, Importer};

pub use api::ApiImporter;
pub use csv_file::CsvImporter;

/// The connector kinds this workspace ships
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Api,
    Csv,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectorKind::Api => "api",
            ConnectorKind::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ConnectorKind {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "api" => Ok(ConnectorKind::Api),
            "csv" => Ok(ConnectorKind::Csv),
            other => Err(ImportError::InvalidEvent(format!(
                "unknown connector kind: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Construct the connector for the given kind
///
/// Options are validated here so a bad configuration fails the invocation
/// before the pipeline starts.
pub fn build(
    kind: ConnectorKind,
    options: &ConnectorOptions,
    db: Database,
) -> Result<Box<dyn Importer>> {
    match kind {
        ConnectorKind::Api => Ok(Box::new(ApiImporter::new(options, db)?)),
        ConnectorKind::Csv => Ok(Box::new(CsvImporter::new(options, db)?)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use intake_core::db::DatabaseConfig;

    fn lazy_db() -> Database {
        Database::connect_lazy(&DatabaseConfig::default()).unwrap()
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("api".parse::<ConnectorKind>().unwrap(), ConnectorKind::Api);
        assert_eq!("CSV".parse::<ConnectorKind>().unwrap(), ConnectorKind::Csv);
        assert!("ftp".parse::<ConnectorKind>().is_err());
    }

    #[test]
    fn test_kind_display_round_trip() {
        for kind in [ConnectorKind::Api, ConnectorKind::Csv] {
            assert_eq!(kind.to_string().parse::<ConnectorKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_build_csv_with_defaults() {
        let importer = build(ConnectorKind::Csv, &ConnectorOptions::new(), lazy_db()).unwrap();
        assert_eq!(importer.name(), "csv");
    }

    #[tokio::test]
    async fn test_build_api_requires_url() {
        let err = build(ConnectorKind::Api, &ConnectorOptions::new(), lazy_db()).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[tokio::test]
    async fn test_build_api_with_url() {
        let mut options = ConnectorOptions::new();
        options.insert("api_url", "https://example.com/export");
        let importer = build(ConnectorKind::Api, &options, lazy_db()).unwrap();
        assert_eq!(importer.name(), "api");
    }
}
