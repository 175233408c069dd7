//! Error types for the intake pipeline

use thiserror::Error;

/// Result type alias for intake operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Main error type for the intake pipeline
///
/// Each variant maps to one recovery policy: `SourceUnavailable` is swallowed
/// at the connector level, `RecordTransform` skips a single record,
/// `Persistence` fails one save attempt, and everything else surfaces to the
/// run boundary where it is counted and absorbed.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Record transform failed: {0}")]
    RecordTransform(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid event payload: {0}")]
    InvalidEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ImportError {
    /// Create a source-unavailable error with source context
    pub fn source_unavailable(source: &str, detail: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable(format!("{}: {}", source, detail))
    }

    /// Create a per-record transform error naming the offending field
    pub fn missing_field(field: &str) -> Self {
        Self::RecordTransform(format!("required field '{}' is missing or empty", field))
    }
}
