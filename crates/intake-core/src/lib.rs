//! Intake Core Library
//!
//! The three-stage import pipeline (fetch -> transform -> save) and its
//! supporting machinery:
//!
//! - **Records**: schema-free ordered field maps moved between stages
//! - **Pipeline**: the [`Importer`](pipeline::Importer) contract and the fixed
//!   [`run`](pipeline::run) orchestration
//! - **Statistics**: per-stage counters and the run result snapshot
//! - **Database**: a pooled, transaction-scoped Postgres access layer
//!
//! # Example
//!
//! ```no_run
//! use intake_core::db::{Database, DatabaseConfig};
//! use intake_core::pipeline;
//!
//! # async fn demo(importer: &dyn intake_core::pipeline::Importer)
//! # -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect(&DatabaseConfig::from_env()?).await?;
//! let result = pipeline::run(importer).await;
//! println!("{}: {:?}", result.importer, result.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod pipeline;
pub mod record;
pub mod stats;

// Re-export commonly used types
pub use config::ConnectorOptions;
pub use pipeline::Importer;
pub use record::{Batch, Record};
pub use stats::{RunResult, RunStats, RunStatus};
