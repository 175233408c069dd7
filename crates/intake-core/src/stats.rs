//! Run statistics and result snapshot
//!
//! One `RunStats` is owned by a single pipeline run: zeroed at start, bumped
//! by the stages and the orchestrator, copied once into the final
//! `RunResult`. Counters are never reset mid-run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-stage counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Raw records returned by the fetch stage
    pub fetched: u64,
    /// Records that survived the transform stage
    pub transformed: u64,
    /// Records handed to a successful save (attempted count)
    pub saved: u64,
    /// Stage and per-record failures observed during the run
    pub errors: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the error count by one
    pub fn inc_errors(&mut self) {
        self.errors += 1;
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Overall run outcome
///
/// `Success` means zero errors were recorded, which includes the vacuous
/// case where fetch returned nothing at all. `Partial` means at least one
/// error occurred but the run still completed end-to-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot produced at the end of every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Success iff no errors were counted
    pub status: RunStatus,
    /// Final counter values, copied out of the run's `RunStats`
    pub stats: RunStats,
    /// Identifier of the connector that ran
    pub importer: String,
    /// Unique id for this run, generated at run start
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// Build the final snapshot; status is derived from the error count
    pub fn new(importer: &str, stats: RunStats, run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        let status = if stats.has_errors() {
            RunStatus::Partial
        } else {
            RunStatus::Success
        };

        Self {
            status,
            stats,
            importer: importer.to_string(),
            run_id,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
