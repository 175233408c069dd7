//! The three-stage import pipeline contract
//!
//! A connector implements [`Importer`] (fetch, transform, save, validate);
//! the orchestration lives in the free function [`run`] and is implemented
//! exactly once against the trait, so no connector can override the stage
//! sequencing or the failure policy.
//!
//! Failure policy: `run` never fails its caller. Stage errors are logged,
//! counted into the run's statistics, and absorbed; the function always
//! returns a well-formed [`RunResult`]. Panics are bugs and are not caught.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use intake_common::Result;

use crate::record::Batch;
use crate::stats::{RunResult, RunStats};

/// The capability set a source connector provides
///
/// Error handling expectations per stage:
///
/// - `fetch` catches its own retrieval failures (network, file-not-found)
///   internally, logs them, and returns an empty batch. An empty batch is
///   never an error. An `Err` from `fetch` is treated as an unclassified
///   failure by the orchestrator.
/// - `transform` isolates per-record failures: a failing record is skipped,
///   logged, and counted via `stats.inc_errors()`; it never aborts the batch.
/// - `save` reports batch-level success as a boolean and converts store
///   errors it can classify into `Ok(false)`. Implementations call
///   [`validate`](Importer::validate) before persisting.
#[async_trait]
pub trait Importer: Send + Sync + std::fmt::Debug {
    /// Connector identifier reported in run results
    fn name(&self) -> &str;

    /// Retrieve raw records from the source
    async fn fetch(&self) -> Result<Batch>;

    /// Map raw records to target shape, counting per-record failures
    async fn transform(&self, batch: Batch, stats: &mut RunStats) -> Result<Batch>;

    /// Persist the whole batch; `false` means the batch was not saved
    async fn save(&self, batch: &Batch) -> Result<bool>;

    /// Pre-save gate; the default rejects only empty batches
    fn validate(&self, batch: &Batch) -> bool {
        if batch.is_empty() {
            warn!(importer = self.name(), "validation failed: empty batch");
            return false;
        }
        true
    }
}

/// Run the pipeline to completion and report the outcome
///
/// Fixed algorithm: zero the statistics, fetch (stop early on an empty
/// batch), transform (stop early on an empty batch), save, snapshot. A save
/// that reports success sets `saved` to the attempted record count; a save
/// that reports failure or errors counts exactly one error regardless of
/// batch size.
pub async fn run(importer: &dyn Importer) -> RunResult {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut stats = RunStats::new();

    info!(importer = importer.name(), %run_id, "import run started");

    if let Err(e) = execute_stages(importer, &mut stats).await {
        error!(importer = importer.name(), %run_id, error = %e, "import stage failed");
        stats.inc_errors();
    }

    let result = RunResult::new(importer.name(), stats, run_id, started_at);
    info!(
        importer = %result.importer,
        %run_id,
        status = %result.status,
        fetched = result.stats.fetched,
        transformed = result.stats.transformed,
        saved = result.stats.saved,
        errors = result.stats.errors,
        duration_secs = result.duration_secs(),
        "import run finished"
    );
    result
}

async fn execute_stages(importer: &dyn Importer, stats: &mut RunStats) -> Result<()> {
    let raw = importer.fetch().await?;
    stats.fetched = raw.len() as u64;
    if raw.is_empty() {
        info!(importer = importer.name(), "fetch returned no records");
        return Ok(());
    }
    info!(importer = importer.name(), fetched = stats.fetched, "fetch stage complete");

    let transformed = importer.transform(raw, stats).await?;
    stats.transformed = transformed.len() as u64;
    if transformed.is_empty() {
        info!(importer = importer.name(), "no records survived transform");
        return Ok(());
    }
    info!(
        importer = importer.name(),
        transformed = stats.transformed,
        "transform stage complete"
    );

    match importer.save(&transformed).await {
        Ok(true) => {
            // Attempted count, not a store-confirmed per-row count.
            stats.saved = stats.transformed;
            info!(importer = importer.name(), saved = stats.saved, "save stage complete");
        }
        Ok(false) => {
            warn!(importer = importer.name(), "save stage reported failure");
            stats.inc_errors();
        }
        Err(e) => {
            error!(importer = importer.name(), error = %e, "save stage failed");
            stats.inc_errors();
        }
    }

    Ok(())
}
