//! Output module for exporting traversal results
//!
//! This module handles:
//! - Exporting results as CSV
//! - Persisting results to the storage layer
//! - Computing and printing traversal statistics

pub mod csv;
pub mod stats;

pub use self::csv::{export_csv, write_csv, CSV_HEADER};
pub use stats::{
    load_statistics, print_run_statistics, print_statistics, DurationSummary, RunStatistics,
    TraversalStatistics,
};

use crate::storage::{ResultRecord, RunStatus, Storage};
use crate::traversal::{ProcessingResult, StatusCode, TraversalReport};
use crate::SumiError;

/// Writes a result snapshot into storage under `run_id`
///
/// # Returns
///
/// * `Ok(usize)` - Number of newly stored results
/// * `Err(SumiError)` - The write failed; nothing from this call is kept
pub fn persist_results<T: StatusCode>(
    storage: &mut dyn Storage,
    run_id: i64,
    results: &[ProcessingResult<T>],
) -> Result<usize, SumiError> {
    let records: Vec<ResultRecord> = results.iter().map(ResultRecord::from_result).collect();
    let stored = storage.record_results(run_id, &records)?;
    tracing::info!("Persisted {} results for run {}", stored, run_id);
    Ok(stored)
}

/// Stores a finished traversal and closes its run
///
/// The run ends `interrupted` if the traversal was cancelled or the results
/// could not be stored, `completed` otherwise. It never stays `running`.
///
/// # Returns
///
/// * `Ok(usize)` - Number of newly stored results
/// * `Err(SumiError)` - Storing failed; the run is still closed as interrupted
pub fn record_run<T: StatusCode>(
    storage: &mut dyn Storage,
    run_id: i64,
    report: &TraversalReport<T>,
) -> Result<usize, SumiError> {
    let stored = match persist_results(storage, run_id, &report.results) {
        Ok(stored) => stored,
        Err(e) => {
            abandon_run(storage, run_id);
            return Err(e);
        }
    };

    let status = if report.cancelled {
        RunStatus::Interrupted
    } else {
        RunStatus::Completed
    };
    storage.finish_run(run_id, status)?;
    Ok(stored)
}

/// Marks a run interrupted after a failure, logging if even that fails
pub fn abandon_run(storage: &mut dyn Storage, run_id: i64) {
    if let Err(e) = storage.finish_run(run_id, RunStatus::Interrupted) {
        tracing::error!("Failed to mark run {} interrupted: {}", run_id, e);
    }
}
