//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{ResultRecord, RunRecord, RunStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Run {run_id} is already {status}")]
    RunFinished { run_id: i64, status: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to persist traversal
/// runs and their results.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new run in the `running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status and finish timestamp of a running run
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Results =====

    /// Stores results and their discovered links in one transaction
    ///
    /// Results already stored for the run are skipped.
    ///
    /// # Returns
    ///
    /// The number of newly stored results
    fn record_results(&mut self, run_id: i64, results: &[ResultRecord]) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Counts stored results for a run
    fn count_results(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts stored failed results for a run
    fn count_failed(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts stored links for a run
    fn count_links(&self, run_id: i64) -> StorageResult<u64>;

    /// Gets result counts per status value for a run
    fn count_by_status(&self, run_id: i64) -> StorageResult<BTreeMap<String, u64>>;
}
