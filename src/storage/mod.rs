//! Storage module for persisting traversal runs
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Run tracking with a final status
//! - Result and link persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::traversal::{ProcessingResult, StatusCode};
use crate::SumiError;
use chrono::SecondsFormat;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SumiError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SumiError> {
    SqliteStorage::new(path)
}

/// A processing result flattened for persistence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub identifier: String,
    pub sequence_id: u64,
    pub depth: u32,
    pub discovered_from: Option<String>,
    pub status: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
    pub gate_wait_ms: u64,
    pub processed_at: String,
    pub discovered: Vec<String>,
}

impl ResultRecord {
    pub fn from_result<T: StatusCode>(result: &ProcessingResult<T>) -> Self {
        Self {
            identifier: result.item.identifier.clone(),
            sequence_id: result.item.sequence_id,
            depth: result.item.depth,
            discovered_from: result.item.discovered_from.clone(),
            status: result.status_label(),
            succeeded: result.is_success(),
            error_message: result.error().map(|e| e.to_string()),
            elapsed_ms: result.elapsed.as_millis() as u64,
            gate_wait_ms: result.gate_wait.as_millis() as u64,
            processed_at: result
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            discovered: result.discovered.clone(),
        }
    }
}

/// Represents a traversal run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a traversal run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}
