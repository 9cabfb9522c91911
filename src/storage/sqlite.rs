//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ResultRecord, RunRecord, RunStatus};
use crate::SumiError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SumiError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SumiError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, SumiError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let run = self.get_run(run_id)?;
        if run.status != RunStatus::Running {
            return Err(StorageError::RunFinished {
                run_id,
                status: run.status.to_db_string().to_string(),
            });
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    // ===== Results =====

    fn record_results(&mut self, run_id: i64, results: &[ResultRecord]) -> StorageResult<usize> {
        // Fail with RunNotFound rather than a foreign key error
        self.get_run(run_id)?;

        let tx = self.conn.transaction()?;
        let mut stored = 0;
        {
            let mut insert_result = tx.prepare(
                "INSERT OR IGNORE INTO results (
                    run_id, identifier, sequence_id, depth, discovered_from, status, succeeded,
                    error_message, elapsed_ms, gate_wait_ms, processed_at, discovered_count
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            let mut insert_link = tx.prepare(
                "INSERT OR IGNORE INTO links (run_id, from_identifier, to_identifier)
                 VALUES (?1, ?2, ?3)",
            )?;

            for record in results {
                stored += insert_result.execute(params![
                    run_id,
                    record.identifier,
                    record.sequence_id as i64,
                    record.depth,
                    record.discovered_from,
                    record.status,
                    record.succeeded,
                    record.error_message,
                    record.elapsed_ms as i64,
                    record.gate_wait_ms as i64,
                    record.processed_at,
                    record.discovered.len() as i64,
                ])?;

                for target in &record.discovered {
                    insert_link.execute(params![run_id, record.identifier, target])?;
                }
            }
        }
        tx.commit()?;

        Ok(stored)
    }

    // ===== Statistics =====

    fn count_results(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM results WHERE run_id = ?1", run_id)
    }

    fn count_failed(&self, run_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM results WHERE run_id = ?1 AND succeeded = 0",
            run_id,
        )
    }

    fn count_links(&self, run_id: i64) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM links WHERE run_id = ?1", run_id)
    }

    fn count_by_status(&self, run_id: i64) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT status, COUNT(*) FROM results WHERE run_id = ?1 GROUP BY status",
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = BTreeMap::new();
        for row in rows {
            let (status, count) = row?;
            counts.insert(status, count as u64);
        }
        Ok(counts)
    }
}
