//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Frontier database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track traversal runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per processed identifier per run
CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    identifier TEXT NOT NULL,
    sequence_id INTEGER NOT NULL,
    depth INTEGER NOT NULL,
    discovered_from TEXT,
    status TEXT NOT NULL,
    succeeded INTEGER NOT NULL,
    error_message TEXT,
    elapsed_ms INTEGER NOT NULL,
    gate_wait_ms INTEGER NOT NULL,
    processed_at TEXT NOT NULL,
    discovered_count INTEGER NOT NULL,
    UNIQUE(run_id, identifier)
);

CREATE INDEX IF NOT EXISTS idx_results_run ON results(run_id);
CREATE INDEX IF NOT EXISTS idx_results_status ON results(status);

-- Track discovered link relationships
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    from_identifier TEXT NOT NULL,
    to_identifier TEXT NOT NULL,
    UNIQUE(run_id, from_identifier, to_identifier)
);

CREATE INDEX IF NOT EXISTS idx_links_from ON links(from_identifier);
CREATE INDEX IF NOT EXISTS idx_links_to ON links(to_identifier);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
