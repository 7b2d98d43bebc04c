//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Feedback-Crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every comment or review ever seen, keyed by its source container id
CREATE TABLE IF NOT EXISTS feedback (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    kind TEXT NOT NULL,
    source_id TEXT NOT NULL,
    company_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedback_company ON feedback(company_id);

-- Track crawl invocations
CREATE TABLE IF NOT EXISTS crawl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company_id TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    total_items INTEGER,
    error_message TEXT,
    config_hash TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_runs_company ON crawl_runs(company_id);
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
