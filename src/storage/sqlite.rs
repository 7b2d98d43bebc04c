//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the FeedbackStore trait.

use crate::config::StorageConfig;
use crate::feedback::{FeedbackItem, FeedbackKind};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FeedbackStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, StoredFeedback, UpsertOutcome};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const FEEDBACK_COLUMNS: &str =
    "id, text, kind, source_id, company_id, created_at, updated_at";

const RUN_COLUMNS: &str =
    "id, company_id, started_at, finished_at, status, total_items, error_message, config_hash";

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
    /// * `busy_timeout` - How long a statement waits on a lock held by another handle
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path, busy_timeout: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Several crawls may write to the same file at once
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Opens the database described by the storage configuration
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        Self::new(
            Path::new(&config.database_path),
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Current time as a fixed-width RFC 3339 string, so text order is time order
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Reads a feedback kind column, failing the row on unknown values
fn kind_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<FeedbackKind> {
    let raw: String = row.get(idx)?;
    FeedbackKind::from_db_string(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(StorageError::InvalidKind(raw)),
        )
    })
}

fn feedback_from_row(row: &Row<'_>) -> rusqlite::Result<StoredFeedback> {
    Ok(StoredFeedback {
        id: row.get(0)?,
        text: row.get(1)?,
        kind: kind_column(row, 2)?,
        source_id: row.get(3)?,
        company_id: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        company_id: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
        total_items: row.get::<_, Option<i64>>(5)?.map(|n| n as u64),
        error_message: row.get(6)?,
        config_hash: row.get(7)?,
    })
}

impl FeedbackStore for SqliteStorage {
    // ===== Feedback =====

    fn upsert_feedback(
        &mut self,
        company_id: &str,
        item: &FeedbackItem,
    ) -> StorageResult<UpsertOutcome> {
        // Takes the write lock up front so the existence check and the write
        // see the same row across handles
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM feedback WHERE id = ?1",
                params![item.id],
                |row| row.get(0),
            )
            .optional()?;

        let now = timestamp();
        tx.execute(
            "INSERT INTO feedback (id, text, kind, source_id, company_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                kind = excluded.kind,
                source_id = excluded.source_id,
                updated_at = excluded.updated_at",
            params![
                item.id,
                item.text,
                item.kind.to_db_string(),
                item.source_id,
                company_id,
                now
            ],
        )?;
        tx.commit()?;

        Ok(if exists.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn get_feedback(&self, id: &str) -> StorageResult<Option<StoredFeedback>> {
        let feedback = self
            .conn
            .query_row(
                &format!("SELECT {} FROM feedback WHERE id = ?1", FEEDBACK_COLUMNS),
                params![id],
                feedback_from_row,
            )
            .optional()?;
        Ok(feedback)
    }

    fn list_feedback(&self, company_id: &str) -> StorageResult<Vec<StoredFeedback>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM feedback WHERE company_id = ?1 ORDER BY created_at, rowid",
            FEEDBACK_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![company_id], feedback_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn count_feedback(&self, company_id: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM feedback WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_feedback_by_kind(
        &self,
        company_id: &str,
    ) -> StorageResult<HashMap<FeedbackKind, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT kind, COUNT(*) FROM feedback WHERE company_id = ?1 GROUP BY kind")?;

        let mut counts = HashMap::new();
        let rows = stmt.query_map(params![company_id], |row| {
            Ok((kind_column(row, 0)?, row.get::<_, i64>(1)?))
        })?;

        for row in rows {
            let (kind, count) = row?;
            counts.insert(kind, count as u64);
        }

        Ok(counts)
    }

    // ===== Run Management =====

    fn create_run(&mut self, company_id: &str, config_hash: &str) -> StorageResult<i64> {
        let now = timestamp();
        self.conn.execute(
            "INSERT INTO crawl_runs (company_id, started_at, status, config_hash) VALUES (?1, ?2, ?3, ?4)",
            params![company_id, now, RunStatus::Running.to_db_string(), config_hash],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, total_items: u64) -> StorageResult<()> {
        let now = timestamp();
        let updated = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, total_items = ?3 WHERE id = ?4",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                total_items as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, error_message: &str) -> StorageResult<()> {
        let now = timestamp();
        let updated = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, error_message, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, company_id: &str, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_runs WHERE company_id = ?1 ORDER BY id DESC LIMIT ?2",
            RUN_COLUMNS
        ))?;

        let runs = stmt
            .query_map(params![company_id, limit], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }
}
