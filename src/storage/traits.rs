//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::feedback::{FeedbackItem, FeedbackKind};
use crate::storage::{RunRecord, StoredFeedback, UpsertOutcome};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Unknown feedback kind in database: {0}")]
    InvalidKind(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawler.
/// A store handle is owned by one crawl invocation at a time.
pub trait FeedbackStore {
    // ===== Feedback =====

    /// Inserts an item, or updates it in place when its id already exists
    ///
    /// On update only `text`, `kind`, `source_id` and `updated_at` change; the
    /// company an item was first stored under is kept.
    ///
    /// # Arguments
    ///
    /// * `company_id` - The company slug the item was scraped under
    /// * `item` - The scraped item
    fn upsert_feedback(
        &mut self,
        company_id: &str,
        item: &FeedbackItem,
    ) -> StorageResult<UpsertOutcome>;

    /// Gets an item by id
    fn get_feedback(&self, id: &str) -> StorageResult<Option<StoredFeedback>>;

    /// Lists a company's items in the order they were first stored
    fn list_feedback(&self, company_id: &str) -> StorageResult<Vec<StoredFeedback>>;

    /// Counts a company's items
    fn count_feedback(&self, company_id: &str) -> StorageResult<u64>;

    /// Counts a company's items per kind
    fn count_feedback_by_kind(&self, company_id: &str)
        -> StorageResult<HashMap<FeedbackKind, u64>>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, company_id: &str, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as completed with its item total
    fn complete_run(&mut self, run_id: i64, total_items: u64) -> StorageResult<()>;

    /// Marks a run as failed with the fault message
    fn fail_run(&mut self, run_id: i64, error_message: &str) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs for a company, newest first
    fn recent_runs(&self, company_id: &str, limit: u32) -> StorageResult<Vec<RunRecord>>;
}
