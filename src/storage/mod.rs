//! Storage module for persisting scraped feedback
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent feedback upserts keyed by container id
//! - Crawl run bookkeeping

mod schema;
mod sqlite;
mod traits;
mod writer;

pub use sqlite::SqliteStorage;
pub use traits::{FeedbackStore, StorageError, StorageResult};
pub use writer::{PersistOutcome, PersistenceWriter};

use crate::feedback::FeedbackKind;

/// Whether an upsert created a row or rewrote an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Represents a feedback row in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFeedback {
    pub id: String,
    pub text: String,
    pub kind: FeedbackKind,
    pub source_id: String,
    pub company_id: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub company_id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub total_items: Option<u64>,
    pub error_message: Option<String>,
    pub config_hash: String,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
