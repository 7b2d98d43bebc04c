//! Statistics generation from the feedback database
//!
//! This module provides functionality for extracting and displaying
//! per-company statistics from the storage layer.

use crate::feedback::FeedbackKind;
use crate::storage::{FeedbackStore, RunRecord, StorageResult};
use std::fmt::Write;

/// How many recent runs are shown
const RECENT_RUN_LIMIT: u32 = 5;

/// Stored statistics for one company
#[derive(Debug, Clone)]
pub struct CompanyStatistics {
    /// The company slug
    pub company_id: String,

    /// Total number of stored items
    pub total: u64,

    /// Number of stored comments
    pub comments: u64,

    /// Number of stored reviews
    pub reviews: u64,

    /// Earliest `created_at` among the company's items
    pub first_seen: Option<String>,

    /// Latest `updated_at` among the company's items
    pub last_updated: Option<String>,

    /// Most recent crawl runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics for one company
///
/// # Arguments
///
/// * `store` - The storage backend to query
/// * `company_id` - The company slug
///
/// # Returns
///
/// * `Ok(CompanyStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_company_statistics(
    store: &dyn FeedbackStore,
    company_id: &str,
) -> StorageResult<CompanyStatistics> {
    let total = store.count_feedback(company_id)?;
    let by_kind = store.count_feedback_by_kind(company_id)?;
    let items = store.list_feedback(company_id)?;

    let first_seen = items.iter().map(|i| i.created_at.clone()).min();
    let last_updated = items.iter().map(|i| i.updated_at.clone()).max();

    let recent_runs = store.recent_runs(company_id, RECENT_RUN_LIMIT)?;

    Ok(CompanyStatistics {
        company_id: company_id.to_string(),
        total,
        comments: by_kind.get(&FeedbackKind::Comment).copied().unwrap_or(0),
        reviews: by_kind.get(&FeedbackKind::Review).copied().unwrap_or(0),
        first_seen,
        last_updated,
        recent_runs,
    })
}

/// Renders statistics as the text shown by `--stats`
pub fn format_company_statistics(stats: &CompanyStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Feedback Statistics: {} ===\n", stats.company_id);

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total items: {}", stats.total);
    let _ = writeln!(out, "  Comments: {}", stats.comments);
    let _ = writeln!(out, "  Reviews: {}", stats.reviews);
    if let Some(first) = &stats.first_seen {
        let _ = writeln!(out, "  First seen: {}", first);
    }
    if let Some(last) = &stats.last_updated {
        let _ = writeln!(out, "  Last updated: {}", last);
    }
    let _ = writeln!(out);

    if stats.recent_runs.is_empty() {
        let _ = writeln!(out, "No crawl runs recorded");
        return out;
    }

    let _ = writeln!(out, "Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        let _ = write!(
            out,
            "  #{} {} started {}",
            run.id,
            run.status.to_db_string(),
            run.started_at
        );
        if let Some(total) = run.total_items {
            let _ = write!(out, ", {} item(s)", total);
        }
        if let Some(message) = &run.error_message {
            let _ = write!(out, ", error: {}", message);
        }
        let _ = writeln!(out);
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_company_statistics(stats: &CompanyStatistics) {
    print!("{}", format_company_statistics(stats));
}
