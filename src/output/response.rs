//! Crawl response envelope
//!
//! Every crawl invocation is reported as a single JSON object:
//!
//! ```json
//! {"success": true, "message": "Crawled and saved 2 comments", "data": [...]}
//! {"success": false, "message": "Crawling failed", "error": "..."}
//! ```

use crate::crawler::CrawlSummary;
use crate::feedback::FeedbackItem;
use serde::Serialize;

/// JSON envelope returned to callers of a crawl
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<FeedbackItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlResponse {
    /// Envelope for a finished crawl
    pub fn success(summary: CrawlSummary) -> Self {
        let data = if summary.total > 0 {
            summary.items
        } else {
            Vec::new()
        };

        Self {
            success: true,
            message: format!("Crawled and saved {} comments", summary.total),
            data: Some(data),
            error: None,
        }
    }

    /// Envelope for a failed crawl
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            message: "Crawling failed".to_string(),
            data: None,
            error: Some(error.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
