//! Crawl orchestration
//!
//! One crawl of one company runs through these phases:
//!
//! ```text
//! Start -> Discovering -> Scraping(1 of N) ... Scraping(N of N) -> Persisting -> Done
//! ```
//!
//! Any phase may end in `Failed`. The session launched in `Start` is closed
//! exactly once whichever way the crawl ends, and nothing is written unless
//! every page was scraped without a fault.

use crate::crawler::pagination::discover_page_count;
use crate::crawler::scraper::scrape_page;
use crate::feedback::FeedbackItem;
use crate::session::{BrowserSession, SessionLauncher};
use crate::storage::{FeedbackStore, PersistenceWriter};
use crate::HarvestError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Where a crawl currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Start,
    Discovering,
    Scraping { page: u32, of: u32 },
    Persisting,
    Done,
    Failed,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Discovering => write!(f, "discovering"),
            Self::Scraping { page, of } => write!(f, "scraping {} of {}", page, of),
            Self::Persisting => write!(f, "persisting"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of a successful crawl
///
/// `items` are in reverse encounter order: the last item of the last page comes first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub total: usize,
    pub items: Vec<FeedbackItem>,
}

/// Drives a single company crawl over a fresh session
pub struct Orchestrator {
    launcher: Arc<dyn SessionLauncher>,
    root_url: String,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn SessionLauncher>, root_url: impl Into<String>) -> Self {
        Self {
            launcher,
            root_url: root_url.into(),
        }
    }

    /// Crawls every listing page of `slug` and persists what was found
    ///
    /// # Arguments
    ///
    /// * `slug` - Company identifier, used verbatim as path segment and partition key
    /// * `writer` - Writer owning this invocation's store handle
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Items found, in reverse encounter order
    /// * `Err(HarvestError)` - Launch, navigation, evaluation or write fault
    pub async fn run<S: FeedbackStore>(
        &self,
        slug: &str,
        writer: &mut PersistenceWriter<S>,
    ) -> crate::Result<CrawlSummary> {
        log_phase(slug, CrawlPhase::Start);
        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                log_phase(slug, CrawlPhase::Failed);
                return Err(e.into());
            }
        };

        let outcome = self.drive(session.as_mut(), slug, writer).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session for '{}': {}", slug, e);
        }

        match outcome {
            Ok(summary) => {
                log_phase(slug, CrawlPhase::Done);
                tracing::info!("Crawl of '{}' finished with {} item(s)", slug, summary.total);
                Ok(summary)
            }
            Err(e) => {
                log_phase(slug, CrawlPhase::Failed);
                tracing::error!("Crawl of '{}' failed: {}", slug, e);
                Err(e)
            }
        }
    }

    async fn drive<S: FeedbackStore>(
        &self,
        session: &mut dyn BrowserSession,
        slug: &str,
        writer: &mut PersistenceWriter<S>,
    ) -> crate::Result<CrawlSummary> {
        log_phase(slug, CrawlPhase::Discovering);
        let pages = discover_page_count(session, &self.root_url, slug).await?;

        let mut items = Vec::new();
        for page in 1..=pages {
            log_phase(slug, CrawlPhase::Scraping { page, of: pages });
            let found = scrape_page(session, &self.root_url, slug, page).await?;
            if found.is_empty() {
                tracing::debug!("Page {} of '{}' contributed nothing", page, slug);
                continue;
            }
            items.extend(found);
        }

        items.reverse();

        log_phase(slug, CrawlPhase::Persisting);
        writer.persist(slug, &items).map_err(HarvestError::from)?;

        Ok(CrawlSummary {
            total: items.len(),
            items,
        })
    }
}

fn log_phase(slug: &str, phase: CrawlPhase) {
    tracing::debug!("Crawl of '{}': {}", slug, phase);
}
