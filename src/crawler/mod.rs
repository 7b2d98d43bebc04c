//! Crawler module for company listing traversal
//!
//! This module contains the core crawling logic, including:
//! - Pagination discovery on the listing root
//! - Per-page validity checks and scraping
//! - Feedback extraction from page markup
//! - Overall crawl orchestration

mod extract;
mod orchestrator;
mod pagination;
mod scraper;
mod validity;

pub use extract::extract_feedback;
pub use orchestrator::{CrawlPhase, CrawlSummary, Orchestrator};
pub use pagination::{count_pages, discover_page_count, listing_url, page_url};
pub use scraper::scrape_page;
pub use validity::{check_page, RejectReason, EMPTY_DOCUMENT};
