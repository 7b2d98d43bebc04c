//! Output module for crawl results and stored statistics
//!
//! This module handles:
//! - The JSON envelope printed for every crawl invocation
//! - Per-company statistics read back from storage

mod response;
pub mod stats;

pub use response::CrawlResponse;
pub use stats::{
    format_company_statistics, load_company_statistics, print_company_statistics,
    CompanyStatistics,
};
