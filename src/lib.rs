//! Feedback-Crawler: company feedback harvester
//!
//! This crate crawls the paginated listing of a company on a public review
//! site, extracts every comment and review it finds, and upserts them into a
//! SQLite store keyed by their source identifier.

pub mod config;
pub mod crawler;
pub mod feedback;
pub mod output;
pub mod service;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for Feedback-Crawler operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl capacity exhausted ({limit} crawls already running)")]
    Busy { limit: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Feedback-Crawler operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlPhase, CrawlSummary, Orchestrator};
pub use feedback::{FeedbackItem, FeedbackKind};
pub use service::CrawlService;
