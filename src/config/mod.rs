//! Configuration module for Feedback-Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use feedback_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("feedback-crawler.toml")).unwrap();
//! println!("Crawling listings under: {}", config.site.root_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AdmissionPolicy, BrowserConfig, Config, EngineKind, ServiceConfig, SiteConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
