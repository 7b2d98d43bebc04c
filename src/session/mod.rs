//! Browser session abstraction
//!
//! A session owns one automation-engine instance and one navigable page for
//! the lifetime of a single crawl. Navigation and evaluation are strictly
//! sequential, which is why every operation takes `&mut self`.
//!
//! Two engines are provided:
//! - [`ChromiumLauncher`] drives headless Chromium and waits for network
//!   quiescence after each navigation
//! - [`HttpLauncher`] fetches raw markup over HTTP without running scripts

mod chromium;
mod http;

pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use http::{build_http_client, HttpLauncher, HttpSession};

use crate::config::{BrowserConfig, EngineKind};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a browser session
///
/// None of these are recovered by the crawler; a session error aborts the
/// crawl invocation that owns the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Navigation to {url} timed out")]
    Timeout { url: String },
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// What a completed navigation reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// Status of the main document response, None when the engine saw no response
    pub status: Option<u16>,
}

/// One navigable page context backed by an automation engine
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates to `url` and waits until the page has settled
    async fn navigate(&mut self, url: &str) -> SessionResult<PageResponse>;

    /// Returns the serialized markup of the current document
    async fn content(&mut self) -> SessionResult<String>;

    /// Returns the current document title, empty when there is none
    async fn title(&mut self) -> SessionResult<String>;

    /// Shuts the engine down; later calls are no-ops
    async fn close(&mut self) -> SessionResult<()>;
}

/// Creates fresh, isolated sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> SessionResult<Box<dyn BrowserSession>>;
}

/// Picks the launcher for the configured engine
pub fn launcher_for(config: &BrowserConfig) -> Arc<dyn SessionLauncher> {
    match config.engine {
        EngineKind::Chromium => Arc::new(ChromiumLauncher::new(config.clone())),
        EngineKind::Http => Arc::new(HttpLauncher::new(config.clone())),
    }
}
