//! Plain HTTP session
//!
//! This engine fetches listing pages with reqwest and never runs scripts, so
//! it only sees what the server renders. The page is "settled" as soon as the
//! body has been read. It is the engine used against static mirrors and in
//! the integration tests.

use crate::config::BrowserConfig;
use crate::session::{BrowserSession, PageResponse, SessionError, SessionLauncher, SessionResult};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

/// Default user agent when the config does not override it
const DEFAULT_USER_AGENT: &str = concat!("feedback-crawler/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The browser configuration (user agent and timeout are used)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &BrowserConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_millis(config.navigation_timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Launches [`HttpSession`]s, each with its own client
pub struct HttpLauncher {
    config: BrowserConfig,
}

impl HttpLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for HttpLauncher {
    async fn launch(&self) -> SessionResult<Box<dyn BrowserSession>> {
        let client = build_http_client(&self.config)
            .map_err(|e| SessionError::Launch(format!("HTTP client: {}", e)))?;
        tracing::debug!("Launched HTTP session");
        Ok(Box::new(HttpSession::new(client)))
    }
}

/// The last document fetched by an [`HttpSession`]
struct LoadedDocument {
    body: String,
    title: String,
}

/// Session that treats each GET response as the rendered page
pub struct HttpSession {
    client: Client,
    current: Option<LoadedDocument>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: None,
        }
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<PageResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status().as_u16();

        let body = response.text().await.map_err(|e| SessionError::Http {
            url: url.to_string(),
            source: e,
        })?;

        let title = extract_title(&body);
        tracing::trace!("Fetched {} ({} bytes, status {})", url, body.len(), status);

        self.current = Some(LoadedDocument { body, title });

        Ok(PageResponse {
            status: Some(status),
        })
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.current
            .as_ref()
            .map(|doc| doc.body.clone())
            .ok_or_else(|| SessionError::Evaluation("no document loaded".to_string()))
    }

    async fn title(&mut self) -> SessionResult<String> {
        Ok(self
            .current
            .as_ref()
            .map(|doc| doc.title.clone())
            .unwrap_or_default())
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.current = None;
        Ok(())
    }
}

/// Maps a transport failure to a session error
fn classify_request_error(url: &str, e: reqwest::Error) -> SessionError {
    if e.is_timeout() {
        SessionError::Timeout {
            url: url.to_string(),
        }
    } else {
        SessionError::Http {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Extracts the document title the way a browser reports `document.title`
fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let config = BrowserConfig::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_build_http_client_with_user_agent() {
        let config = BrowserConfig {
            user_agent: Some("FeedbackBot/2.0".to_string()),
            ..BrowserConfig::default()
        };
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Công ty   ABC  </title></head><body></body></html>"#;
        assert_eq!(extract_title(html), "Công ty ABC");
    }

    #[test]
    fn test_missing_title_is_empty() {
        assert_eq!(extract_title("<html><head></head><body></body></html>"), "");
    }

    #[tokio::test]
    async fn test_content_before_navigation_fails() {
        let client = build_http_client(&BrowserConfig::default()).unwrap();
        let mut session = HttpSession::new(client);

        assert!(matches!(
            session.content().await,
            Err(SessionError::Evaluation(_))
        ));
        assert_eq!(session.title().await.unwrap(), "");
    }
}
