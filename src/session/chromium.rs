//! Headless Chromium session
//!
//! Each session launches its own Chromium process with a single tab. After a
//! navigation the session keeps watching the tab's network events and only
//! returns once no request has been in flight for the configured idle window
//! (the "network idle" signal). The whole navigation, including that wait,
//! is bounded by `navigation-timeout-ms`.

use crate::config::BrowserConfig;
use crate::session::{BrowserSession, PageResponse, SessionError, SessionLauncher, SessionResult};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, SetUserAgentOverrideParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use std::collections::HashSet;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Launches one Chromium process per session
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self) -> SessionResult<chromiumoxide::BrowserConfig> {
        let mut builder = chromiumoxide::BrowserConfig::builder()
            .request_timeout(Duration::from_millis(self.config.navigation_timeout_ms));

        if self.config.no_sandbox {
            builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
        }

        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(SessionError::Launch)
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> SessionResult<Box<dyn BrowserSession>> {
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The handler drives the CDP connection and must be polled for the
        // browser to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Chromium handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(format!("new page: {}", e)))?;

        if let Some(agent) = &self.config.user_agent {
            page.set_user_agent(SetUserAgentOverrideParams::new(agent.clone()))
                .await
                .map_err(|e| SessionError::Launch(format!("user agent: {}", e)))?;
        }

        tracing::debug!("Launched Chromium session");

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
            idle_time: Duration::from_millis(self.config.idle_time_ms),
            navigation_timeout: Duration::from_millis(self.config.navigation_timeout_ms),
            closed: false,
        }))
    }
}

/// How a failed `goto` should be treated
#[derive(Debug)]
enum GotoFailure {
    /// The server answered with an error status and no renderable body.
    /// The navigation itself completed.
    ErrorStatus,
    /// The page could not be reached
    Fatal(SessionError),
}

/// Chrome's error for a 4xx/5xx response it will not render
const HTTP_RESPONSE_CODE_FAILURE: &str = "net::ERR_HTTP_RESPONSE_CODE_FAILURE";

fn classify_goto_error(url: &str, e: CdpError) -> GotoFailure {
    match e {
        CdpError::ChromeMessage(message) if message.contains(HTTP_RESPONSE_CODE_FAILURE) => {
            GotoFailure::ErrorStatus
        }
        other => GotoFailure::Fatal(SessionError::Navigation {
            url: url.to_string(),
            message: other.to_string(),
        }),
    }
}

/// A Chromium process plus its single tab
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    idle_time: Duration,
    navigation_timeout: Duration,
    closed: bool,
}

impl ChromiumSession {
    /// Status of a navigation Chrome refused to render
    ///
    /// Only an error status is reported; anything else, including a response
    /// left over from the previous navigation, counts as no response.
    async fn error_status(&self, deadline: Instant) -> Option<u16> {
        let request = tokio::time::timeout_at(deadline, self.page.wait_for_navigation_response())
            .await
            .ok()?
            .ok()??;

        request
            .response
            .as_ref()
            .and_then(|response| u16::try_from(response.status).ok())
            .filter(|status| *status >= 400)
    }

    /// Waits until no request has been in flight for `idle_time`
    ///
    /// Every network event restarts the idle window.
    async fn wait_for_network_idle(
        &self,
        url: &str,
        started: &mut chromiumoxide::listeners::EventStream<EventRequestWillBeSent>,
        finished: &mut chromiumoxide::listeners::EventStream<EventLoadingFinished>,
        failed: &mut chromiumoxide::listeners::EventStream<EventLoadingFailed>,
        deadline: Instant,
    ) -> SessionResult<()> {
        let mut in_flight: HashSet<String> = HashSet::new();

        loop {
            tokio::select! {
                Some(event) = started.next() => {
                    in_flight.insert(event.request_id.inner().clone());
                }
                Some(event) = finished.next() => {
                    in_flight.remove(event.request_id.inner());
                }
                Some(event) = failed.next() => {
                    in_flight.remove(event.request_id.inner());
                }
                _ = tokio::time::sleep(self.idle_time), if in_flight.is_empty() => {
                    return Ok(());
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::debug!("{} requests still in flight at timeout", in_flight.len());
                    return Err(SessionError::Timeout {
                        url: url.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<PageResponse> {
        let evaluation = |e: CdpError| SessionError::Evaluation(e.to_string());

        // Subscribe before navigating so the document request itself is seen.
        let mut started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(evaluation)?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(evaluation)?;
        let mut failed = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(evaluation)?;

        let deadline = Instant::now() + self.navigation_timeout;

        let goto = tokio::time::timeout_at(deadline, self.page.goto(url))
            .await
            .map_err(|_| SessionError::Timeout {
                url: url.to_string(),
            })?;

        if let Err(e) = goto {
            return match classify_goto_error(url, e) {
                GotoFailure::ErrorStatus => {
                    let status = self.error_status(deadline).await;
                    tracing::debug!("{} answered with an error status {:?}", url, status);
                    Ok(PageResponse { status })
                }
                GotoFailure::Fatal(err) => Err(err),
            };
        }

        let request = self
            .page
            .wait_for_navigation_response()
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = request
            .as_ref()
            .and_then(|request| request.response.as_ref())
            .and_then(|response| u16::try_from(response.status).ok());

        self.wait_for_network_idle(url, &mut started, &mut finished, &mut failed, deadline)
            .await?;

        Ok(PageResponse { status })
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Evaluation(e.to_string()))
    }

    async fn title(&mut self) -> SessionResult<String> {
        self.page
            .get_title()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| SessionError::Evaluation(e.to_string()))
    }

    async fn close(&mut self) -> SessionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Failed to reap Chromium process: {}", e);
        }
        self.handler_task.abort();

        result
            .map(|_| ())
            .map_err(|e| SessionError::Evaluation(format!("close: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://site.test/companies/acme?page=2";

    #[test]
    fn test_error_status_response_completes_navigation() {
        let e = CdpError::ChromeMessage(HTTP_RESPONSE_CODE_FAILURE.to_string());
        assert!(matches!(classify_goto_error(URL, e), GotoFailure::ErrorStatus));
    }

    #[test]
    fn test_unreachable_host_is_fatal() {
        let e = CdpError::ChromeMessage("net::ERR_NAME_NOT_RESOLVED".to_string());
        match classify_goto_error(URL, e) {
            GotoFailure::Fatal(SessionError::Navigation { url, message }) => {
                assert_eq!(url, URL);
                assert!(message.contains("ERR_NAME_NOT_RESOLVED"));
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_other_cdp_errors_are_fatal() {
        let e = CdpError::Timeout;
        assert!(matches!(classify_goto_error(URL, e), GotoFailure::Fatal(_)));
    }
}
