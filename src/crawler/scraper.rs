//! Single listing page scraping

use crate::crawler::extract::extract_feedback;
use crate::crawler::pagination::page_url;
use crate::crawler::validity::{check_content, check_status, check_title};
use crate::feedback::FeedbackItem;
use crate::session::{BrowserSession, SessionResult};

/// Scrapes one listing page (1-based index)
///
/// # Flow
///
/// 1. Navigate the shared session to `{root}/companies/{slug}?page={index}`
/// 2. Check status, then markup, then title, reading each only once the
///    previous check passed; a rejected page yields an empty list
/// 3. Otherwise extract feedback from the markup
///
/// Only navigation or evaluation faults are errors. The session's current
/// page is replaced, so callers must not scrape concurrently on one session.
pub async fn scrape_page(
    session: &mut dyn BrowserSession,
    root_url: &str,
    slug: &str,
    index: u32,
) -> SessionResult<Vec<FeedbackItem>> {
    let url = page_url(root_url, slug, index);
    tracing::debug!("Scraping page {}: {}", index, url);

    let response = session.navigate(&url).await?;
    if let Err(reason) = check_status(response.status) {
        tracing::warn!(
            "Page {} returned status {:?}, skipping ({})",
            url,
            response.status,
            reason
        );
        return Ok(Vec::new());
    }

    let html = session.content().await?;
    if let Err(reason) = check_content(&html) {
        tracing::warn!("Empty page content at {}, skipping ({})", url, reason);
        return Ok(Vec::new());
    }

    let title = session.title().await?;
    if let Err(reason) = check_title(&title) {
        tracing::warn!("Page title {:?} at {} indicates {}, skipping", title, url, reason);
        return Ok(Vec::new());
    }

    let items = extract_feedback(&html);
    tracing::debug!("Page {} yielded {} item(s)", index, items.len());
    Ok(items)
}
