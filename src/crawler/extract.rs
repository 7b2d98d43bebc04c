//! Feedback extraction from listing markup
//!
//! This module turns a rendered listing page into feedback items:
//! - containers are `div`s whose id starts with `comment-replies-` or `review-`
//! - the text comes from the first `.cmt-content` / `.readmore-content`
//!   element inside the container
//!
//! Extraction is a pure function of the markup, so it can be tested without
//! a browser.

use crate::feedback::{FeedbackItem, FeedbackKind};
use scraper::{Html, Selector};

/// Selects every feedback container
const CONTAINER_SELECTOR: &str = r#"div[id^="comment-replies-"], div[id^="review-"]"#;

/// Selects the text body inside a container
const CONTENT_SELECTOR: &str = ".cmt-content, .readmore-content";

/// Extracts feedback items in document order
///
/// # Rules
///
/// - Containers without a content element are skipped
/// - Containers whose trimmed text is empty are skipped
/// - Repeated container ids are all emitted; the store collapses them
///
/// # Example
///
/// ```
/// use feedback_crawler::crawler::extract_feedback;
///
/// let html = r#"<div id="review-9"><p class="readmore-content"> Great team </p></div>"#;
/// let items = extract_feedback(html);
/// assert_eq!(items.len(), 1);
/// assert_eq!(items[0].id, "review-9");
/// assert_eq!(items[0].text, "Great team");
/// ```
pub fn extract_feedback(html: &str) -> Vec<FeedbackItem> {
    let document = Html::parse_document(html);

    let (Ok(containers), Ok(content)) = (
        Selector::parse(CONTAINER_SELECTOR),
        Selector::parse(CONTENT_SELECTOR),
    ) else {
        return Vec::new();
    };

    let mut items = Vec::new();

    for container in document.select(&containers) {
        let Some(full_id) = container.value().id() else {
            continue;
        };

        let Some((kind, source_id)) = FeedbackKind::classify(full_id) else {
            continue;
        };

        let Some(body) = container.select(&content).next() else {
            tracing::trace!("Container {} has no content element", full_id);
            continue;
        };

        let text = body.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        items.push(FeedbackItem {
            id: full_id.to_string(),
            text: text.to_string(),
            kind,
            source_id: source_id.to_string(),
        });
    }

    items
}
