//! Pagination discovery
//!
//! The listing root of a company shows a pagination control whose links are
//! labelled with page numbers. The largest number is the page count.

use crate::session::{BrowserSession, SessionResult};
use scraper::{Html, Selector};

/// Selects the pagination links
const PAGE_LINK_SELECTOR: &str = ".pagination .page-link";

/// URL of a company's listing root
pub fn listing_url(root_url: &str, slug: &str) -> String {
    format!("{}/companies/{}", root_url.trim_end_matches('/'), slug)
}

/// URL of one listing page (1-based)
pub fn page_url(root_url: &str, slug: &str, page: u32) -> String {
    format!("{}?page={}", listing_url(root_url, slug), page)
}

/// Loads the listing root and returns how many pages it has
///
/// The session is navigated to the root and left there. Navigation errors
/// propagate; the root page is not checked for validity, a broken root simply
/// yields one page.
pub async fn discover_page_count(
    session: &mut dyn BrowserSession,
    root_url: &str,
    slug: &str,
) -> SessionResult<u32> {
    let url = listing_url(root_url, slug);
    tracing::debug!("Discovering pagination at {}", url);

    session.navigate(&url).await?;
    let html = session.content().await?;

    let pages = count_pages(&html);
    tracing::info!("Listing for '{}' has {} page(s)", slug, pages);
    Ok(pages)
}

/// Returns the largest numeric pagination label, never less than 1
///
/// Labels such as "«", "Next" or "…" are ignored.
pub fn count_pages(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(PAGE_LINK_SELECTOR) else {
        return 1;
    };

    let max_label = document
        .select(&selector)
        .filter_map(|link| parse_page_label(&link.text().collect::<String>()))
        .fold(1_i64, i64::max);

    u32::try_from(max_label).unwrap_or(u32::MAX)
}

/// Parses a label leniently: an optional sign followed by leading digits
///
/// Trailing non-digit characters are ignored ("3 »" reads as 3); a label that
/// does not start with a number is not numeric.
fn parse_page_label(label: &str) -> Option<i64> {
    let label = label.trim();
    let (sign, rest) = match label.as_bytes().first() {
        Some(b'-') => (-1, &label[1..]),
        Some(b'+') => (1, &label[1..]),
        _ => (1, label),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    rest[..digits_end].parse::<i64>().ok().map(|n| sign * n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::scripted::{ScriptedLauncher, ScriptedPage};
    use crate::session::SessionLauncher;

    fn pagination(labels: &[&str]) -> String {
        let links: String = labels
            .iter()
            .map(|l| format!(r##"<li><a class="page-link" href="#">{}</a></li>"##, l))
            .collect();
        format!(
            r#"<html><body><ul class="pagination">{}</ul></body></html>"#,
            links
        )
    }

    #[test]
    fn test_urls() {
        assert_eq!(
            listing_url("https://congtytui1.com", "acme"),
            "https://congtytui1.com/companies/acme"
        );
        assert_eq!(
            listing_url("https://congtytui1.com/", "acme"),
            "https://congtytui1.com/companies/acme"
        );
        assert_eq!(
            page_url("https://congtytui1.com", "acme", 3),
            "https://congtytui1.com/companies/acme?page=3"
        );
    }

    #[test]
    fn test_parse_page_label() {
        assert_eq!(parse_page_label("12"), Some(12));
        assert_eq!(parse_page_label("  4 "), Some(4));
        assert_eq!(parse_page_label("3 »"), Some(3));
        assert_eq!(parse_page_label("-2"), Some(-2));
        assert_eq!(parse_page_label("+5"), Some(5));
        assert_eq!(parse_page_label("Next"), None);
        assert_eq!(parse_page_label("«"), None);
        assert_eq!(parse_page_label(""), None);
        assert_eq!(parse_page_label("-"), None);
    }

    #[test]
    fn test_count_pages_takes_maximum() {
        let html = pagination(&["«", "1", "2", "3", "…", "17", "Next"]);
        assert_eq!(count_pages(&html), 17);
    }

    #[test]
    fn test_count_pages_floor_without_pagination() {
        assert_eq!(count_pages("<html><body><p>no pagination</p></body></html>"), 1);
    }

    #[test]
    fn test_count_pages_floor_with_non_numeric_labels() {
        assert_eq!(count_pages(&pagination(&["Prev", "Next"])), 1);
    }

    #[test]
    fn test_count_pages_floor_with_negative_and_zero() {
        assert_eq!(count_pages(&pagination(&["-4", "0"])), 1);
    }

    #[test]
    fn test_page_link_outside_pagination_ignored() {
        let html = r#"<html><body>
            <a class="page-link">99</a>
            <ul class="pagination"><li><a class="page-link">2</a></li></ul>
        </body></html>"#;
        assert_eq!(count_pages(html), 2);
    }

    #[tokio::test]
    async fn test_discover_navigates_to_listing_root() {
        let launcher = ScriptedLauncher::new().page(
            "https://site.test/companies/acme",
            ScriptedPage::ok(&pagination(&["1", "2", "5"])),
        );
        let log = launcher.log.clone();
        let mut session = launcher.launch().await.unwrap();

        let pages = discover_page_count(session.as_mut(), "https://site.test", "acme")
            .await
            .unwrap();

        assert_eq!(pages, 5);
        assert_eq!(log.visited(), vec!["https://site.test/companies/acme"]);
    }

    #[tokio::test]
    async fn test_discover_propagates_navigation_failure() {
        let launcher = ScriptedLauncher::new().broken("https://site.test/companies/acme");
        let mut session = launcher.launch().await.unwrap();

        let result = discover_page_count(session.as_mut(), "https://site.test", "acme").await;
        assert!(result.is_err());
    }
}
