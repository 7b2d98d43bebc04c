//! Page validity checks
//!
//! A fetched page is only worth extracting from when the server answered
//! successfully, sent an actual document and did not render an error page.
//! A rejected page is a normal outcome: it contributes zero items and the
//! crawl moves on.

use std::fmt;

/// Markup of a document with an empty head and body and nothing else
pub const EMPTY_DOCUMENT: &str = "<html><head></head><body></body></html>";

/// Why a page was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No response at all, or a status code of 400 and above
    BadStatus,
    /// The document is the canonical empty document
    EmptyContent,
    /// The title looks like a "404" / "not found" page
    NotFoundTitle,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BadStatus => "bad status",
            Self::EmptyContent => "empty content",
            Self::NotFoundTitle => "404 title",
        })
    }
}

/// Decides whether a fetched page is usable
///
/// Checks run in order and the first failing one wins:
///
/// | Check | Reject |
/// |-------|--------|
/// | status missing or >= 400 | `BadStatus` |
/// | trimmed markup equals [`EMPTY_DOCUMENT`] | `EmptyContent` |
/// | title contains "404" or, case-insensitively, "not found" | `NotFoundTitle` |
pub fn check_page(status: Option<u16>, html: &str, title: &str) -> Result<(), RejectReason> {
    check_status(status)?;
    check_content(html)?;
    check_title(title)
}

/// Rejects a missing response or an error status
pub fn check_status(status: Option<u16>) -> Result<(), RejectReason> {
    match status {
        Some(code) if code < 400 => Ok(()),
        _ => Err(RejectReason::BadStatus),
    }
}

/// Rejects the canonical empty document
pub fn check_content(html: &str) -> Result<(), RejectReason> {
    if html.trim() == EMPTY_DOCUMENT {
        return Err(RejectReason::EmptyContent);
    }
    Ok(())
}

/// Rejects error-page titles
pub fn check_title(title: &str) -> Result<(), RejectReason> {
    if title.contains("404") || title.to_lowercase().contains("not found") {
        return Err(RejectReason::NotFoundTitle);
    }
    Ok(())
}
