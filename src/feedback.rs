/// Feedback item definitions
///
/// A feedback item is one comment or review scraped from a company listing.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Container id prefix marking a comment thread
pub const COMMENT_PREFIX: &str = "comment-replies-";

/// Container id prefix marking a review
pub const REVIEW_PREFIX: &str = "review-";

/// Kind of feedback, derived from the container id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Comment,
    Review,
}

impl FeedbackKind {
    /// The id prefix the source site uses for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Comment => COMMENT_PREFIX,
            Self::Review => REVIEW_PREFIX,
        }
    }

    /// Splits a raw container id into its kind and source id
    ///
    /// Returns None when the id carries neither known prefix.
    pub fn classify(container_id: &str) -> Option<(Self, &str)> {
        [Self::Comment, Self::Review]
            .into_iter()
            .find_map(|kind| {
                container_id
                    .strip_prefix(kind.prefix())
                    .map(|source_id| (kind, source_id))
            })
    }

    /// Converts the kind to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Review => "review",
        }
    }

    /// Parses a kind from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "comment" => Some(Self::Comment),
            "review" => Some(Self::Review),
            _ => None,
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One comment or review as extracted from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Raw container id, unique within a company's result set
    pub id: String,

    /// Trimmed text content, never empty
    pub text: String,

    #[serde(rename = "type")]
    pub kind: FeedbackKind,

    /// Container id with the kind prefix stripped
    #[serde(rename = "sourceId")]
    pub source_id: String,
}

impl FeedbackItem {
    /// Builds an item whose id is derived from `(kind, source_id)`
    pub fn new(kind: FeedbackKind, source_id: impl Into<String>, text: impl Into<String>) -> Self {
        let source_id = source_id.into();
        Self {
            id: format!("{}{}", kind.prefix(), source_id),
            text: text.into(),
            kind,
            source_id,
        }
    }
}
