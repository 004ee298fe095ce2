//! Data models for scanned headlines, article bodies and session reports.
//!
//! - [`ArticleSummary`]: one accepted entry from a listing page
//! - [`ArticleBody`]: title and paragraphs pulled from a detail page
//! - [`ArticleReport`]: the record emitted per article once its detail page
//!   has been processed
//! - [`SessionReport`]: everything one scan session produced, including the
//!   entries it skipped and why

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A headline accepted from a listing page.
///
/// `link` is always absolute; relative hrefs are resolved against the
/// listing URL before a summary is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    /// Teaser text from the listing; empty when the site shows none.
    pub summary: String,
    pub link: String,
    /// `None` means the entry carried no usable timestamp.
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    /// Relative age such as `"2 hours ago"`, only when `published_at` is known.
    pub age: Option<String>,
}

/// Title and body paragraphs of a detail page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleBody {
    /// Empty when the page has no heading.
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl ArticleBody {
    /// Paragraphs joined with single spaces.
    pub fn text(&self) -> String {
        self.paragraphs.join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// The record emitted for each accepted article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleReport {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    /// Heading found on the detail page, which may differ from the listing title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_error: Option<String>,
}

impl ArticleReport {
    /// Start a report from a listing entry; detail fields are filled in later.
    pub fn from_summary(summary: &ArticleSummary) -> Self {
        Self {
            title: summary.title.clone(),
            summary: (!summary.summary.is_empty()).then(|| summary.summary.clone()),
            age: summary.age.clone(),
            link: summary.link.clone(),
            published_at: summary.published_at,
            fetched_at: summary.fetched_at,
            detail_title: None,
            body: None,
            generated_summary: None,
            summary_error: None,
        }
    }
}

/// Why a listing entry did not become an [`ArticleSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    OutsideWindow { published_at: DateTime<Utc> },
    MissingField { field: String },
    DuplicateTitle { title: String },
}

/// A listing entry that was dropped, by position in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: SkipReason,
}

/// An accepted article whose detail page could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFailure {
    pub link: String,
    pub error: String,
}

/// A navigation link to a site section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

/// Everything produced by one scan session against one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub site: String,
    pub listing_url: String,
    pub started_at: DateTime<Utc>,
    pub accepted: usize,
    pub articles: Vec<ArticleReport>,
    pub skipped: Vec<SkippedEntry>,
    pub detail_failures: Vec<DetailFailure>,
}
