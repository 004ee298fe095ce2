//! Listing page scanner.
//!
//! Walks the entries of one listing page in document order and turns each
//! into an [`ArticleSummary`], using a [`CompiledRule`] to find the fields.
//! Per entry:
//!
//! 1. read and parse the timestamp (absent or unparsable means "in window")
//! 2. drop the entry if it is older than the window
//! 3. read title and link (required) and summary (optional)
//! 4. pass the title through the [`DeduplicationSet`]
//!
//! A broken entry is recorded as a [`SkippedEntry`] and the scan moves on.

use crate::document::{Document, Element};
use crate::error::{NewsError, Result};
use crate::models::{ArticleSummary, SkipReason, SkippedEntry};
use crate::rules::CompiledRule;
use crate::scrapers::dedup::DeduplicationSet;
use crate::utils::format_age;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{debug, info, instrument};
use url::Url;

/// Recency bound for listing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Unbounded,
    /// Keep entries published at or after `now - duration`.
    Within(Duration),
}

impl Window {
    pub fn from_hours(hours: Option<u32>) -> Self {
        match hours {
            Some(h) => Window::Within(Duration::hours(i64::from(h))),
            None => Window::Unbounded,
        }
    }

    /// Earliest instant still inside the window.
    pub fn earliest(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Window::Unbounded => None,
            Window::Within(d) => Some(now - *d),
        }
    }

    pub fn admits(&self, published_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.earliest(now).is_none_or(|from| published_at >= from)
    }
}

/// Result of scanning one listing page.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub articles: Vec<ArticleSummary>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse a raw timestamp value according to the rule's dialect.
///
/// The rule's fixed-length zone suffix is removed first. With a format the
/// value is read as a naive UTC time (or a zoned one if the format carries
/// an offset); without one, RFC 3339 is expected.
pub fn parse_timestamp(raw: &str, rule: &CompiledRule) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let len = raw.chars().count();
    if len <= rule.timestamp_suffix_len {
        return None;
    }
    let value: String = raw.chars().take(len - rule.timestamp_suffix_len).collect();

    match &rule.timestamp_format {
        Some(format) => DateTime::parse_from_str(&value, format)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(&value, format).map(|n| n.and_utc()))
            .ok(),
        None => DateTime::parse_from_rfc3339(&value)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Scans listing pages of one site dialect.
#[derive(Debug)]
pub struct ListingScanner<'r> {
    rule: &'r CompiledRule,
    base_url: &'r Url,
}

impl<'r> ListingScanner<'r> {
    /// `base_url` is the page the listing was fetched from; relative links
    /// resolve against it.
    pub fn new(rule: &'r CompiledRule, base_url: &'r Url) -> Self {
        Self { rule, base_url }
    }

    /// Scan `document`, accepting entries through `seen`.
    ///
    /// # Errors
    ///
    /// [`NewsError::MissingField`] when the listing container is not on the
    /// page. Problems with individual entries never fail the scan.
    #[instrument(level = "info", skip_all, fields(base_url = %self.base_url))]
    pub fn scan(
        &self,
        document: &Document,
        now: DateTime<Utc>,
        window: Window,
        seen: &mut DeduplicationSet,
    ) -> Result<ScanOutcome> {
        let container = document
            .find(&self.rule.container)
            .ok_or(NewsError::MissingField("container"))?;

        let entries = container.find_all(&self.rule.entry);
        let mut outcome = ScanOutcome::default();

        for (index, entry) in entries.iter().enumerate() {
            let reason = match self.read_entry(entry, now, window) {
                Ok(candidate) => {
                    if seen.accept(&candidate.title) {
                        debug!(index, title = %candidate.title, "Accepted entry");
                        outcome.articles.push(candidate);
                        continue;
                    }
                    SkipReason::DuplicateTitle {
                        title: candidate.title,
                    }
                }
                Err(reason) => reason,
            };
            debug!(index, ?reason, "Skipped entry");
            outcome.skipped.push(SkippedEntry { index, reason });
        }

        info!(
            entries = entries.len(),
            accepted = outcome.articles.len(),
            skipped = outcome.skipped.len(),
            "Scanned listing page"
        );
        Ok(outcome)
    }

    fn read_entry(
        &self,
        entry: &Element<'_>,
        now: DateTime<Utc>,
        window: Window,
    ) -> std::result::Result<ArticleSummary, SkipReason> {
        let published_at = self.read_timestamp(entry);
        if let Some(published_at) = published_at {
            if !window.admits(published_at, now) {
                return Err(SkipReason::OutsideWindow { published_at });
            }
        }

        let title = entry
            .find(&self.rule.title)
            .map(|el| el.trimmed_text())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| missing("title"))?;

        let summary = self
            .rule
            .summary
            .as_ref()
            .and_then(|sel| entry.find(sel))
            .map(|el| el.trimmed_text())
            .unwrap_or_default();

        let link = self.read_link(entry).ok_or_else(|| missing("link"))?;

        Ok(ArticleSummary {
            title,
            summary,
            link,
            published_at,
            fetched_at: now,
            age: published_at.map(|at| format_age(now - at)),
        })
    }

    fn read_timestamp(&self, entry: &Element<'_>) -> Option<DateTime<Utc>> {
        let element = entry.find(self.rule.timestamp.as_ref()?)?;
        let raw = match &self.rule.timestamp_attribute {
            Some(attr) => element.attr(attr)?.to_string(),
            None => element.text(),
        };
        let parsed = parse_timestamp(&raw, self.rule);
        if parsed.is_none() {
            debug!(%raw, "Unparsable timestamp; treating entry as in window");
        }
        parsed
    }

    fn read_link(&self, entry: &Element<'_>) -> Option<String> {
        let anchor = if entry.matches(&self.rule.link) {
            *entry
        } else {
            entry.find(&self.rule.link)?
        };
        let href = anchor.attr(&self.rule.link_attribute)?.trim();
        if href.is_empty() {
            return None;
        }
        match self.base_url.join(href) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                debug!(%href, error = %e, "Unresolvable link");
                None
            }
        }
    }
}

fn missing(field: &str) -> SkipReason {
    SkipReason::MissingField {
        field: field.to_string(),
    }
}
