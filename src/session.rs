//! One scan session against one site.
//!
//! ```text
//! fetch listing ─► parse ─► scan + dedup ─► for each accepted entry, in order:
//!                                              fetch detail ─► extract body ─► summarize?
//! ```
//!
//! The listing fetch and parse are fatal for the session. Everything after
//! that is per article: a detail page that fails to load is recorded in
//! [`SessionReport::detail_failures`] and the next article proceeds, and a
//! failed summary is attached to the report as `summary_error`.

use crate::api::{ChatService, SummarizationBridge};
use crate::document::Document;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::models::{ArticleReport, ArticleSummary, CategoryLink, DetailFailure, SessionReport};
use crate::rules::{CompiledBodyRule, SiteProfile};
use crate::scrapers::article::extract_article;
use crate::scrapers::categories::list_categories;
use crate::scrapers::dedup::DeduplicationSet;
use crate::scrapers::listing::{ListingScanner, ScanOutcome, Window};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::pin::pin;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// What a session should fetch and report.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub category: Option<String>,
    pub window: Window,
    /// Report the full body text (ignored when summarizing).
    pub include_body: bool,
    pub summarize: bool,
    pub credential: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            category: None,
            window: Window::Unbounded,
            include_body: false,
            summarize: false,
            credential: None,
        }
    }
}

/// Runs the pipeline for one [`SiteProfile`] with borrowed collaborators.
#[derive(Debug)]
pub struct Session<'a, F, S> {
    profile: &'a SiteProfile,
    fetcher: &'a F,
    bridge: &'a SummarizationBridge<S>,
}

impl<'a, F, S> Session<'a, F, S>
where
    F: Fetch,
    S: ChatService,
{
    pub fn new(profile: &'a SiteProfile, fetcher: &'a F, bridge: &'a SummarizationBridge<S>) -> Self {
        Self {
            profile,
            fetcher,
            bridge,
        }
    }

    /// Scan the listing and process every accepted article in listing order.
    ///
    /// `on_article` sees each report as soon as it is complete.
    #[instrument(level = "info", skip_all, fields(site = %self.profile.name, category = ?options.category))]
    pub async fn run(
        &self,
        options: &SessionOptions,
        now: DateTime<Utc>,
        seen: &mut DeduplicationSet,
        mut on_article: impl FnMut(&ArticleReport),
    ) -> Result<SessionReport> {
        let category = options.category.as_deref();
        let listing_url = self.profile.listing_url(category)?;
        let listing_rule = self.profile.listing_rule(category)?;
        let body_rule = self.profile.body.compile()?;

        let raw = self.fetcher.fetch(&listing_url).await?;
        let outcome: ScanOutcome = {
            let document = Document::parse(&raw)?;
            ListingScanner::new(&listing_rule, &listing_url).scan(&document, now, options.window, seen)?
        };
        info!(count = outcome.articles.len(), "Number of articles");

        let mut articles = Vec::with_capacity(outcome.articles.len());
        let mut detail_failures = Vec::new();
        {
            let mut reports = pin!(
                stream::iter(outcome.articles.iter())
                    .then(|summary| self.process_article(summary, &body_rule, options))
            );
            while let Some(result) = reports.next().await {
                match result {
                    Ok(report) => {
                        on_article(&report);
                        articles.push(report);
                    }
                    Err(failure) => detail_failures.push(failure),
                }
            }
        }

        info!(
            accepted = outcome.articles.len(),
            reported = articles.len(),
            skipped = outcome.skipped.len(),
            detail_failures = detail_failures.len(),
            "Session complete"
        );

        Ok(SessionReport {
            site: self.profile.name.clone(),
            listing_url: listing_url.to_string(),
            started_at: now,
            accepted: outcome.articles.len(),
            articles,
            skipped: outcome.skipped,
            detail_failures,
        })
    }

    /// Fetch the site's landing page and list its navigation sections.
    #[instrument(level = "info", skip_all, fields(site = %self.profile.name))]
    pub async fn categories(&self) -> Result<Vec<CategoryLink>> {
        let page_url = self.profile.listing_url(None)?;
        let raw = self.fetcher.fetch(&page_url).await?;
        let document = Document::parse(&raw)?;
        list_categories(&document, self.profile, &page_url)
    }

    #[instrument(level = "info", skip_all, fields(link = %summary.link))]
    async fn process_article(
        &self,
        summary: &ArticleSummary,
        body_rule: &CompiledBodyRule,
        options: &SessionOptions,
    ) -> std::result::Result<ArticleReport, DetailFailure> {
        let failure = |error: String| {
            warn!(link = %summary.link, %error, "Skipping article");
            DetailFailure {
                link: summary.link.clone(),
                error,
            }
        };

        let url = Url::parse(&summary.link).map_err(|e| failure(e.to_string()))?;
        let raw = self.fetcher.fetch(&url).await.map_err(|e| failure(e.to_string()))?;
        let body = {
            let document = Document::parse(&raw).map_err(|e| failure(e.to_string()))?;
            extract_article(&document, body_rule)
        };
        debug!(paragraphs = body.paragraphs.len(), "Extracted body");

        let mut report = ArticleReport::from_summary(summary);
        report.detail_title = (!body.title.is_empty()).then(|| body.title.clone());

        if options.summarize {
            match self.bridge.summarize(&body, options.credential.as_deref()).await {
                Ok(text) => report.generated_summary = Some(text),
                Err(e) => {
                    warn!(error = %e, "Reporting article without a summary");
                    report.summary_error = Some(e.to_string());
                }
            }
        } else if options.include_body {
            report.body = Some(body.text());
        }

        Ok(report)
    }
}
