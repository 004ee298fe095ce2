//! # Headline Digest
//!
//! Pulls headline records (title, teaser, link, age) out of news listing
//! pages, keeps the recent and unique ones, and optionally follows each link
//! for the full text and an LLM summary.
//!
//! ## Features
//!
//! - Site dialects described as data ([`rules::SiteProfile`]); BBC News and
//!   Sky News are built in, more can be added from a YAML file
//! - Recency window with inclusive handling of undated entries
//! - Title-based deduplication per session
//! - Optional body extraction and summarization through an OpenAI-compatible API
//! - One JSON object per article on stdout, logs on stderr
//!
//! ## Usage
//!
//! ```sh
//! headline_digest --site bbc --hours 5 --body
//! ```
//!
//! ## Architecture
//!
//! 1. **Listing**: fetch and scan the listing page into `ArticleSummary` records
//! 2. **Dedup**: drop titles already seen this session
//! 3. **Detail**: fetch each article page and extract its body
//! 4. **Summary**: optionally summarize the body (credential passed explicitly)
//! 5. **Output**: stream records as JSON Lines, optionally snapshot the session

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::io::stdout;
use std::path::Path;
use std::time::Duration as StdDuration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod document;
mod error;
mod fetch;
mod models;
mod outputs;
mod rules;
mod scrapers;
mod session;
mod utils;

use api::{OpenAiChat, RetryChat, SummarizationBridge};
use cli::Cli;
use fetch::HttpFetcher;
use outputs::{json, stream::RecordWriter};
use rules::{SiteRegistry, load_profiles};
use scrapers::dedup::DeduplicationSet;
use scrapers::listing::Window;
use session::{Session, SessionOptions};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so stdout carries only records) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_digest starting up");

    let args = Cli::parse();
    debug!(sites = ?args.sites, category = ?args.category, hours = ?args.hours, "Parsed CLI arguments");

    let mut registry = SiteRegistry::builtin();
    if let Some(path) = &args.rules {
        registry.merge(load_profiles(Path::new(path)).await?);
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e.into());
        }
    }

    if args.summarize && args.api_key.is_none() {
        warn!("--summarize without an API key; articles will be reported without summaries");
    }

    let fetcher = HttpFetcher::new()?;
    let chat = RetryChat::new(OpenAiChat::new(&args.api_base), 5, StdDuration::from_secs(1))
        .with_max_jitter(StdDuration::from_millis(250));
    let bridge = SummarizationBridge::new(chat, &args.model);
    let options = SessionOptions {
        category: args.category.clone(),
        window: Window::from_hours(args.hours),
        include_body: args.body,
        summarize: args.summarize,
        credential: args.api_key.clone(),
    };

    let mut writer = RecordWriter::new(stdout());
    let mut failed_sites = 0usize;

    for site in &args.sites {
        let profile = match registry.get(site) {
            Ok(profile) => profile,
            Err(e) => {
                error!(%site, error = %e, "Skipping site");
                failed_sites += 1;
                continue;
            }
        };
        let session = Session::new(profile, &fetcher, &bridge);

        if args.list_categories {
            match session.categories().await {
                Ok(links) => {
                    for link in &links {
                        writer.write_category(link)?;
                    }
                }
                Err(e) => {
                    error!(%site, error = %e, "Failed to list categories");
                    failed_sites += 1;
                }
            }
            continue;
        }

        let mut seen = DeduplicationSet::new();
        let result = session
            .run(&options, Utc::now(), &mut seen, |report| {
                if let Err(e) = writer.write_article(report) {
                    error!(error = %e, link = %report.link, "Failed to write record");
                }
            })
            .await;

        match result {
            Ok(report) => {
                if seen.is_empty() {
                    warn!(%site, "No titles accepted from the listing page");
                }
                info!(
                    %site,
                    accepted = report.accepted,
                    reported = report.articles.len(),
                    skipped = report.skipped.len(),
                    detail_failures = report.detail_failures.len(),
                    "Site finished"
                );
                if let Some(dir) = &args.json_output_dir {
                    if let Err(e) = json::write_session(&report, dir).await {
                        error!(%site, error = %e, "Failed to write session JSON");
                    }
                }
            }
            Err(e) => {
                error!(%site, error = %e, "Session failed");
                failed_sites += 1;
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        records = writer.written(),
        failed_sites,
        "Execution complete"
    );

    if failed_sites == args.sites.len() {
        return Err("every site failed".into());
    }
    Ok(())
}
