//! Command-line interface definitions for Headline Digest.
//!
//! All arguments can be provided via command-line flags; credentials and the
//! API endpoint can also come from the environment.

use crate::api::{DEFAULT_API_BASE, DEFAULT_MODEL};
use clap::Parser;

/// Command-line arguments for the Headline Digest application.
///
/// # Examples
///
/// ```sh
/// # Everything on the BBC front page from the last 5 hours
/// headline_digest --site bbc --hours 5
///
/// # Sky News UK section with full article bodies
/// headline_digest --site sky --category uk --body
///
/// # Summaries for both sites, key from the environment
/// OPENAI_API_KEY=sk-... headline_digest --site bbc --site sky --summarize
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site profile to scan (repeatable)
    #[arg(short = 'S', long = "site", required = true)]
    pub sites: Vec<String>,

    /// Category path segment appended to the site's base URL
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only keep entries published within this many hours
    #[arg(long)]
    pub hours: Option<u32>,

    /// Include the full article body in each record
    #[arg(short, long)]
    pub body: bool,

    /// Summarize each article through the chat completion API
    #[arg(short, long)]
    pub summarize: bool,

    /// API key for the summarization service
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Model used for summaries
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// YAML file with additional or overriding site profiles
    #[arg(short, long)]
    pub rules: Option<String>,

    /// List each site's categories instead of scanning articles
    #[arg(long)]
    pub list_categories: bool,

    /// Directory for per-session JSON snapshots
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}
