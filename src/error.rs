//! Error taxonomy for the extraction pipeline.
//!
//! Every failure the pipeline can observe maps onto one of these variants.
//! Which of them are fatal depends on where they occur: a [`NewsError::Fetch`]
//! on the listing page ends the session, the same error on a detail page only
//! skips that article.

use thiserror::Error;

/// Errors produced while fetching, parsing, extracting or summarizing.
#[derive(Debug, Error)]
pub enum NewsError {
    /// Network or HTTP-level failure from the fetch collaborator.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Markup could not be turned into a document.
    #[error("failed to parse markup: {0}")]
    Parse(String),

    /// A required selector matched nothing.
    #[error("required field not found: {0}")]
    MissingField(&'static str),

    /// Summarization was requested without a credential.
    #[error("no credential supplied for the summarization service")]
    MissingCredential,

    #[error("summarization service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("summarization service rate limited the request")]
    RateLimited,

    /// The service refused the request outright (bad key, bad request).
    #[error("summarization service rejected the request (HTTP {status}): {message}")]
    ServiceRejected { status: u16, message: String },

    #[error("malformed response from summarization service: {0}")]
    MalformedResponse(String),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NewsError {
    /// Whether retrying the same summarization request might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NewsError::RateLimited | NewsError::ServiceUnavailable(_))
    }
}

impl From<serde_yaml::Error> for NewsError {
    fn from(e: serde_yaml::Error) -> Self {
        NewsError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NewsError>;
