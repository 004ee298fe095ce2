//! Summarization through an OpenAI-compatible chat completion API.
//!
//! # Architecture
//!
//! - [`ChatService`]: sends one [`ChatRequest`] with a credential, returns text
//! - [`OpenAiChat`]: the HTTP implementation (`POST {api_base}/chat/completions`)
//! - [`RetryChat`]: decorator adding exponential backoff for rate limits and
//!   outages
//! - [`SummarizationBridge`]: turns an [`ArticleBody`] into the fixed summary
//!   request and refuses to call out without a credential
//!
//! # Retry Strategy
//!
//! Only [`NewsError::is_retryable`] errors are retried:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```

use crate::error::{NewsError, Result};
use crate::models::ArticleBody;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";
const SUMMARY_INSTRUCTION: &str = "Generate a 275 characters summary.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl ChatRequest {
    /// The fixed summary request: system role, article text, then the
    /// length instruction, with low temperature and no penalties.
    pub fn summary(model: &str, body_text: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_INSTRUCTION),
                ChatMessage::new("user", body_text),
                ChatMessage::new("assistant", SUMMARY_INSTRUCTION),
            ],
            max_tokens: 150,
            temperature: 0.3,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionRaw {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Pull the first choice's text out of a completion response body.
pub fn parse_completion(body: &str) -> Result<String> {
    let raw: CompletionRaw = serde_json::from_str(body)
        .map_err(|e| NewsError::MalformedResponse(format!("{} in {}", e, truncate_for_log(body, 200))))?;
    raw.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| NewsError::MalformedResponse("no message content in choices".to_string()))
}

/// Map a non-success HTTP status onto the error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> NewsError {
    let message = truncate_for_log(body, 300);
    if status == StatusCode::TOO_MANY_REQUESTS {
        NewsError::RateLimited
    } else if status.is_server_error() {
        NewsError::ServiceUnavailable(format!("HTTP {}: {}", status, message))
    } else {
        NewsError::ServiceRejected {
            status: status.as_u16(),
            message,
        }
    }
}

/// A chat completion backend.
pub trait ChatService {
    async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<String>;
}

/// `reqwest` client for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: Client,
    api_base: String,
}

impl OpenAiChat {
    pub fn new(api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl ChatService for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<String> {
        let t0 = Instant::now();
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(credential)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                NewsError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NewsError::ServiceUnavailable(e.to_string()))?;

        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "Chat completion API error");
            return Err(classify_status(status, &body));
        }

        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Chat completion received");
        parse_completion(&body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`ChatService`].
pub struct RetryChat<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
    max_jitter: StdDuration,
}

impl<T> RetryChat<T>
where
    T: ChatService,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn delay_for(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            delay
        } else {
            delay + StdDuration::from_millis(rng().random_range(0..=jitter_ms))
        }
    }
}

impl<T> fmt::Debug for RetryChat<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryChat")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> ChatService for RetryChat<T>
where
    T: ChatService,
{
    #[instrument(level = "info", skip_all)]
    async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.complete(request, credential).await {
                Ok(text) => return Ok(text),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "complete() exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "complete() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Formats article text into the summary request and calls the service.
#[derive(Debug)]
pub struct SummarizationBridge<S> {
    service: S,
    model: String,
}

impl<S: ChatService> SummarizationBridge<S> {
    pub fn new(service: S, model: &str) -> Self {
        Self {
            service,
            model: model.to_string(),
        }
    }

    /// Summarize an extracted body; paragraphs are joined with single spaces.
    pub async fn summarize(&self, body: &ArticleBody, credential: Option<&str>) -> Result<String> {
        self.summarize_text(&body.text(), credential).await
    }

    /// Summarize `body_text`.
    ///
    /// # Errors
    ///
    /// - [`NewsError::MissingCredential`] without calling the service when
    ///   `credential` is absent or blank
    /// - [`NewsError::MissingField`] when there is no text to summarize
    /// - whatever the service reports otherwise
    #[instrument(level = "info", skip_all, fields(chars = body_text.len()))]
    pub async fn summarize_text(&self, body_text: &str, credential: Option<&str>) -> Result<String> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(NewsError::MissingCredential)?;
        if body_text.trim().is_empty() {
            return Err(NewsError::MissingField("body"));
        }

        let request = ChatRequest::summary(&self.model, body_text);
        let summary = self.service.complete(&request, credential).await?;
        info!(chars = summary.len(), "Generated summary");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Replays queued results and records what it was sent.
    #[derive(Debug, Default)]
    struct ScriptedChat {
        replies: RefCell<VecDeque<Result<String>>>,
        calls: Cell<usize>,
        last_request: RefCell<Option<(ChatRequest, String)>>,
    }

    impl ScriptedChat {
        fn replying(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                ..Self::default()
            }
        }
    }

    impl ChatService for &ScriptedChat {
        async fn complete(&self, request: &ChatRequest, credential: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last_request.borrow_mut() = Some((request.clone(), credential.to_string()));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok("default summary".to_string()))
        }
    }

    fn body() -> ArticleBody {
        ArticleBody {
            title: "Storm".to_string(),
            paragraphs: vec!["Winds rose.".to_string(), "Trees fell.".to_string()],
        }
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let chat = ScriptedChat::default();
        let bridge = SummarizationBridge::new(&chat, DEFAULT_MODEL);

        let err = bridge.summarize(&body(), None).await.unwrap_err();
        assert!(matches!(err, NewsError::MissingCredential));
        let err = bridge.summarize(&body(), Some("  ")).await.unwrap_err();
        assert!(matches!(err, NewsError::MissingCredential));
        assert_eq!(chat.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_makes_no_call() {
        let chat = ScriptedChat::default();
        let bridge = SummarizationBridge::new(&chat, DEFAULT_MODEL);
        let err = bridge
            .summarize(&ArticleBody::default(), Some("sk-test"))
            .await
            .unwrap_err();
        assert!(matches!(err, NewsError::MissingField("body")));
        assert_eq!(chat.calls.get(), 0);
    }

    #[tokio::test]
    async fn test_request_shape() {
        let chat = ScriptedChat::replying(vec![Ok("Short version.".to_string())]);
        let bridge = SummarizationBridge::new(&chat, DEFAULT_MODEL);

        let summary = bridge.summarize(&body(), Some("sk-test")).await.unwrap();
        assert_eq!(summary, "Short version.");

        let (request, credential) = chat.last_request.borrow().clone().unwrap();
        assert_eq!(credential, "sk-test");
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert_eq!(
            request.messages,
            vec![
                ChatMessage::new("system", "You are a helpful assistant."),
                ChatMessage::new("user", "Winds rose. Trees fell."),
                ChatMessage::new("assistant", "Generate a 275 characters summary."),
            ]
        );
        assert_eq!(request.max_tokens, 150);
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.frequency_penalty, 0.0);
        assert_eq!(request.presence_penalty, 0.0);
    }

    #[tokio::test]
    async fn test_service_errors_are_distinct() {
        let chat = ScriptedChat::replying(vec![Err(NewsError::RateLimited)]);
        let bridge = SummarizationBridge::new(&chat, DEFAULT_MODEL);
        let err = bridge.summarize(&body(), Some("sk-test")).await.unwrap_err();
        assert!(matches!(err, NewsError::RateLimited));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_rate_limit() {
        let chat = ScriptedChat::replying(vec![
            Err(NewsError::RateLimited),
            Err(NewsError::ServiceUnavailable("502".to_string())),
            Ok("third time".to_string()),
        ]);
        let retry = RetryChat::new(&chat, 3, StdDuration::from_millis(1))
            .with_max_jitter(StdDuration::ZERO);
        let request = ChatRequest::summary(DEFAULT_MODEL, "text");

        assert_eq!(retry.complete(&request, "k").await.unwrap(), "third time");
        assert_eq!(chat.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max() {
        let chat = ScriptedChat::replying(vec![
            Err(NewsError::RateLimited),
            Err(NewsError::RateLimited),
            Err(NewsError::RateLimited),
        ]);
        let retry = RetryChat::new(&chat, 2, StdDuration::from_millis(1))
            .with_max_jitter(StdDuration::ZERO);
        let request = ChatRequest::summary(DEFAULT_MODEL, "text");

        assert!(matches!(
            retry.complete(&request, "k").await,
            Err(NewsError::RateLimited)
        ));
        assert_eq!(chat.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_non_retryable() {
        let chat = ScriptedChat::replying(vec![Err(NewsError::MalformedResponse("x".to_string()))]);
        let retry = RetryChat::new(&chat, 5, StdDuration::from_millis(1));
        let request = ChatRequest::summary(DEFAULT_MODEL, "text");

        assert!(retry.complete(&request, "k").await.is_err());
        assert_eq!(chat.calls.get(), 1);
    }

    #[test]
    fn test_backoff_is_capped() {
        let retry = RetryChat::new(ScriptedChatless, 10, StdDuration::from_secs(1))
            .with_max_jitter(StdDuration::ZERO);
        assert_eq!(retry.delay_for(1), StdDuration::from_secs(1));
        assert_eq!(retry.delay_for(3), StdDuration::from_secs(4));
        assert_eq!(retry.delay_for(9), StdDuration::from_secs(30));
    }

    struct ScriptedChatless;

    impl ChatService for ScriptedChatless {
        async fn complete(&self, _request: &ChatRequest, _credential: &str) -> Result<String> {
            Err(NewsError::RateLimited)
        }
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  A summary. \n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "A summary.");

        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(NewsError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion("<html>gateway</html>"),
            Err(NewsError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            NewsError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream"),
            NewsError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, "invalid key"),
            NewsError::ServiceRejected { status: 401, .. }
        ));
    }

    #[test]
    fn test_request_serializes_openai_fields() {
        let json = serde_json::to_value(ChatRequest::summary("m", "t")).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["top_p"], 1.0);
    }
}
