//! Model client: one multimodal chat-completion call with retry/backoff.
//!
//! The request follows the OpenAI-compatible chat-completions shape: a single
//! user message whose content is the prompt text followed by one `image_url`
//! part per page, each a `data:image/png;base64,...` URI.
//!
//! ## Retry Strategy
//!
//! Only HTTP 200 counts as success. Any other status and any transport
//! failure (connect, TLS, the 60 s timeout) is logged and retried, with an
//! exponential wait of `retry_backoff_ms * 2^(attempt - 1)` before each retry:
//! 1 s, 2 s, 4 s with the defaults. There is no wait after the final attempt.
//! A 200 whose body lacks `choices[0].message.content` is not retried; the
//! same request would produce the same shape again.
//!
//! [`ModelClient`] is the seam the Analysis Service depends on, so tests can
//! swap the HTTP client for a scripted one.

use crate::config::ServiceConfig;
use crate::error::ModelError;
use crate::pipeline::encode::PageImage;
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Longest response-body excerpt kept in error messages.
const SNIPPET_LEN: usize = 200;

/// Anything that can answer a prompt about a set of page images.
pub trait ModelClient: Send + Sync {
    /// Return the model's answer text, or why none was obtained.
    fn complete(
        &self,
        prompt: &str,
        images: &[PageImage],
    ) -> impl Future<Output = Result<String, ModelError>> + Send;
}

/// Model client speaking the OpenAI-compatible chat-completions protocol.
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    client: reqwest::Client,
    url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl HttpModelClient {
    /// Build a client from the service configuration.
    ///
    /// The API key goes into a default `Authorization: Bearer` header and the
    /// per-request timeout into the underlying `reqwest::Client`.
    pub fn new(config: &ServiceConfig) -> Result<Self, ModelError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| ModelError::ClientBuild(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ModelError::ClientBuild(e.to_string()))?;

        info!(
            model = %config.model,
            endpoint = %config.base_url,
            timeout_secs = config.api_timeout_secs,
            max_retries = config.max_retries,
            "model client initialized"
        );

        Ok(Self {
            client,
            url: config.base_url.trim().to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Send the prompt and images, trying up to `max_retries` times.
    pub async fn call_with_retries(
        &self,
        prompt: &str,
        images: &[PageImage],
        max_retries: u32,
    ) -> Result<String, ModelError> {
        let body = ChatRequest::new(&self.model, prompt, images, self.max_tokens, self.temperature);
        let attempts = max_retries.max(1);
        let mut last_err: Option<String> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let backoff = backoff_delay(self.retry_backoff_ms, attempt);
                warn!(
                    "retry {}/{} after {}ms",
                    attempt + 1,
                    attempts,
                    backoff.as_millis()
                );
                sleep(backoff).await;
            }

            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() => {
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Err(ModelError::RetriesExhausted {
            attempts,
            last_error: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }

    /// One POST; succeeds only on HTTP 200 with a usable first choice.
    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<String, ModelError> {
        let started = Instant::now();
        debug!(
            model = %self.model,
            images = body.image_count(),
            "POST {}", self.url
        );

        let resp = self.client.post(&self.url).json(body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(ModelError::HttpStatus {
                status: status.as_u16(),
                snippet: make_snippet(&text),
            });
        }

        let content = extract_content(&text)?;
        debug!(
            latency_ms = started.elapsed().as_millis() as u64,
            answer_len = content.len(),
            "chat completion completed"
        );
        Ok(content)
    }
}

impl ModelClient for HttpModelClient {
    async fn complete(&self, prompt: &str, images: &[PageImage]) -> Result<String, ModelError> {
        self.call_with_retries(prompt, images, self.max_retries).await
    }
}

/// Wait before attempt number `attempt` (0-based; never called with 0).
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(32);
    Duration::from_millis(base_ms.saturating_mul(factor))
}

/// Pull `choices[0].message.content` out of a 200 response body.
fn extract_content(body: &str) -> Result<String, ModelError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        ModelError::MalformedResponse(format!(
            "{e}; expected `choices[0].message.content` in {}",
            make_snippet(body)
        ))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ModelError::MalformedResponse("no content in first choice".into()))
}

fn make_snippet(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

impl<'a> ChatRequest<'a> {
    fn new(
        model: &'a str,
        prompt: &'a str,
        images: &[PageImage],
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(ContentPart::Text { text: prompt });
        content.extend(images.iter().map(|img| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: img.data_uri(),
            },
        }));

        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens,
            temperature,
        }
    }

    fn image_count(&self) -> usize {
        self.messages
            .iter()
            .flat_map(|m| m.content.iter())
            .filter(|p| matches!(p, ContentPart::ImageUrl { .. }))
            .count()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
