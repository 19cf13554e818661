//! Configuration for the compliance analysis service.
//!
//! Everything the service needs is static and read once at process start:
//! model endpoint and credentials, the document and context-mapping paths,
//! the CORS origin list, and the rendering/retry knobs. The whole set lives
//! in one [`ServiceConfig`], built via [`ServiceConfigBuilder`], and is
//! handed to the service by value; nothing reads the environment later.

use crate::error::ComplianceError;
use std::fmt;
use std::path::PathBuf;

/// Default OpenAI-compatible chat-completions URL.
pub const DEFAULT_BASE_URL: &str =
    "https://dashscope-intl.aliyuncs.com/compatible-mode/v1/chat/completions";

/// Default multimodal model.
pub const DEFAULT_MODEL: &str = "qwen-vl-max";

/// Default path of the document under analysis.
pub const DEFAULT_PDF_PATH: &str = "data/model_doc.pdf";

/// Default path of the question → context mapping.
pub const DEFAULT_CONTEXT_PATH: &str = "data/question_to_content_mapping.json";

/// Service configuration.
///
/// # Example
/// ```rust
/// use edgequake_compliance::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .api_key("sk-test")
///     .pdf_path("data/model_doc.pdf")
///     .dpi(150)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// Bearer token sent in the `Authorization` header.
    pub api_key: String,

    /// Full chat-completions URL of the model provider.
    pub base_url: String,

    /// Model identifier sent in every request.
    pub model: String,

    /// The PDF rendered once at startup.
    pub pdf_path: PathBuf,

    /// JSON mapping of question id → reference context.
    pub context_path: PathBuf,

    /// Origins allowed by CORS. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Rendering DPI used when rasterising each page. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum output tokens per answer. Default: 1500.
    pub max_tokens: u32,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Attempts per model call (not retries after the first). Default: 3.
    pub max_retries: u32,

    /// Delay before the second attempt in milliseconds; doubles each time.
    /// Default: 1000, giving waits of 1 s, 2 s, 4 s, ...
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Questions in flight at once during a batch. Default: 1 (sequential).
    pub batch_concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            pdf_path: PathBuf::from(DEFAULT_PDF_PATH),
            context_path: PathBuf::from(DEFAULT_CONTEXT_PATH),
            allowed_origins: vec!["*".to_string()],
            dpi: 150,
            max_tokens: 1500,
            temperature: 0.3,
            max_retries: 3,
            retry_backoff_ms: 1000,
            api_timeout_secs: 60,
            batch_concurrency: 1,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("pdf_path", &self.pdf_path)
            .field("context_path", &self.context_path)
            .field("allowed_origins", &self.allowed_origins)
            .field("dpi", &self.dpi)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish()
    }
}

fn redact(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether CORS should accept any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn pdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdf_path = path.into();
        self
    }

    pub fn context_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.context_path = path.into();
        self
    }

    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_origins = origins
            .into_iter()
            .map(Into::into)
            .map(|o: String| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.config.batch_concurrency = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ComplianceError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(ComplianceError::InvalidConfig(
                "API key must not be empty".into(),
            ));
        }
        let url = c.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ComplianceError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.max_retries == 0 {
            return Err(ComplianceError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.batch_concurrency == 0 {
            return Err(ComplianceError::InvalidConfig(
                "batch concurrency must be ≥ 1".into(),
            ));
        }
        if c.allowed_origins.is_empty() {
            return Err(ComplianceError::InvalidConfig(
                "at least one allowed origin is required (use \"*\" for any)".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let c = ServiceConfig::default();
        assert_eq!(c.dpi, 150);
        assert_eq!(c.max_tokens, 1500);
        assert_eq!(c.temperature, 0.3);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.retry_backoff_ms, 1000);
        assert_eq!(c.api_timeout_secs, 60);
        assert_eq!(c.batch_concurrency, 1);
        assert!(c.allows_any_origin());
    }

    #[test]
    fn empty_api_key_rejected() {
        let err = ServiceConfig::builder().build().unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn bad_url_rejected() {
        let err = ServiceConfig::builder()
            .api_key("k")
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn zero_concurrency_rejected() {
        assert!(ServiceConfig::builder()
            .api_key("k")
            .batch_concurrency(0)
            .build()
            .is_err());
    }

    #[test]
    fn dpi_is_clamped() {
        let c = ServiceConfig::builder().api_key("k").dpi(1000).build().unwrap();
        assert_eq!(c.dpi, 400);
    }

    #[test]
    fn origins_are_trimmed() {
        let c = ServiceConfig::builder()
            .api_key("k")
            .allowed_origins([" https://a.example ", "", "https://b.example"])
            .build()
            .unwrap();
        assert_eq!(c.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!c.allows_any_origin());
    }

    #[test]
    fn debug_redacts_key() {
        let c = ServiceConfig::builder().api_key("sk-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
