//! HTTP server binary for edgequake-compliance.
//!
//! A thin shim over the library crate: maps CLI flags / environment
//! variables to `ServiceConfig`, renders the document, and serves the API.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use edgequake_compliance::config::{
    DEFAULT_BASE_URL, DEFAULT_CONTEXT_PATH, DEFAULT_MODEL, DEFAULT_PDF_PATH,
};
use edgequake_compliance::{api, logging, AnalysisService, ServiceConfig};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /                 service metadata and endpoint index
  GET  /status           document and counter status
  GET  /questions        the 20 catalog questions
  POST /analyze/single   {"qid": 3}
  POST /analyze/batch    {"qids": [1, 2, 5]}   (empty list = all questions)
  GET  /health           liveness probe

ENVIRONMENT VARIABLES:
  API_KEY            Model provider API key (required)
  BASE_URL           OpenAI-compatible chat-completions URL
  MODEL              Vision model ID (default: qwen-vl-max)
  PDF_PATH           Document to analyse
  JSON_PATH          Question → context JSON mapping
  ALLOWED_ORIGINS    Comma-separated CORS origins ("*" for any)
  BIND_ADDRESS       Listen address (default: 0.0.0.0:8000)
  PDFIUM_LIB_PATH    Path to libpdfium (file or directory); else cached or downloaded
  RUST_LOG           Log filter override (e.g. debug, edgequake_compliance=trace)

A `.env` file in the working directory is read first when present.
"#;

/// Serve regulatory compliance analysis of a PDF over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "compliance-api",
    version,
    about = "Serve regulatory compliance analysis of a PDF using a Vision LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Model provider API key.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    /// OpenAI-compatible chat-completions URL.
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Vision model ID.
    #[arg(long, env = "MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// PDF document rendered once at startup.
    #[arg(long, env = "PDF_PATH", default_value = DEFAULT_PDF_PATH)]
    pdf_path: PathBuf,

    /// JSON mapping of question id → reference context.
    #[arg(long, env = "JSON_PATH", default_value = DEFAULT_CONTEXT_PATH)]
    context_path: PathBuf,

    /// Allowed CORS origins, comma separated.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', default_value = "*")]
    allowed_origins: Vec<String>,

    /// Listen address.
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8000")]
    bind: String,

    /// Rendering DPI (72–400).
    #[arg(long, env = "COMPLIANCE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Max output tokens per answer.
    #[arg(long, env = "COMPLIANCE_MAX_TOKENS", default_value_t = 1500)]
    max_tokens: u32,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "COMPLIANCE_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Attempts per model call.
    #[arg(long, env = "COMPLIANCE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Wait before the first retry in milliseconds; doubles each retry.
    #[arg(long, env = "COMPLIANCE_RETRY_BACKOFF_MS", default_value_t = 1000)]
    retry_backoff_ms: u64,

    /// Per-request model timeout in seconds.
    #[arg(long, env = "COMPLIANCE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Questions analysed at once in a batch (1 = sequential).
    #[arg(long, env = "COMPLIANCE_BATCH_CONCURRENCY", default_value_t = 1)]
    batch_concurrency: usize,

    /// Directory for the rolling log file.
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Log to stderr only.
    #[arg(long)]
    no_log_file: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "COMPLIANCE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Read .env before clap so its values count as environment variables.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let _guard = init_logging(&cli)?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = build_config(&cli)?;
    info!(?config, "Starting compliance API");

    // Make sure a pdfium library is on disk before the document is rendered.
    // The first run without PDFIUM_LIB_PATH downloads it into the cache;
    // later starts only check the cached path.
    #[cfg(feature = "bundled")]
    {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_bundled())
            .context("Failed to extract bundled PDFium engine")?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        info!(
            "PDFium not cached in {}; resolving engine",
            pdfium_auto::pdfium_cache_dir().display()
        );
        let lib = tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        info!("PDFium engine ready at {}", lib.display());
    }

    let service = AnalysisService::from_config(&config)
        .await
        .inspect_err(|e| error!("Service initialisation failed: {}", e))
        .context("Failed to initialise analysis service")?;

    let app = api::router(Arc::new(service), &config.allowed_origins);
    api::serve(&cli.bind, app).await.context("Server failed")?;

    info!("Compliance API stopped");
    Ok(())
}

/// stderr output plus the rolling log file described in [`logging`].
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let (file_layer, guard) = if cli.no_log_file {
        (None, None)
    } else {
        let appender = logging::open_log_file(&cli.log_dir)
            .with_context(|| format!("open log file in {}", cli.log_dir.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

/// Map CLI args to `ServiceConfig`.
fn build_config(cli: &Cli) -> Result<ServiceConfig> {
    ServiceConfig::builder()
        .api_key(cli.api_key.clone())
        .base_url(cli.base_url.clone())
        .model(cli.model.clone())
        .pdf_path(cli.pdf_path.clone())
        .context_path(cli.context_path.clone())
        .allowed_origins(cli.allowed_origins.iter().cloned())
        .dpi(cli.dpi)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .retry_backoff_ms(cli.retry_backoff_ms)
        .api_timeout_secs(cli.api_timeout)
        .batch_concurrency(cli.batch_concurrency)
        .build()
        .context("Invalid configuration")
}
