//! # edgequake-compliance
//!
//! Answer a fixed catalog of regulatory compliance questions about a PDF
//! using a Vision Language Model (VLM).
//!
//! The document is rasterised once at startup; every question is then sent to
//! the model together with every page image and a reference context snippet,
//! and the model's free-text analysis comes back as an [`AnalysisResult`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF ── render (pdfium, once) ── encode (PNG → base64) ──┐
//!                                                         ├─▶ VLM (retry) ─▶ AnalysisResult
//! question catalog + context JSON ── prompt ──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_compliance::{AnalysisService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::builder()
//!         .api_key(std::env::var("API_KEY")?)
//!         .pdf_path("data/model_doc.pdf")
//!         .build()?;
//!     let service = AnalysisService::from_config(&config).await?;
//!     let result = service.analyze(1).await;
//!     println!("{}: {}", result.question, result.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `compliance-api` server binary (clap + anyhow + dotenvy + tracing-subscriber/appender) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use context::{ContextSource, ContextStore};
pub use error::{ComplianceError, ModelError};
pub use output::{AnalysisResult, AnalysisStatus, QuestionInfo, ServiceStatus};
pub use pipeline::encode::PageImage;
pub use pipeline::llm::{HttpModelClient, ModelClient};
pub use pipeline::render::{render_document, DocumentImages};
pub use service::AnalysisService;
