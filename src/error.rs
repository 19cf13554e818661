//! Error types for the edgequake-compliance library.
//!
//! Two distinct error types reflect two distinct failure tiers:
//!
//! * [`ComplianceError`]: raised while bringing the service up (document
//!   missing, not a PDF, rasterisation failed, bad configuration) and as the
//!   cause recorded inside a failed [`crate::output::AnalysisResult`].
//!   Startup variants are fatal: the service cannot answer anything without
//!   its document.
//!
//! * [`ModelError`]: a single model call failed. The Analysis Service turns
//!   it into a `failed` result record rather than propagating it, so one bad
//!   question never takes down a batch.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-compliance library.
#[derive(Debug, Error)]
pub enum ComplianceError {
    // ── Document errors ───────────────────────────────────────────────────
    /// Document was not found at the configured path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    DocumentNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be PNG-encoded.
    #[error("Image encoding failed for page {page}: {detail}")]
    EncodingFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory), or allow the\n\
first start to download pdfium into the local cache.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Analysis errors ───────────────────────────────────────────────────
    /// The question id is not part of the catalog.
    #[error("Invalid question ID: {0}")]
    UnknownQuestion(u32),

    /// The model call failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed call to the remote vision model.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Every attempt failed; `last_error` describes the final one.
    #[error("Failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The endpoint answered with something other than HTTP 200.
    #[error("API Error {status}: {snippet}")]
    HttpStatus { status: u16, snippet: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP 200 but the body lacks `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ModelError {
    /// Whether another attempt might succeed.
    ///
    /// Malformed success payloads and client construction failures are
    /// structural; repeating the identical request cannot fix them.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModelError::HttpStatus { .. } | ModelError::Transport(_))
    }
}

impl From<pdfium_auto::PdfiumAutoError> for ComplianceError {
    fn from(e: pdfium_auto::PdfiumAutoError) -> Self {
        ComplianceError::PdfiumBindingFailed(e.to_string())
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        ModelError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_exhausted_display() {
        let e = ModelError::RetriesExhausted {
            attempts: 3,
            last_error: "API Error 503: busy".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Failed after 3 attempts"), "got: {msg}");
        assert!(msg.contains("503"));
    }

    #[test]
    fn unknown_question_display() {
        let e = ComplianceError::UnknownQuestion(21);
        assert_eq!(e.to_string(), "Invalid question ID: 21");
    }

    #[test]
    fn model_error_is_transparent() {
        let e: ComplianceError = ModelError::Transport("connection refused".into()).into();
        assert_eq!(e.to_string(), "transport error: connection refused");
    }

    #[test]
    fn retryable_classification() {
        assert!(ModelError::HttpStatus {
            status: 500,
            snippet: String::new()
        }
        .is_retryable());
        assert!(ModelError::Transport("timeout".into()).is_retryable());
        assert!(!ModelError::MalformedResponse("no choices".into()).is_retryable());
    }

    #[test]
    fn pdfium_auto_failures_become_binding_errors() {
        let e: ComplianceError = pdfium_auto::PdfiumAutoError::Bind {
            path: PathBuf::from("/opt/pdfium/libpdfium.so"),
            reason: "cannot open shared object file".into(),
        }
        .into();
        assert!(matches!(e, ComplianceError::PdfiumBindingFailed(_)));
        let msg = e.to_string();
        assert!(msg.contains("/opt/pdfium/libpdfium.so"), "got: {msg}");
        assert!(msg.contains("PDFIUM_LIB_PATH"), "got: {msg}");

        let e: ComplianceError = pdfium_auto::PdfiumAutoError::Download("GET failed".into()).into();
        assert!(e.to_string().contains("Download failed: GET failed"));
    }

    #[test]
    fn document_not_found_mentions_path() {
        let e = ComplianceError::DocumentNotFound {
            path: PathBuf::from("/tmp/missing.pdf"),
        };
        assert!(e.to_string().contains("/tmp/missing.pdf"));
    }
}
