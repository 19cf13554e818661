//! Pipeline stages that turn the configured PDF into answers.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can change without touching the model client.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ (prompt + images) ──▶ llm
//! (path)    (pdfium)   (base64)                          (VLM, retry)
//! ```
//!
//! 1. [`input`]: validate the document path before pdfium touches it
//! 2. [`render`]: rasterise every page once at startup; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`]: PNG-encode and base64-wrap each page for the request body
//! 4. [`llm`]: drive the model call with retry/backoff; the only stage
//!    with network I/O

pub mod encode;
pub mod input;
pub mod llm;
pub mod render;
