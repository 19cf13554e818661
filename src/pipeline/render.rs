//! PDF rasterisation: render every page of the document once, at startup.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so
//! Tokio worker threads never stall during rendering and PNG encoding.
//!
//! ## Failure policy
//!
//! Any page that fails to render or encode aborts the whole conversion. The
//! service answers every question against the complete document, so a partial
//! image set is never produced.

use crate::error::ComplianceError;
use crate::pipeline::encode::{encode_page, PageImage};
use crate::pipeline::input::validate_document;
use pdfium_render::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Points per inch in PDF user space.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// The fully rendered document, shared read-only by every analysis.
#[derive(Debug, Clone)]
pub struct DocumentImages {
    path: PathBuf,
    pages: Vec<PageImage>,
}

impl DocumentImages {
    /// Wrap already-encoded pages, e.g. from a cache or a test.
    pub fn from_pages(path: impl Into<PathBuf>, pages: Vec<PageImage>) -> Self {
        Self {
            path: path.into(),
            pages,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages in document order.
    pub fn pages(&self) -> &[PageImage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Rasterise every page of `pdf_path` at `dpi` and base64-encode it.
///
/// # Errors
/// - [`ComplianceError::DocumentNotFound`] / `PermissionDenied` / `NotAPdf`
///   before pdfium is touched
/// - [`ComplianceError::PdfiumBindingFailed`] if no pdfium library is found
/// - [`ComplianceError::CorruptPdf`], `RasterisationFailed`, `EncodingFailed`
///   for the first page that cannot be produced
pub async fn render_document(pdf_path: &Path, dpi: u32) -> Result<DocumentImages, ComplianceError> {
    validate_document(pdf_path)?;

    let path = pdf_path.to_path_buf();
    let start = Instant::now();

    let pages = tokio::task::spawn_blocking(move || render_pages_blocking(&path, dpi))
        .await
        .map_err(|e| ComplianceError::Internal(format!("Render task panicked: {}", e)))??;

    info!(
        "Rendered {} pages of {} at {} DPI in {}ms",
        pages.len(),
        pdf_path.display(),
        dpi,
        start.elapsed().as_millis()
    );

    Ok(DocumentImages::from_pages(pdf_path, pages))
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(pdf_path: &Path, dpi: u32) -> Result<Vec<PageImage>, ComplianceError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ComplianceError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / PDF_POINTS_PER_INCH);

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ComplianceError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        let encoded =
            encode_page(page_num, &image).map_err(|e| ComplianceError::EncodingFailed {
                page: page_num,
                detail: e.to_string(),
            })?;

        results.push(encoded);
    }

    Ok(results)
}

/// Bind to pdfium through `pdfium-auto`: `PDFIUM_LIB_PATH`, then the local
/// cache, then a one-time download into that cache.
fn bind_pdfium() -> Result<Pdfium, ComplianceError> {
    if let Some(lib) = library_in_dir(std::env::var_os("PDFIUM_LIB_PATH")) {
        debug!("Binding pdfium from {}", lib.display());
        return Ok(pdfium_auto::bind_pdfium_from_path(&lib)?);
    }
    Ok(pdfium_auto::bind_pdfium_silent()?)
}

/// `PDFIUM_LIB_PATH` may name the directory holding the library; resolve it
/// to the platform file name. Files and unset values are left to pdfium-auto.
fn library_in_dir(raw: Option<OsString>) -> Option<PathBuf> {
    let path = PathBuf::from(raw?);
    path.is_dir().then(|| Pdfium::pdfium_platform_library_name_at_path(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_document_fails_before_binding() {
        let err = render_document(Path::new("/no/such/doc.pdf"), 150)
            .await
            .unwrap_err();
        assert!(matches!(err, ComplianceError::DocumentNotFound { .. }));
    }

    #[test]
    fn lib_path_directory_resolves_to_platform_library() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_in_dir(Some(dir.path().as_os_str().to_owned())).unwrap();
        assert_eq!(lib.parent(), Some(dir.path()));
        assert!(lib
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains("pdfium")));
    }

    #[test]
    fn lib_path_file_or_unset_is_left_to_pdfium_auto() {
        assert!(library_in_dir(None).is_none());
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(library_in_dir(Some(file.path().as_os_str().to_owned())).is_none());
    }

    #[test]
    fn from_pages_keeps_order() {
        let doc = DocumentImages::from_pages(
            "doc.pdf",
            vec![PageImage::new(1, "AA=="), PageImage::new(2, "BB==")],
        );
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[0].page_num, 1);
        assert_eq!(doc.pages()[1].page_num, 2);
        assert_eq!(doc.path(), Path::new("doc.pdf"));
    }
}
