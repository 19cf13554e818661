//! Image encoding: `DynamicImage` → base64 PNG wrapped in [`PageImage`].
//!
//! OpenAI-compatible vision endpoints accept images as base64 data-URIs
//! embedded in the JSON request body. PNG keeps rendered text crisp; JPEG
//! artefacts around glyphs hurt reading accuracy.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// MIME type of every encoded page.
pub const PNG_MIME: &str = "image/png";

/// One rendered page, base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Base64 (standard alphabet, padded) PNG bytes.
    pub data: String,
}

impl PageImage {
    pub fn new(page_num: usize, data: impl Into<String>) -> Self {
        Self {
            page_num,
            data: data.into(),
        }
    }

    /// `data:image/png;base64,...` form used in the request body.
    pub fn data_uri(&self) -> String {
        format!("data:{PNG_MIME};base64,{}", self.data)
    }
}

/// Encode a rasterised page as a base64 PNG.
pub fn encode_page(page_num: usize, img: &DynamicImage) -> Result<PageImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page {} → {} bytes base64", page_num, b64.len());

    Ok(PageImage::new(page_num, b64))
}
