//! Document path validation.
//!
//! pdfium reports a missing file and a non-PDF file with the same opaque
//! error, so the path is checked here first: it must exist, be readable, and
//! start with the `%PDF` magic bytes.

use crate::error::ComplianceError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Validate that `path` names a readable PDF.
pub fn validate_document(path: &Path) -> Result<(), ComplianceError> {
    if !path.exists() {
        return Err(ComplianceError::DocumentNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ComplianceError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ComplianceError::DocumentNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(ComplianceError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}
