//! Upload validation: reject bytes that cannot be a PDF before pdfium sees them.
//!
//! Checking the `%PDF` magic first turns an HTML error page or a PNG sent by
//! mistake into a clean [`ExtractError::DocumentParse`] instead of an opaque
//! pdfium failure, and skips binding the library for obviously bad input.

use crate::error::ExtractError;
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Verify that `bytes` start with the PDF magic.
pub fn validate_pdf_bytes(bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::DocumentParse {
            detail: "upload is empty".to_string(),
        });
    }

    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let head = &bytes[..bytes.len().min(PDF_MAGIC.len())];
        return Err(ExtractError::DocumentParse {
            detail: format!("not a PDF, first bytes: {:?}", head),
        });
    }

    debug!("Upload looks like a PDF ({} bytes)", bytes.len());
    Ok(())
}
