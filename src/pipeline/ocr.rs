//! OCR backend for pages that carry no text layer.
//!
//! [`OcrEngine`] is the seam between the page policy in
//! [`crate::pipeline::text`] and the concrete engine, so the policy can be
//! tested with a recording fake. The production engine is Tesseract.
//!
//! Tesseract handles are not `Sync`, so a fresh one is created per call.

use crate::error::OcrError;
use std::path::{Path, PathBuf};
use tesseract::Tesseract;
use tracing::debug;

/// Converts a page image into text.
pub trait OcrEngine: Send + Sync {
    /// Recognise text in `png` using the `+`-joined Tesseract `languages`.
    fn recognize(&self, png: &[u8], languages: &str) -> Result<String, OcrError>;
}

/// Tesseract-backed [`OcrEngine`].
#[derive(Debug, Clone, Default)]
pub struct TesseractOcr {
    tessdata_dir: Option<PathBuf>,
}

impl TesseractOcr {
    pub fn new(tessdata_dir: Option<&Path>) -> Self {
        Self {
            tessdata_dir: tessdata_dir.map(Path::to_path_buf),
        }
    }

    fn datapath(&self) -> Option<&str> {
        self.tessdata_dir.as_deref().and_then(Path::to_str)
    }

    fn init(&self, languages: &str) -> Result<Tesseract, OcrError> {
        Tesseract::new(self.datapath(), Some(languages)).map_err(|e| OcrError::Init {
            languages: languages.to_string(),
            detail: e.to_string(),
        })
    }

    /// Check that the engine starts with `languages`.
    ///
    /// Used at startup so missing `*.traineddata` files show up in the logs
    /// before the first scanned upload arrives.
    pub fn check_languages(&self, languages: &str) -> Result<(), OcrError> {
        self.init(languages).map(|_| ())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, png: &[u8], languages: &str) -> Result<String, OcrError> {
        let mut engine = self
            .init(languages)?
            .set_image_from_mem(png)
            .map_err(|e| OcrError::Image(e.to_string()))?
            .recognize()
            .map_err(|e| OcrError::Recognize(e.to_string()))?;

        let text = engine
            .get_text()
            .map_err(|e| OcrError::Recognize(e.to_string()))?;

        debug!("OCR [{}] → {} chars", languages, text.len());
        Ok(text)
    }
}
