//! Text-extraction entry points.
//!
//! [`TextExtractor`] is what the HTTP handler depends on. The production
//! implementation, [`PdfTextExtractor`], moves the blocking pdfium and
//! Tesseract work onto Tokio's blocking pool with `spawn_blocking` and
//! awaits it. The request still runs its steps one after another, but the
//! async workers stay free for other connections.

use crate::config::ServiceConfig;
use crate::error::ExtractError;
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::render;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Turns uploaded document bytes into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError>;
}

/// pdfium + OCR implementation of [`TextExtractor`].
#[derive(Clone)]
pub struct PdfTextExtractor {
    config: Arc<ServiceConfig>,
    ocr: Arc<dyn OcrEngine>,
}

impl PdfTextExtractor {
    pub fn new(config: Arc<ServiceConfig>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// Extractor using Tesseract with the configured data directory.
    pub fn with_tesseract(config: Arc<ServiceConfig>) -> Self {
        let ocr = TesseractOcr::new(config.tessdata_dir.as_deref());
        Self::new(config, Arc::new(ocr))
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError> {
        let start = Instant::now();
        let size = bytes.len();
        let config = Arc::clone(&self.config);
        let ocr = Arc::clone(&self.ocr);

        let text = tokio::task::spawn_blocking(move || {
            render::extract_text_blocking(&bytes, &config, ocr.as_ref())
        })
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {}", e)))??;

        info!(
            "Extracted {} chars from {} byte upload in {}ms",
            text.len(),
            size,
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// Extract text from PDF bytes with an explicit config and OCR engine.
///
/// Convenience wrapper for callers that do not need a long-lived
/// [`PdfTextExtractor`].
pub async fn extract_text(
    bytes: Vec<u8>,
    config: &ServiceConfig,
    ocr: Arc<dyn OcrEngine>,
) -> Result<String, ExtractError> {
    debug!("One-shot extraction with languages {}", config.ocr_languages);
    PdfTextExtractor::new(Arc::new(config.clone()), ocr)
        .extract(bytes)
        .await
}
