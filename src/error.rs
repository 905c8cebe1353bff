//! Error types for the allergen-extract library.
//!
//! Each stage of a request has its own error type so the HTTP layer can map
//! every failure to a deliberate status code:
//!
//! * [`ExtractError`]: the document could not be turned into text (bad
//!   bytes, missing pdfium, OCR failure). Fatal for the request.
//!
//! * [`OcrError`]: the OCR engine itself failed. Wrapped into
//!   [`ExtractError::Ocr`] together with the page number.
//!
//! * [`ModelError`]: the language-model call failed or the provider could
//!   not be constructed.
//!
//! * [`ConfigError`]: builder validation failed at startup.

use thiserror::Error;

/// Fatal errors from the text-extraction stage.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The bytes are not a parseable PDF document.
    #[error("Document could not be parsed: {detail}")]
    DocumentParse { detail: String },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// The pdfium shared library could not be bound.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    /// pdfium failed to load or rasterise a page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// OCR failed for a page with no text layer.
    #[error("OCR failed for page {page}: {source}")]
    Ocr {
        page: usize,
        #[source]
        source: OcrError,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. the blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Whether the failure is on the server side rather than in the upload.
    ///
    /// A missing pdfium library or a panicked worker is not the client's
    /// fault; everything else means "this document yielded no text".
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            ExtractError::EngineUnavailable(_) | ExtractError::Internal(_)
        )
    }
}

/// Errors raised by an OCR engine.
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// Engine could not start (binary or language data missing).
    #[error("OCR engine initialisation failed for languages '{languages}': {detail}")]
    Init { languages: String, detail: String },

    /// The image could not be handed to the engine.
    #[error("OCR engine rejected the page image: {0}")]
    Image(String),

    /// Recognition itself failed.
    #[error("OCR recognition failed: {0}")]
    Recognize(String),
}

/// Errors from the structured-data request to the language model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    NotConfigured { provider: String, hint: String },

    /// Transport, authentication, rate-limit or API error.
    #[error("LLM API error: {message}")]
    Request { message: String },
}

/// Invalid configuration rejected by a builder.
#[derive(Debug, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);
