//! # allergen-extract
//!
//! Extract allergen and nutrition data from PDF food labels and product
//! specification sheets.
//!
//! ## Pipeline Overview
//!
//! ```text
//! POST /extract (multipart "file")
//!  │
//!  ├─ 1. Input    reject uploads without the %PDF magic
//!  ├─ 2. Text     per page: native text layer, or render → PNG → Tesseract
//!  ├─ 3. Check    blank text → 400 "Could not extract text"
//!  ├─ 4. Model    fixed prompt + text → chat completion, response_format json_object
//!  └─ 5. Output   model content returned verbatim as application/json
//! ```
//!
//! Scanned pages are OCR'd with an explicit multi-language hint set
//! (`eng+hun+deu+fra` by default) so non-English labels are not read as
//! English. Requests are independent; nothing is cached or shared between them.
//!
//! ## Library use
//!
//! ```rust,no_run
//! use allergen_extract::{
//!     router, AppState, HttpConfig, LlmStructuredModel, PdfTextExtractor, ServiceConfig,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ServiceConfig::default());
//! let extractor = PdfTextExtractor::with_tesseract(Arc::clone(&config));
//! let model = LlmStructuredModel::openai(&config, &std::env::var("OPENAI_API_KEY")?)?;
//! let http = HttpConfig::default();
//!
//! let app = router(AppState::new(Arc::new(extractor), Arc::new(model)), &http);
//! let listener = tokio::net::TcpListener::bind(http.socket_addr()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `allergen-server` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CorsPolicy, HttpConfig, ServiceConfig, ServiceConfigBuilder};
pub use error::{ConfigError, ExtractError, ModelError, OcrError};
pub use extract::{extract_text, PdfTextExtractor, TextExtractor};
pub use pipeline::llm::{request_structured_data, LlmStructuredModel, StructuredDataModel};
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use server::{router, AppState, ApiError};
