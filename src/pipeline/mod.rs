//! Pipeline stages for turning an uploaded PDF into structured data.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ text ──┬──────────────▶ llm
//! (magic)   (pdfium)  (policy) └─▶ encode ─▶ ocr
//!                                 (PNG)    (tesseract)
//! ```
//!
//! 1. [`input`]: reject uploads that are not PDFs
//! 2. [`render`]: load the document with pdfium and expose its pages
//! 3. [`text`]: per page, native text layer or OCR of the rendered image
//! 4. [`encode`]: PNG-encode a rendered page for the OCR engine
//! 5. [`ocr`]: the OCR seam and its Tesseract implementation
//! 6. [`llm`]: build the prompt and fetch the model's JSON; the only stage
//!    with network I/O

pub mod encode;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod render;
pub mod text;
