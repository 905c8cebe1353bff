//! Per-page text policy: native text layer first, OCR otherwise.
//!
//! For each page, in document order:
//!
//! 1. read the embedded text layer;
//! 2. if it is non-blank after trimming, keep it verbatim;
//! 3. otherwise render the page to PNG for OCR.
//!
//! Recognition happens in a second pass ([`recognize_pages`]) once every page
//! has been read, and each scanned page contributes whatever the engine
//! returns (possibly nothing). Exactly one source contributes per page. No separator is inserted between
//! pages. The policy is written against [`PageContent`] so it runs unchanged
//! over pdfium pages and over in-memory fakes in tests.

use crate::error::ExtractError;
use crate::pipeline::ocr::OcrEngine;
use tracing::{debug, info, warn};

/// A single document page as seen by the text policy.
pub trait PageContent {
    /// The page's embedded text layer.
    fn native_text(&self) -> Result<String, ExtractError>;

    /// The page rasterised and encoded as PNG.
    fn render_png(&self) -> Result<Vec<u8>, ExtractError>;
}

impl<P: PageContent + ?Sized> PageContent for &P {
    fn native_text(&self) -> Result<String, ExtractError> {
        (**self).native_text()
    }

    fn render_png(&self) -> Result<Vec<u8>, ExtractError> {
        (**self).render_png()
    }
}

/// What one page contributes before OCR runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Non-blank text layer, used verbatim.
    Native(String),
    /// No usable text layer; the page rendered as PNG, awaiting OCR.
    Scanned { page: usize, png: Vec<u8> },
}

/// Read every page in order, keeping its text layer or its rendered image.
///
/// Touches only the page source, never the OCR engine, so a caller holding
/// a document handle can release it before recognition starts. A failure to
/// *read* a text layer is not fatal: the page is treated as having none and
/// is rendered. Page load and render failures abort.
pub fn gather_pages<P, I>(pages: I) -> Result<Vec<PageSource>, ExtractError>
where
    I: IntoIterator<Item = Result<P, ExtractError>>,
    P: PageContent,
{
    let mut sources = Vec::new();

    for (idx, page) in pages.into_iter().enumerate() {
        let page_num = idx + 1;
        let page = page?;

        let native = page.native_text().unwrap_or_else(|e| {
            warn!("Page {}: text layer unreadable, falling back to OCR: {}", page_num, e);
            String::new()
        });

        if !native.trim().is_empty() {
            debug!("Page {}: text layer, {} chars", page_num, native.len());
            sources.push(PageSource::Native(native));
            continue;
        }

        let png = page.render_png()?;
        debug!("Page {}: no text layer, rendered {} bytes", page_num, png.len());
        sources.push(PageSource::Scanned {
            page: page_num,
            png,
        });
    }

    Ok(sources)
}

/// OCR the scanned pages and concatenate everything in page order.
///
/// An OCR failure aborts the whole extraction and names the page.
pub fn recognize_pages(
    sources: Vec<PageSource>,
    ocr: &dyn OcrEngine,
    languages: &str,
) -> Result<String, ExtractError> {
    let total_pages = sources.len();
    let mut ocr_pages = 0usize;
    let mut text = String::new();

    for source in sources {
        match source {
            PageSource::Native(native) => text.push_str(&native),
            PageSource::Scanned { page, png } => {
                let recognized = ocr
                    .recognize(&png, languages)
                    .map_err(|source| ExtractError::Ocr { page, source })?;
                debug!("Page {}: OCR, {} chars", page, recognized.len());
                text.push_str(&recognized);
                ocr_pages += 1;
            }
        }
    }

    info!(
        "Extracted {} chars from {} pages ({} via OCR)",
        text.len(),
        total_pages,
        ocr_pages
    );

    Ok(text)
}

/// Concatenate the text of every page in order: [`gather_pages`] followed
/// by [`recognize_pages`].
pub fn collect_text<P, I>(
    pages: I,
    ocr: &dyn OcrEngine,
    languages: &str,
) -> Result<String, ExtractError>
where
    I: IntoIterator<Item = Result<P, ExtractError>>,
    P: PageContent,
{
    recognize_pages(gather_pages(pages)?, ocr, languages)
}
