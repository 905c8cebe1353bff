//! pdfium access: load an uploaded PDF from memory and feed its pages to the
//! text policy.
//!
//! Everything here is blocking. pdfium wraps a C++ library with thread-local
//! state, so callers run [`extract_text_blocking`] inside
//! `tokio::task::spawn_blocking` (see [`crate::extract`]).
//!
//! With the `thread_safe` feature, a live `Pdfium` instance holds a
//! process-wide lock from `Pdfium::new` until it is dropped, so concurrent
//! uploads are serialised while pdfium is in use. Only page reading and
//! rendering happen under that lock: [`load_page_sources`] returns owned
//! text and PNGs, drops pdfium, and OCR runs afterwards without it.
//!
//! Rendering only happens for pages whose text layer is blank. The longest
//! rendered edge is capped at `max_rendered_pixels`.

use crate::config::ServiceConfig;
use crate::error::ExtractError;
use crate::pipeline::encode::encode_png;
use crate::pipeline::input::validate_pdf_bytes;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::text::{gather_pages, recognize_pages, PageContent, PageSource};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Bind to pdfium, either at an explicit path or via the system search path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ExtractError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ExtractError::EngineUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// A pdfium page plus what it needs to rasterise itself.
struct PdfiumPage<'a, 'c> {
    page_num: usize,
    page: PdfPage<'a>,
    render_config: &'c PdfRenderConfig,
}

impl PageContent for PdfiumPage<'_, '_> {
    fn native_text(&self) -> Result<String, ExtractError> {
        self.page
            .text()
            .map(|text| text.all())
            .map_err(|e| ExtractError::Render {
                page: self.page_num,
                detail: format!("text layer: {:?}", e),
            })
    }

    fn render_png(&self) -> Result<Vec<u8>, ExtractError> {
        let bitmap = self
            .page
            .render_with_config(self.render_config)
            .map_err(|e| ExtractError::Render {
                page: self.page_num,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            self.page_num,
            image.width(),
            image.height()
        );

        encode_png(&image).map_err(|e| ExtractError::Render {
            page: self.page_num,
            detail: format!("PNG encoding failed: {}", e),
        })
    }
}

/// Extract the full text of an in-memory PDF.
pub fn extract_text_blocking(
    bytes: &[u8],
    config: &ServiceConfig,
    ocr: &dyn OcrEngine,
) -> Result<String, ExtractError> {
    validate_pdf_bytes(bytes)?;
    let sources = load_page_sources(bytes, config)?;
    recognize_pages(sources, ocr, &config.ocr_languages)
}

/// Read each page's text layer, rendering the blank ones to PNG.
///
/// pdfium, the document and every page handle are dropped before this
/// returns, on every path.
pub fn load_page_sources(
    bytes: &[u8],
    config: &ServiceConfig,
) -> Result<Vec<PageSource>, ExtractError> {
    let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(classify_load_error)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let max_pixels = config.max_rendered_pixels as i32;
    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels)
        .set_maximum_height(max_pixels);

    let page_iter = (0..total_pages).map(|idx| {
        pages
            .get(idx as u16)
            .map(|page| PdfiumPage {
                page_num: idx + 1,
                page,
                render_config: &render_config,
            })
            .map_err(|e| ExtractError::Render {
                page: idx + 1,
                detail: format!("{:?}", e),
            })
    });

    gather_pages(page_iter)
}

/// Map a pdfium load failure to a parse error with a useful detail.
fn classify_load_error(e: PdfiumError) -> ExtractError {
    let err_str = format!("{:?}", e);
    let detail = if err_str.contains("Password") || err_str.contains("password") {
        "document is encrypted and requires a password".to_string()
    } else {
        err_str
    };
    ExtractError::DocumentParse { detail }
}
