//! PDF rasterization: render every page to a PNG via pdfium.
//!
//! pdfium wraps a C++ library with thread-local state, so all of its calls
//! run inside `spawn_blocking` instead of on the Tokio worker threads. PNG
//! encoding happens there too since it is CPU-bound.

use bytes::Bytes;
use image::ImageFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use crate::ocr::OcrError;

const POINTS_PER_INCH: f32 = 72.0;
/// Upper bound on either rendered edge, regardless of page size. Keeps a
/// malformed page box from requesting an enormous bitmap.
const MAX_PAGE_EDGE_PX: i32 = 8000;

/// Rasterizes all pages of a PDF at the given DPI.
///
/// Returns one entry per page in order; `None` marks a page that failed to
/// render or encode, which callers report as a failed page. An unreadable
/// document is an error for the whole file.
pub async fn render_pages(data: Bytes, dpi: u32) -> Result<Vec<Option<Vec<u8>>>, OcrError> {
    tokio::task::spawn_blocking(move || render_pages_blocking(&data, dpi))
        .await
        .map_err(|e| OcrError::Recognition(format!("PDF render task failed: {e}")))?
}

fn render_pages_blocking(data: &[u8], dpi: u32) -> Result<Vec<Option<Vec<u8>>>, OcrError> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| OcrError::EngineUnavailable(format!("pdfium library: {e:?}")))?;
    let pdfium = Pdfium::new(bindings);

    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| OcrError::PdfDocument(format!("{e:?}")))?;

    let pages = document.pages();
    let total_pages = pages.len();
    debug!("PDF loaded: {total_pages} page(s)");

    let mut rendered = Vec::with_capacity(total_pages as usize);

    for index in 0..total_pages {
        rendered.push(render_single_page(&pages, index, dpi));
    }

    Ok(rendered)
}

fn render_single_page(pages: &PdfPages, index: u16, dpi: u32) -> Option<Vec<u8>> {
    let page = match pages.get(index) {
        Ok(page) => page,
        Err(e) => {
            warn!("Could not open PDF page {}: {e:?}", index + 1);
            return None;
        }
    };

    let width_px = (page.width().value / POINTS_PER_INCH * dpi as f32).round() as i32;
    let render_config = PdfRenderConfig::new()
        .set_target_width(width_px.clamp(1, MAX_PAGE_EDGE_PX))
        .set_maximum_height(MAX_PAGE_EDGE_PX);

    let image = match page.render_with_config(&render_config) {
        Ok(bitmap) => bitmap.as_image(),
        Err(e) => {
            warn!("Could not render PDF page {}: {e:?}", index + 1);
            return None;
        }
    };

    let mut png = Vec::new();
    if let Err(e) = image.write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png) {
        warn!("Could not encode PDF page {}: {e}", index + 1);
        return None;
    }

    debug!(
        "Rendered page {} at {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    Some(png)
}
