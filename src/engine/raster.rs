//! Pdfium-backed page rasterizer.
//!
//! Pdfium handles, like the underlying FPDF library, are not thread-safe,
//! so the binding is acquired inside each `rasterize` call rather than held
//! in the struct. Binding is a library lookup and is cheap to repeat; doing
//! it per call keeps [`PdfiumRasterizer`] `Send + Sync` as the trait
//! requires. A missing system pdfium library surfaces as
//! [`ToolError::RasterUnavailable`] instead of a panic so the rest of the
//! toolset stays usable without it.

use crate::engine::{PageRasterizer, RasterOptions, RenderedPage};
use crate::error::ToolError;
use crate::options::ImageOutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Renders pages through the system pdfium library.
#[derive(Debug, Default)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        name: &str,
        bytes: &[u8],
        options: &RasterOptions,
    ) -> Result<Vec<RenderedPage>, ToolError> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| ToolError::RasterUnavailable(e.to_string()))?;
        let pdfium = Pdfium::new(bindings);

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ToolError::Engine {
                name: name.to_string(),
                detail: e.to_string(),
            })?;

        let scale = if options.scale > 0.0 { options.scale } else { 1.0 };
        let config = PdfRenderConfig::new().scale_page_by_factor(scale);

        let total = document.pages().len() as usize;
        debug!(name, pages = total, scale, "rasterizing document");

        let mut rendered = Vec::with_capacity(total);
        for (index, page) in document.pages().iter().enumerate() {
            let page_number = index + 1;
            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| ToolError::Raster {
                    page: page_number,
                    detail: e.to_string(),
                })?;
            let bytes = encode_page(bitmap.as_image(), options, page_number)?;
            rendered.push(RenderedPage {
                page: page_number,
                bytes,
            });
        }
        Ok(rendered)
    }
}

fn encode_page(
    image: DynamicImage,
    options: &RasterOptions,
    page: usize,
) -> Result<Vec<u8>, ToolError> {
    let raster_err = |detail: String| ToolError::Raster { page, detail };
    let mut cursor = Cursor::new(Vec::new());
    match options.format {
        ImageOutputFormat::Png => {
            image
                .write_to(&mut cursor, image::ImageFormat::Png)
                .map_err(|e| raster_err(e.to_string()))?;
        }
        ImageOutputFormat::Jpeg => {
            // JPEG has no alpha channel; flatten first.
            let rgb = image.to_rgb8();
            let quality = options.quality.clamp(1, 100);
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| raster_err(e.to_string()))?;
        }
    }
    Ok(cursor.into_inner())
}
