//! Collaborator boundary: the external PDF object-model and rasterization
//! engines, specified as traits.
//!
//! The pipeline never manipulates PDF bytes itself — it issues intent-level
//! operations (copy these pages, rotate everything, stamp this text) and
//! receives byte buffers or page counts back. Page numbers are 1-based on
//! this boundary's public side; converting to whatever indexing a backend
//! uses internally is the backend's job.
//!
//! Two backends ship with the crate: [`lopdf_backend::LopdfEngine`] for the
//! object-model operations and [`raster::PdfiumRasterizer`] for page
//! rasterization. Tests substitute scripted fakes; nothing in the pipeline
//! depends on a concrete backend.

pub mod lopdf_backend;
pub mod raster;

use crate::error::ToolError;
use crate::options::{ImageOutputFormat, RotationAngle, WatermarkAnchor};

/// Factory for document handles. `Send + Sync` so one engine can be shared
/// across runs; individual handles are single-owner and need not be.
pub trait PdfEngine: Send + Sync {
    /// Parse a PDF from bytes. Malformed input is a collaborator error.
    fn open(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, ToolError>;

    /// Start an empty assembly that accumulates pages from several sources.
    fn new_assembly(&self) -> Box<dyn PdfAssembly>;
}

/// An open document. All page lists are 1-based and must be ascending.
///
/// Handles are single-owner (`Send`, not `Sync`): the pipeline never issues
/// two concurrent operations against one document.
pub trait PdfDocument: Send {
    fn page_count(&self) -> usize;

    /// Copy exactly `pages` (ascending, 1-based) into a fresh single
    /// document and return its bytes. The source is left untouched.
    fn extract_pages(&self, pages: &[usize]) -> Result<Vec<u8>, ToolError>;

    /// Delete `pages` (ascending, 1-based) in place.
    fn remove_pages(&mut self, pages: &[usize]) -> Result<(), ToolError>;

    /// Add `angle` to every page's existing rotation.
    fn rotate_all(&mut self, angle: RotationAngle) -> Result<(), ToolError>;

    /// Stamp the watermark on every page.
    fn watermark_all(&mut self, spec: &WatermarkSpec) -> Result<(), ToolError>;

    /// Serialize the document. [`SaveMode::Compact`] additionally prunes
    /// unreferenced objects and compresses streams.
    fn save(&mut self, mode: SaveMode) -> Result<Vec<u8>, ToolError>;
}

/// Accumulates pages from multiple sources into one output document.
pub trait PdfAssembly: Send {
    /// Append every page of a source PDF, in order. Returns the number of
    /// pages appended.
    fn append_pdf(&mut self, name: &str, bytes: &[u8]) -> Result<usize, ToolError>;

    /// Append one page sized exactly to the image's pixel dimensions, with
    /// the image drawn to fill it.
    fn append_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), ToolError>;

    /// Finish the assembly and serialize the combined document.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, ToolError>;
}

/// How [`PdfDocument::save`] should serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Plain structural re-save.
    Plain,
    /// Re-save with object pruning and stream compression.
    Compact,
}

/// Resolved watermark placement and styling, ready for a backend to draw.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub text: String,
    pub anchor: WatermarkAnchor,
    pub opacity: f32,
    pub font_size: f32,
    /// Counter-clockwise tilt in degrees.
    pub tilt_degrees: f32,
}

impl From<&crate::options::WatermarkOptions> for WatermarkSpec {
    fn from(opts: &crate::options::WatermarkOptions) -> Self {
        Self {
            text: opts.text.clone(),
            anchor: opts.anchor,
            opacity: opts.opacity.clamp(0.0, 1.0),
            font_size: opts.font_size.max(1.0),
            tilt_degrees: opts.effective_tilt(),
        }
    }
}

/// Rasterization parameters for the PDF→images tool.
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Fixed oversampling factor relative to the page's nominal size.
    pub scale: f32,
    pub format: ImageOutputFormat,
    /// JPEG quality in `1..=100`; ignored for PNG.
    pub quality: u8,
}

/// One rasterized page, already encoded in the requested format.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 1-based page number within its source document.
    pub page: usize,
    pub bytes: Vec<u8>,
}

/// Renders every page of a document to encoded images.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(
        &self,
        name: &str,
        bytes: &[u8],
        options: &RasterOptions,
    ) -> Result<Vec<RenderedPage>, ToolError>;
}
