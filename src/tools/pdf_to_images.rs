//! PDF to images: rasterize every page of every staged PDF and pack the
//! encoded images into one zip archive.

use super::{file_stem, RunCtx};
use crate::emit::OutputFile;
use crate::engine::RasterOptions;
use crate::error::ToolError;
use crate::options::PdfToImagesOptions;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const OUTPUT_NAME: &str = "pdf_images.zip";

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &PdfToImagesOptions,
) -> Result<usize, ToolError> {
    let raster_options = RasterOptions {
        scale: opts.scale,
        format: opts.format,
        quality: opts.quality,
    };
    let extension = opts.format.extension();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let entry_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let pages =
                ctx.rasterizer
                    .rasterize(&item.file.name, &item.file.bytes, &raster_options)?;
            let stem = file_stem(&item.file.name);
            debug!(name = %item.file.name, pages = pages.len(), "rasterized");
            for page in pages {
                let entry = format!("{stem}_page_{}.{extension}", page.page);
                writer
                    .start_file(entry, entry_options)
                    .map_err(|e| ToolError::Archive(e.to_string()))?;
                writer
                    .write_all(&page.bytes)
                    .map_err(|e| ToolError::Archive(e.to_string()))?;
            }
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    let cursor = writer
        .finish()
        .map_err(|e| ToolError::Archive(e.to_string()))?;
    ctx.sink
        .emit(OutputFile::zip(OUTPUT_NAME, cursor.into_inner()));
    Ok(1)
}
