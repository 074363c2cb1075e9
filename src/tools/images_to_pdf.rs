//! Images to PDF: one page per staged image, in staged order, each page
//! sized exactly to its image's pixel dimensions.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::error::ToolError;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::{debug, warn};

const OUTPUT_NAME: &str = "images.pdf";

pub(crate) async fn run(ctx: &RunCtx<'_>, items: &[StagedItem]) -> Result<usize, ToolError> {
    let mut assembly = ctx.engine.new_assembly();

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        // An image the engine cannot decode is skipped, not fatal; the
        // staging filter only sees MIME types, so this is the first point
        // where the payload is actually inspected.
        let appended = match assembly.append_image(&item.file.name, &item.file.bytes) {
            Ok(()) => {
                debug!(name = %item.file.name, "image page appended");
                Ok(())
            }
            Err(ToolError::Image { name, detail }) => {
                warn!(name = %name, detail = %detail, "skipping undecodable image");
                Ok(())
            }
            Err(other) => Err(other),
        };
        Box::pin(async move { appended })
    })
    .await?;

    let bytes = assembly.finish()?;
    ctx.sink.emit(OutputFile::pdf(OUTPUT_NAME, bytes));
    Ok(1)
}
