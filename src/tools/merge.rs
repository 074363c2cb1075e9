//! Merge: concatenate every staged PDF, in staged order, into one output.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::error::ToolError;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

const OUTPUT_NAME: &str = "merged.pdf";

pub(crate) async fn run(ctx: &RunCtx<'_>, items: &[StagedItem]) -> Result<usize, ToolError> {
    let mut assembly = ctx.engine.new_assembly();

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let appended = assembly
            .append_pdf(&item.file.name, &item.file.bytes)
            .map(|pages| {
                debug!(name = %item.file.name, pages, "appended to merge");
            });
        Box::pin(async move { appended })
    })
    .await?;

    let bytes = assembly.finish()?;
    ctx.sink.emit(OutputFile::pdf(OUTPUT_NAME, bytes));
    Ok(1)
}
