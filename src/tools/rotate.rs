//! Rotate: add a fixed angle to every page of each staged PDF.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::engine::SaveMode;
use crate::error::ToolError;
use crate::options::RotateOptions;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &RotateOptions,
) -> Result<usize, ToolError> {
    let angle = opts.angle;
    debug!(degrees = angle.degrees(), "rotate run");

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let mut doc = ctx.engine.open(&item.file.name, &item.file.bytes)?;
            doc.rotate_all(angle)?;
            let bytes = doc.save(SaveMode::Plain)?;
            ctx.sink
                .emit(OutputFile::pdf(format!("rotated_{}", item.file.name), bytes));
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    Ok(items.len())
}
