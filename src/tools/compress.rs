//! Compress: re-save each staged PDF with object pruning and stream
//! compression. The level option is accepted for parity with the front-end
//! controls, but byte-size reduction is entirely up to the engine.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::engine::SaveMode;
use crate::error::ToolError;
use crate::options::CompressOptions;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &CompressOptions,
) -> Result<usize, ToolError> {
    debug!(level = opts.level, "compress run");

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let mut doc = ctx.engine.open(&item.file.name, &item.file.bytes)?;
            let bytes = doc.save(SaveMode::Compact)?;
            debug!(
                name = %item.file.name,
                before = item.file.byte_size(),
                after = bytes.len(),
                "compressed"
            );
            ctx.sink
                .emit(OutputFile::pdf(format!("compressed_{}", item.file.name), bytes));
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    Ok(items.len())
}
