//! Watermark: stamp the configured text on every page of each staged PDF.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::engine::{SaveMode, WatermarkSpec};
use crate::error::ToolError;
use crate::options::WatermarkOptions;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &WatermarkOptions,
) -> Result<usize, ToolError> {
    let spec = WatermarkSpec::from(opts);
    debug!(text = %spec.text, anchor = ?spec.anchor, "watermark run");

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let mut doc = ctx.engine.open(&item.file.name, &item.file.bytes)?;
            doc.watermark_all(&spec)?;
            let bytes = doc.save(SaveMode::Plain)?;
            ctx.sink.emit(OutputFile::pdf(
                format!("watermarked_{}", item.file.name),
                bytes,
            ));
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    Ok(items.len())
}
