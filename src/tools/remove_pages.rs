//! Remove pages: delete the selected pages from the single staged PDF.
//!
//! The selection must match at least one page and must leave at least one
//! page behind; both checks happen after the document is opened, so the
//! expression is validated against the real page count.

use super::RunCtx;
use crate::emit::OutputFile;
use crate::engine::SaveMode;
use crate::error::ToolError;
use crate::options::RemovePagesOptions;
use crate::pages::parse_page_ranges;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &RemovePagesOptions,
) -> Result<usize, ToolError> {
    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let mut doc = ctx.engine.open(&item.file.name, &item.file.bytes)?;
            let total = doc.page_count();
            let pages = parse_page_ranges(&opts.expression, total);
            if pages.is_empty() {
                return Err(ToolError::EmptyPageSelection {
                    expression: opts.expression.clone(),
                    total,
                });
            }
            if pages.len() >= total {
                return Err(ToolError::WouldRemoveAllPages {
                    selected: pages.len(),
                    total,
                });
            }
            debug!(name = %item.file.name, removing = pages.len(), total, "removing pages");
            doc.remove_pages(&pages)?;
            let bytes = doc.save(SaveMode::Plain)?;
            ctx.sink
                .emit(OutputFile::pdf(format!("removed_{}", item.file.name), bytes));
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    Ok(1)
}
