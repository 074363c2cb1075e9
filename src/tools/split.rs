//! Split: break the single staged PDF into per-page files, or copy a
//! page-range selection into one new document.

use super::{file_stem, RunCtx};
use crate::emit::OutputFile;
use crate::error::ToolError;
use crate::options::{SplitMethod, SplitOptions};
use crate::pages::parse_page_ranges;
use crate::scheduler::run_batched;
use crate::staging::StagedItem;
use tracing::debug;

pub(crate) async fn run(
    ctx: &RunCtx<'_>,
    items: &[StagedItem],
    opts: &SplitOptions,
) -> Result<usize, ToolError> {
    let mut outputs = 0usize;

    run_batched(items, ctx.policy, ctx.observer, ctx.cancel, |item, _| {
        let result = (|| {
            let doc = ctx.engine.open(&item.file.name, &item.file.bytes)?;
            let total = doc.page_count();
            let stem = file_stem(&item.file.name);

            match &opts.method {
                SplitMethod::All => {
                    debug!(name = %item.file.name, pages = total, "splitting into single pages");
                    for page in 1..=total {
                        let bytes = doc.extract_pages(&[page])?;
                        ctx.sink
                            .emit(OutputFile::pdf(format!("{stem}_page_{page}.pdf"), bytes));
                        outputs += 1;
                    }
                }
                SplitMethod::Pages { expression } => {
                    let pages = parse_page_ranges(expression, total);
                    if pages.is_empty() {
                        return Err(ToolError::EmptyPageSelection {
                            expression: expression.clone(),
                            total,
                        });
                    }
                    debug!(name = %item.file.name, selected = pages.len(), "extracting selection");
                    let bytes = doc.extract_pages(&pages)?;
                    ctx.sink
                        .emit(OutputFile::pdf(format!("{stem}_pages.pdf"), bytes));
                    outputs += 1;
                }
            }
            Ok(())
        })();
        Box::pin(async move { result })
    })
    .await?;

    Ok(outputs)
}
