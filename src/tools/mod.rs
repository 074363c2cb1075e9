//! Transformation dispatcher: routes a triggered run to the tool routine.
//!
//! One file per tool, mirroring the registry. The dispatcher validates the
//! run (multiplicity, options/tool agreement), snapshots nothing itself —
//! callers pass the staged items — and `match`es on [`ToolOptions`], so a
//! new tool cannot be added without the compiler pointing at every routine
//! that needs updating.
//!
//! Every routine drives its items through [`run_batched`], so batching,
//! pacing, progress, and cancellation behave identically across tools.

mod compress;
mod images_to_pdf;
mod merge;
mod pdf_to_images;
mod remove_pages;
mod rotate;
mod split;
mod watermark;

use crate::emit::OutputSink;
use crate::engine::lopdf_backend::LopdfEngine;
use crate::engine::raster::PdfiumRasterizer;
use crate::engine::{PageRasterizer, PdfEngine};
use crate::error::ToolError;
use crate::options::ToolOptions;
use crate::progress::{NoopProgress, ProgressObserver, SharedProgress};
use crate::registry::ToolKind;
use crate::scheduler::{BatchPolicy, CancelToken};
use crate::staging::{StagedItem, StagingStore};
use std::sync::Arc;
use tracing::{info, warn};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub tool: ToolKind,
    /// Items in the snapshot the run processed.
    pub items: usize,
    /// Outputs emitted to the sink.
    pub outputs: usize,
}

/// Everything a tool routine needs, bundled so routine signatures stay flat.
pub(crate) struct RunCtx<'a> {
    pub engine: &'a dyn PdfEngine,
    pub rasterizer: &'a dyn PageRasterizer,
    pub policy: &'a BatchPolicy,
    pub observer: &'a dyn ProgressObserver,
    pub cancel: &'a CancelToken,
    pub sink: &'a dyn OutputSink,
}

/// Routes runs to tool routines over injected collaborator backends.
pub struct Dispatcher {
    engine: Arc<dyn PdfEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
    policy: BatchPolicy,
    progress: SharedProgress,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn PdfEngine>, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self {
            engine,
            rasterizer,
            policy: BatchPolicy::default(),
            progress: Arc::new(NoopProgress),
        }
    }

    /// A dispatcher over the shipped lopdf + pdfium backends.
    pub fn with_default_backends() -> Self {
        Self::new(Arc::new(LopdfEngine::new()), Arc::new(PdfiumRasterizer::new()))
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the store's active tool over a snapshot of its staged items.
    pub async fn run(
        &self,
        store: &StagingStore,
        sink: &dyn OutputSink,
    ) -> Result<RunSummary, ToolError> {
        self.run_with_cancel(store, sink, &CancelToken::new()).await
    }

    /// Like [`Dispatcher::run`], with a caller-held cancellation token.
    pub async fn run_with_cancel(
        &self,
        store: &StagingStore,
        sink: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<RunSummary, ToolError> {
        let snapshot = store.snapshot();
        self.run_tool(store.tool(), store.options(), &snapshot, sink, cancel)
            .await
    }

    /// Run `tool` directly over `items`. This is the seam the store-level
    /// entry points go through; callers holding their own item lists (and
    /// tests) can use it without a [`StagingStore`].
    pub async fn run_tool(
        &self,
        tool: ToolKind,
        options: &ToolOptions,
        items: &[StagedItem],
        sink: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<RunSummary, ToolError> {
        let result = self.execute(tool, options, items, sink, cancel).await;
        match &result {
            Ok(summary) => {
                info!(tool = %tool, outputs = summary.outputs, "run complete");
                self.progress.on_run_complete(summary.outputs);
            }
            Err(e) => {
                warn!(tool = %tool, error = %e, "run failed");
                self.progress.on_run_failed(&e.to_string());
            }
        }
        result
    }

    async fn execute(
        &self,
        tool: ToolKind,
        options: &ToolOptions,
        items: &[StagedItem],
        sink: &dyn OutputSink,
        cancel: &CancelToken,
    ) -> Result<RunSummary, ToolError> {
        if options.tool() != tool {
            return Err(ToolError::OptionsMismatch {
                expected: tool.id(),
                got: options.tool().id(),
            });
        }
        if items.is_empty() {
            return Err(ToolError::NoInput);
        }
        if !tool.config().allows_multiple && items.len() > 1 {
            return Err(ToolError::TooManyInputs {
                tool: tool.id(),
                staged: items.len(),
            });
        }

        info!(tool = %tool, items = items.len(), "run start");
        self.progress.on_run_start(items.len());

        let ctx = RunCtx {
            engine: self.engine.as_ref(),
            rasterizer: self.rasterizer.as_ref(),
            policy: &self.policy,
            observer: self.progress.as_ref(),
            cancel,
            sink,
        };

        let outputs = match options {
            ToolOptions::Merge => merge::run(&ctx, items).await?,
            ToolOptions::Split(opts) => split::run(&ctx, items, opts).await?,
            ToolOptions::Compress(opts) => compress::run(&ctx, items, opts).await?,
            ToolOptions::PdfToImages(opts) => pdf_to_images::run(&ctx, items, opts).await?,
            ToolOptions::ImagesToPdf => images_to_pdf::run(&ctx, items).await?,
            ToolOptions::Rotate(opts) => rotate::run(&ctx, items, opts).await?,
            ToolOptions::Watermark(opts) => watermark::run(&ctx, items, opts).await?,
            ToolOptions::RemovePages(opts) => remove_pages::run(&ctx, items, opts).await?,
            ToolOptions::Organize => {
                return Err(ToolError::Unsupported {
                    tool: ToolKind::Organize.id(),
                    detail: "page reordering needs an interactive front-end".to_string(),
                })
            }
        };

        Ok(RunSummary {
            tool,
            items: items.len(),
            outputs,
        })
    }
}

/// `name` without a trailing `.pdf`, for deriving output names.
pub(crate) fn file_stem(name: &str) -> &str {
    name.strip_suffix(".pdf")
        .or_else(|| name.strip_suffix(".PDF"))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_strips_pdf_suffix_only() {
        assert_eq!(file_stem("report.pdf"), "report");
        assert_eq!(file_stem("REPORT.PDF"), "REPORT");
        assert_eq!(file_stem("archive.tar"), "archive.tar");
        assert_eq!(file_stem("noext"), "noext");
    }
}
