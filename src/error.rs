//! Error types for the pdfworkbench library.
//!
//! One enum, [`ToolError`], covers every failure a run can hit. A run is
//! all-or-nothing: the first error aborts it, outputs emitted before the
//! failing item stay emitted, and nothing is retried. Because callers
//! (front-ends) mostly care about the *class* of failure — did the user
//! supply bad input, or did the PDF library choke? — every variant maps onto
//! an [`ErrorKind`] via [`ToolError::kind`].
//!
//! Malformed page-range tokens are deliberately *not* errors: the parser
//! drops them silently, and only an empty final selection escalates to
//! [`ToolError::EmptyPageSelection`].

use thiserror::Error;

/// Broad classification of a [`ToolError`], for front-ends that branch on
/// failure class rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user's input or options were invalid (empty page selection,
    /// removing every page, wrong file multiplicity, …).
    Validation,
    /// Dispatch was attempted on a tool id outside the registry.
    UnknownTool,
    /// The external PDF/rasterization collaborator rejected the input or
    /// failed mid-operation.
    Collaborator,
    /// The operation is recognised but not implemented in this front-end.
    Unsupported,
    /// The run was cancelled between items.
    Cancelled,
    /// A bug or unexpected internal condition.
    Internal,
}

/// All errors returned by the pdfworkbench pipeline.
#[derive(Debug, Error)]
pub enum ToolError {
    // ── Validation ────────────────────────────────────────────────────────
    /// A page-range expression matched nothing after dropping invalid tokens.
    #[error("no valid pages matched '{expression}' (document has {total} pages)\nUse 1-based page numbers, e.g. \"1,3,5-8\".")]
    EmptyPageSelection { expression: String, total: usize },

    /// Removing the selected pages would leave an empty document.
    #[error("removing {selected} of {total} pages would leave an empty document")]
    WouldRemoveAllPages { selected: usize, total: usize },

    /// Processing was triggered with nothing staged.
    #[error("no staged files to process")]
    NoInput,

    /// A single-file tool received more than one staged item.
    #[error("tool '{tool}' operates on exactly one file, but {staged} are staged")]
    TooManyInputs { tool: &'static str, staged: usize },

    /// The options variant does not belong to the tool being run.
    #[error("options mismatch: expected options for '{expected}', got options for '{got}'")]
    OptionsMismatch {
        expected: &'static str,
        got: &'static str,
    },

    // ── Registry ──────────────────────────────────────────────────────────
    /// The tool id is not in the registry.
    #[error("unknown tool '{id}'\nKnown tools: merge, split, compress, pdf-to-images, images-to-pdf, rotate, watermark, remove-pages, organize")]
    UnknownTool { id: String },

    /// The tool exists in the registry but has no transformation routine.
    #[error("tool '{tool}' is not supported by this front-end: {detail}")]
    Unsupported { tool: &'static str, detail: String },

    // ── Collaborator ──────────────────────────────────────────────────────
    /// The PDF engine failed to load or transform a document.
    #[error("PDF engine failed on '{name}': {detail}")]
    Engine { name: String, detail: String },

    /// The rasterizer failed on a specific page.
    #[error("rasterization failed on page {page}: {detail}")]
    Raster { page: usize, detail: String },

    /// The rasterizer could not be bound at all (missing pdfium library).
    #[error("rasterizer unavailable: {0}\nInstall the pdfium shared library or set PDFIUM_LIB_PATH.")]
    RasterUnavailable(String),

    /// Writing the output archive failed.
    #[error("archive write failed: {0}")]
    Archive(String),

    /// An image payload could not be decoded or encoded.
    #[error("image '{name}' could not be processed: {detail}")]
    Image { name: String, detail: String },

    // ── Control flow ──────────────────────────────────────────────────────
    /// The run's cancel token fired between items.
    #[error("run cancelled after {completed} of {total} items")]
    Cancelled { completed: usize, total: usize },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// The broad failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::EmptyPageSelection { .. }
            | ToolError::WouldRemoveAllPages { .. }
            | ToolError::NoInput
            | ToolError::TooManyInputs { .. }
            | ToolError::OptionsMismatch { .. } => ErrorKind::Validation,
            ToolError::UnknownTool { .. } => ErrorKind::UnknownTool,
            ToolError::Engine { .. }
            | ToolError::Raster { .. }
            | ToolError::Archive(_)
            | ToolError::Image { .. } => ErrorKind::Collaborator,
            ToolError::Unsupported { .. } | ToolError::RasterUnavailable(_) => {
                ErrorKind::Unsupported
            }
            ToolError::Cancelled { .. } => ErrorKind::Cancelled,
            ToolError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_display() {
        let e = ToolError::EmptyPageSelection {
            expression: "5-2".into(),
            total: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("5-2"), "got: {msg}");
        assert!(msg.contains("10 pages"), "got: {msg}");
        assert_eq!(e.kind(), ErrorKind::Validation);
    }

    #[test]
    fn remove_all_pages_is_validation() {
        let e = ToolError::WouldRemoveAllPages {
            selected: 3,
            total: 3,
        };
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert!(e.to_string().contains("3 of 3"));
    }

    #[test]
    fn unknown_tool_lists_registry() {
        let e = ToolError::UnknownTool { id: "shred".into() };
        assert_eq!(e.kind(), ErrorKind::UnknownTool);
        assert!(e.to_string().contains("merge"));
    }

    #[test]
    fn engine_failures_are_collaborator_class() {
        let e = ToolError::Engine {
            name: "a.pdf".into(),
            detail: "bad xref".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Collaborator);
    }

    #[test]
    fn cancelled_reports_progress_point() {
        let e = ToolError::Cancelled {
            completed: 2,
            total: 7,
        };
        assert!(e.to_string().contains("2 of 7"));
        assert_eq!(e.kind(), ErrorKind::Cancelled);
    }
}
