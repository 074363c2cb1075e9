//! Local-first PDF transformation pipeline.
//!
//! `pdfworkbench` stages input files, validates them against a fixed
//! registry of nine transformation tools, and runs the selected tool over
//! the staged items in paced batches, emitting finished outputs to an
//! injected sink. All transformation happens in-process; no file ever
//! leaves the machine.
//!
//! # Quick start
//!
//! ```no_run
//! use pdfworkbench::{
//!     Dispatcher, InputFile, MemorySink, StagingStore, ToolKind,
//! };
//!
//! # async fn demo() -> Result<(), pdfworkbench::ToolError> {
//! let mut store = StagingStore::new(ToolKind::Merge);
//! store.add_files([
//!     InputFile::new("a.pdf", Some("application/pdf"), std::fs::read("a.pdf").unwrap()),
//!     InputFile::new("b.pdf", Some("application/pdf"), std::fs::read("b.pdf").unwrap()),
//! ]);
//!
//! let sink = MemorySink::new();
//! let dispatcher = Dispatcher::with_default_backends();
//! let summary = dispatcher.run(&store, &sink).await?;
//! assert_eq!(summary.outputs, 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`staging`] — ordered, deduplicated input list scoped to the active tool
//! - [`registry`] — the fixed tool set and per-tool configuration
//! - [`pages`] — lenient 1-based page-range expression parser
//! - [`scheduler`] — batched, paced, cancellable item traversal
//! - [`tools`] — the dispatcher and one routine per tool
//! - [`engine`] — collaborator traits plus the lopdf and pdfium backends
//! - [`emit`] — output sink boundary
//!
//! Runs operate on a snapshot of the staged items taken when the run is
//! triggered; staging mutations made while a run is in flight affect later
//! runs only.

pub mod emit;
pub mod engine;
pub mod error;
pub mod options;
pub mod pages;
pub mod progress;
pub mod registry;
pub mod scheduler;
pub mod staging;
pub mod tools;

pub use emit::{MemorySink, OutputFile, OutputSink};
pub use error::{ErrorKind, ToolError};
pub use options::{
    CompressOptions, ImageOutputFormat, PdfToImagesOptions, RemovePagesOptions, RotateOptions,
    RotationAngle, SplitMethod, SplitOptions, ToolOptions, WatermarkAnchor, WatermarkOptions,
};
pub use pages::parse_page_ranges;
pub use progress::{NoopProgress, ProcessingSession, ProgressObserver, RunStatus, SharedProgress};
pub use registry::{FileTypeFilter, ToolConfig, ToolKind};
pub use scheduler::{BatchPolicy, CancelToken};
pub use staging::{InputFile, StagedItem, StagingStore};
pub use tools::{Dispatcher, RunSummary};
