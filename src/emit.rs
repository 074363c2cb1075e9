//! Output emitter boundary: named byte buffers handed to the host.
//!
//! The core produces outputs; what "delivery" means — a download, a file on
//! disk, a test assertion — belongs to the front-end. [`OutputSink::emit`]
//! is fire-and-forget: the pipeline never consumes a return value, so a
//! sink must not fail the run. Outputs for per-file tools are emitted in
//! staged order, and outputs already emitted before a mid-run failure stay
//! emitted.

use std::sync::Mutex;

/// MIME type of PDF outputs.
pub const MIME_PDF: &str = "application/pdf";
/// MIME type of the rasterized-page archive.
pub const MIME_ZIP: &str = "application/zip";

/// One finished output: payload plus the name/MIME the host should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: MIME_PDF,
            bytes,
        }
    }

    pub fn zip(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: MIME_ZIP,
            bytes,
        }
    }
}

/// Receives finished outputs. `Send + Sync` with interior mutability, the
/// same shape as [`crate::progress::ProgressObserver`].
pub trait OutputSink: Send + Sync {
    fn emit(&self, output: OutputFile);
}

/// Collects outputs in memory — the default sink, also used by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Mutex<Vec<OutputFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every collected output, leaving the sink empty.
    pub fn drain(&self) -> Vec<OutputFile> {
        std::mem::take(&mut self.outputs.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.outputs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for MemorySink {
    fn emit(&self, output: OutputFile) {
        self.outputs.lock().unwrap().push(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_in_emission_order() {
        let sink = MemorySink::new();
        sink.emit(OutputFile::pdf("a.pdf", vec![1]));
        sink.emit(OutputFile::zip("b.zip", vec![2]));
        let outputs = sink.drain();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].name, "a.pdf");
        assert_eq!(outputs[0].mime, MIME_PDF);
        assert_eq!(outputs[1].mime, MIME_ZIP);
        assert!(sink.is_empty());
    }
}
