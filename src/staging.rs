//! Staging store: the ordered, deduplicated list of input files awaiting
//! transformation, scoped to the active tool.
//!
//! The store is an owned, injectable value — construct one per front-end
//! session (or per test) rather than reaching for a global. Item order is
//! significant: merge concatenates in staged order, and per-file tools emit
//! outputs in staged order.
//!
//! ## Identity heuristic
//!
//! Two files are "the same" when they share `(name, byte size)`. That is a
//! deliberate heuristic, not a content hash: it is what a user means when
//! they drop the same file twice, and it costs nothing.

use crate::options::ToolOptions;
use crate::registry::{ToolConfig, ToolKind};
use std::sync::Arc;
use tracing::debug;

/// An input file: name, declared MIME type, payload.
///
/// Shared behind [`Arc`] so that run snapshots clone cheaply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.map(str::to_string),
            bytes,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }
}

/// A staged file plus its pipeline bookkeeping.
#[derive(Debug, Clone)]
pub struct StagedItem {
    /// Opaque token identifying this item within the store.
    pub id: u64,
    pub file: Arc<InputFile>,
    /// Filled in lazily once an engine has opened the document.
    pub page_count: Option<usize>,
}

impl StagedItem {
    fn dedup_key(&self) -> (&str, usize) {
        (self.file.name.as_str(), self.file.byte_size())
    }
}

/// Holds the staged items and the currently selected tool + options.
#[derive(Debug)]
pub struct StagingStore {
    items: Vec<StagedItem>,
    tool: ToolKind,
    options: ToolOptions,
    next_id: u64,
}

impl StagingStore {
    /// Create a store with the given tool active and its default options.
    pub fn new(tool: ToolKind) -> Self {
        Self {
            items: Vec::new(),
            tool,
            options: ToolOptions::default_for(tool),
            next_id: 1,
        }
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn tool_config(&self) -> &'static ToolConfig {
        self.tool.config()
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Replace the current options. Options for a different tool are
    /// ignored — they belong to a stale session.
    pub fn set_options(&mut self, options: ToolOptions) {
        if options.tool() == self.tool {
            self.options = options;
        } else {
            debug!(
                expected = %self.tool,
                got = %options.tool(),
                "ignoring options for inactive tool"
            );
        }
    }

    /// Switch the active tool: clears all staged items and resets options.
    pub fn select_tool(&mut self, tool: ToolKind) {
        if tool != self.tool {
            debug!(from = %self.tool, to = %tool, "tool switch, clearing staged items");
        }
        self.tool = tool;
        self.options = ToolOptions::default_for(tool);
        self.items.clear();
    }

    pub fn items(&self) -> &[StagedItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Filter, deduplicate, and stage candidate files.
    ///
    /// Candidates that fail the active tool's type filter are dropped, as
    /// are duplicates of already-staged items or of earlier candidates in
    /// the same call. For single-file tools the survivors *replace* the
    /// staged item (first survivor wins) instead of appending. Relative
    /// candidate order is preserved. Returns the ids of newly staged items.
    pub fn add_files(&mut self, candidates: impl IntoIterator<Item = InputFile>) -> Vec<u64> {
        let config = self.tool_config();
        let mut accepted: Vec<StagedItem> = Vec::new();

        for file in candidates {
            if !config.accepts.accepts(&file.name, file.mime.as_deref()) {
                debug!(name = %file.name, tool = %self.tool, "rejected by type filter");
                continue;
            }
            let item = StagedItem {
                id: self.next_id,
                file: Arc::new(file),
                page_count: None,
            };
            let duplicate = self
                .items
                .iter()
                .chain(accepted.iter())
                .any(|existing| existing.dedup_key() == item.dedup_key());
            if duplicate {
                debug!(name = %item.file.name, size = item.file.byte_size(), "duplicate dropped");
                continue;
            }
            self.next_id += 1;
            accepted.push(item);
        }

        if !config.allows_multiple {
            if let Some(first) = accepted.into_iter().next() {
                let id = first.id;
                self.items = vec![first];
                return vec![id];
            }
            return Vec::new();
        }

        let ids = accepted.iter().map(|i| i.id).collect();
        self.items.extend(accepted);
        ids
    }

    /// Remove the item with the given id. Unknown ids are ignored.
    pub fn remove(&mut self, id: u64) {
        self.items.retain(|i| i.id != id);
    }

    /// Drop every staged item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Move an item to a new position.
    ///
    /// Only meaningful for multi-file tools; a no-op for single-file tools
    /// and whenever either index is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if !self.tool_config().allows_multiple {
            return;
        }
        if from >= self.items.len() || to >= self.items.len() {
            return;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
    }

    /// Record a document's page count once an engine has opened it.
    pub fn set_page_count(&mut self, id: u64, pages: usize) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.page_count = Some(pages);
        }
    }

    /// Clone the item list for a run. Runs operate on the snapshot taken at
    /// trigger time; staging mutations made while a run is in flight do not
    /// affect it.
    pub fn snapshot(&self) -> Vec<StagedItem> {
        self.items.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, size: usize) -> InputFile {
        InputFile::new(name, Some("application/pdf"), vec![0u8; size])
    }

    fn png(name: &str, size: usize) -> InputFile {
        InputFile::new(name, Some("image/png"), vec![0u8; size])
    }

    #[test]
    fn duplicate_name_and_size_staged_once() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 100), pdf("a.pdf", 100)]);
        assert_eq!(store.len(), 1);
        // Same name, different size: not a duplicate.
        store.add_files([pdf("a.pdf", 101)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn dedup_applies_across_calls() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 100)]);
        store.add_files([pdf("a.pdf", 100), pdf("b.pdf", 50)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn type_filter_rejects_mismatched_candidates() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([png("photo.png", 10), pdf("a.pdf", 100)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.items()[0].file.name, "a.pdf");

        let mut images = StagingStore::new(ToolKind::ImagesToPdf);
        images.add_files([pdf("a.pdf", 100), png("photo.png", 10)]);
        assert_eq!(images.len(), 1);
        assert_eq!(images.items()[0].file.name, "photo.png");
    }

    #[test]
    fn single_file_tool_keeps_first_survivor() {
        let mut store = StagingStore::new(ToolKind::Split);
        store.add_files([pdf("a.pdf", 100), pdf("b.pdf", 200)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.items()[0].file.name, "a.pdf");
        // A later add replaces rather than appends.
        store.add_files([pdf("c.pdf", 300)]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.items()[0].file.name, "c.pdf");
    }

    #[test]
    fn insertion_preserves_candidate_order() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("c.pdf", 1), pdf("a.pdf", 2), pdf("b.pdf", 3)]);
        let names: Vec<_> = store.items().iter().map(|i| i.file.name.clone()).collect();
        assert_eq!(names, ["c.pdf", "a.pdf", "b.pdf"]);
    }

    #[test]
    fn move_item_reorders() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 1), pdf("b.pdf", 2), pdf("c.pdf", 3)]);
        store.move_item(2, 0);
        let names: Vec<_> = store.items().iter().map(|i| i.file.name.clone()).collect();
        assert_eq!(names, ["c.pdf", "a.pdf", "b.pdf"]);
    }

    #[test]
    fn move_item_out_of_bounds_is_a_noop() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 1), pdf("b.pdf", 2)]);
        let before: Vec<_> = store.items().iter().map(|i| i.id).collect();
        store.move_item(0, 5);
        store.move_item(9, 0);
        let after: Vec<_> = store.items().iter().map(|i| i.id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn move_item_rejected_for_single_file_tool() {
        let mut store = StagingStore::new(ToolKind::RemovePages);
        store.add_files([pdf("a.pdf", 1)]);
        store.move_item(0, 0); // valid indices, still a no-op path
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn tool_switch_clears_items_and_resets_options() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 1)]);
        store.select_tool(ToolKind::Rotate);
        assert!(store.is_empty());
        assert_eq!(store.options().tool(), ToolKind::Rotate);
    }

    #[test]
    fn stale_options_are_ignored() {
        let mut store = StagingStore::new(ToolKind::Rotate);
        store.set_options(ToolOptions::Merge);
        assert_eq!(store.options().tool(), ToolKind::Rotate);
    }

    #[test]
    fn remove_and_clear() {
        let mut store = StagingStore::new(ToolKind::Merge);
        let ids = store.add_files([pdf("a.pdf", 1), pdf("b.pdf", 2)]);
        store.remove(ids[0]);
        assert_eq!(store.len(), 1);
        store.remove(9999); // unknown id ignored
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let mut store = StagingStore::new(ToolKind::Merge);
        store.add_files([pdf("a.pdf", 1), pdf("b.pdf", 2)]);
        let snap = store.snapshot();
        store.clear();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].file.name, "a.pdf");
    }
}
