//! Tool registry: the fixed set of transformation tools and their
//! per-tool configuration.
//!
//! The registry is a `'static` table, not runtime registration — the tool
//! set is closed and a `match` over [`ToolKind`] gives compile-time coverage
//! of every routine in the dispatcher. Front-ends use [`ToolConfig`] to
//! decide which files a tool accepts and whether reordering controls make
//! sense (single-file tools have nothing to reorder).

use crate::error::ToolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the nine fixed transformation tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    Merge,
    Split,
    Compress,
    PdfToImages,
    ImagesToPdf,
    Rotate,
    Watermark,
    RemovePages,
    Organize,
}

impl ToolKind {
    /// Every registered tool, in presentation order.
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Merge,
        ToolKind::Split,
        ToolKind::Compress,
        ToolKind::PdfToImages,
        ToolKind::ImagesToPdf,
        ToolKind::Rotate,
        ToolKind::Watermark,
        ToolKind::RemovePages,
        ToolKind::Organize,
    ];

    /// The stable wire/CLI identifier for this tool.
    pub fn id(self) -> &'static str {
        match self {
            ToolKind::Merge => "merge",
            ToolKind::Split => "split",
            ToolKind::Compress => "compress",
            ToolKind::PdfToImages => "pdf-to-images",
            ToolKind::ImagesToPdf => "images-to-pdf",
            ToolKind::Rotate => "rotate",
            ToolKind::Watermark => "watermark",
            ToolKind::RemovePages => "remove-pages",
            ToolKind::Organize => "organize",
        }
    }

    /// The static configuration for this tool.
    pub fn config(self) -> &'static ToolConfig {
        &CONFIGS[self as usize]
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| ToolError::UnknownTool { id: s.to_string() })
    }
}

/// Which input files a tool's staging filter accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTypeFilter {
    /// `application/pdf` MIME, or a case-insensitive `.pdf` suffix when the
    /// MIME type is missing or generic.
    Pdf,
    /// Any `image/*` MIME type.
    Image,
}

impl FileTypeFilter {
    /// Whether a candidate file passes this filter.
    pub fn accepts(self, name: &str, mime: Option<&str>) -> bool {
        match self {
            FileTypeFilter::Pdf => {
                mime == Some("application/pdf") || name.to_lowercase().ends_with(".pdf")
            }
            FileTypeFilter::Image => mime.is_some_and(|m| m.starts_with("image/")),
        }
    }
}

/// Immutable, process-wide configuration of one tool.
#[derive(Debug)]
pub struct ToolConfig {
    pub kind: ToolKind,
    pub title: &'static str,
    pub description: &'static str,
    pub accepts: FileTypeFilter,
    /// Single-file tools replace the staged item instead of appending, and
    /// expose no reordering.
    pub allows_multiple: bool,
}

// Indexed by `ToolKind as usize`, so the order must match the enum.
static CONFIGS: [ToolConfig; 9] = [
    ToolConfig {
        kind: ToolKind::Merge,
        title: "Merge PDFs",
        description: "Combine multiple PDF files into one document",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::Split,
        title: "Split PDF",
        description: "Extract pages or split a PDF into multiple files",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: false,
    },
    ToolConfig {
        kind: ToolKind::Compress,
        title: "Compress PDF",
        description: "Re-save PDFs with object pruning and stream compression",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::PdfToImages,
        title: "PDF to Images",
        description: "Rasterize PDF pages into an image archive",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::ImagesToPdf,
        title: "Images to PDF",
        description: "Convert JPG and PNG images into a PDF document",
        accepts: FileTypeFilter::Image,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::Rotate,
        title: "Rotate PDF",
        description: "Rotate every page by a fixed angle",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::Watermark,
        title: "Add Watermark",
        description: "Stamp text on every page",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: true,
    },
    ToolConfig {
        kind: ToolKind::RemovePages,
        title: "Remove Pages",
        description: "Delete selected pages from a PDF",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: false,
    },
    ToolConfig {
        kind: ToolKind::Organize,
        title: "Organize PDF",
        description: "Reorder pages interactively (not supported here)",
        accepts: FileTypeFilter::Pdf,
        allows_multiple: false,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_table_matches_enum_order() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.config().kind, kind);
        }
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for kind in ToolKind::ALL {
            assert_eq!(kind.id().parse::<ToolKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(matches!(
            "frobnicate".parse::<ToolKind>(),
            Err(ToolError::UnknownTool { .. })
        ));
    }

    #[test]
    fn serde_uses_kebab_case_ids() {
        let json = serde_json::to_string(&ToolKind::PdfToImages).unwrap();
        assert_eq!(json, "\"pdf-to-images\"");
        let back: ToolKind = serde_json::from_str("\"remove-pages\"").unwrap();
        assert_eq!(back, ToolKind::RemovePages);
    }

    #[test]
    fn pdf_filter_accepts_mime_or_suffix() {
        let f = FileTypeFilter::Pdf;
        assert!(f.accepts("doc.pdf", None));
        assert!(f.accepts("DOC.PDF", None));
        assert!(f.accepts("blob", Some("application/pdf")));
        assert!(!f.accepts("photo.png", Some("image/png")));
    }

    #[test]
    fn image_filter_requires_image_mime() {
        let f = FileTypeFilter::Image;
        assert!(f.accepts("photo.png", Some("image/png")));
        assert!(f.accepts("photo.jpg", Some("image/jpeg")));
        // Extension alone is not enough for the image filter.
        assert!(!f.accepts("photo.png", None));
        assert!(!f.accepts("doc.pdf", Some("application/pdf")));
    }

    #[test]
    fn single_file_tools_are_marked() {
        assert!(!ToolKind::Split.config().allows_multiple);
        assert!(!ToolKind::RemovePages.config().allows_multiple);
        assert!(ToolKind::Merge.config().allows_multiple);
        assert!(ToolKind::Compress.config().allows_multiple);
    }
}
