//! Per-tool option records, gathered under one tagged sum type.
//!
//! The original design kept options in an untyped name→value bag validated
//! at run time. Here each tool gets its own record and [`ToolOptions`] ties
//! the record to the tool id, so the dispatcher's `match` covers every tool
//! at compile time and an option can never leak into the wrong routine.
//!
//! Defaults mirror the observed front-end: split by individual pages,
//! compression level 0.8, 90° rotation, a centred "DRAFT" watermark at half
//! opacity, PNG output at 2× oversampling for rasterization.

use crate::registry::ToolKind;
use serde::{Deserialize, Serialize};

/// Options for the active tool, one variant per [`ToolKind`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolOptions {
    Merge,
    Split(SplitOptions),
    Compress(CompressOptions),
    PdfToImages(PdfToImagesOptions),
    ImagesToPdf,
    Rotate(RotateOptions),
    Watermark(WatermarkOptions),
    RemovePages(RemovePagesOptions),
    Organize,
}

impl ToolOptions {
    /// The tool these options belong to.
    pub fn tool(&self) -> ToolKind {
        match self {
            ToolOptions::Merge => ToolKind::Merge,
            ToolOptions::Split(_) => ToolKind::Split,
            ToolOptions::Compress(_) => ToolKind::Compress,
            ToolOptions::PdfToImages(_) => ToolKind::PdfToImages,
            ToolOptions::ImagesToPdf => ToolKind::ImagesToPdf,
            ToolOptions::Rotate(_) => ToolKind::Rotate,
            ToolOptions::Watermark(_) => ToolKind::Watermark,
            ToolOptions::RemovePages(_) => ToolKind::RemovePages,
            ToolOptions::Organize => ToolKind::Organize,
        }
    }

    /// Default options for a tool, used when the user has not touched any
    /// controls. Options are scoped to the tool session and reset on switch.
    pub fn default_for(kind: ToolKind) -> Self {
        match kind {
            ToolKind::Merge => ToolOptions::Merge,
            ToolKind::Split => ToolOptions::Split(SplitOptions::default()),
            ToolKind::Compress => ToolOptions::Compress(CompressOptions::default()),
            ToolKind::PdfToImages => ToolOptions::PdfToImages(PdfToImagesOptions::default()),
            ToolKind::ImagesToPdf => ToolOptions::ImagesToPdf,
            ToolKind::Rotate => ToolOptions::Rotate(RotateOptions::default()),
            ToolKind::Watermark => ToolOptions::Watermark(WatermarkOptions::default()),
            ToolKind::RemovePages => ToolOptions::RemovePages(RemovePagesOptions::default()),
            ToolKind::Organize => ToolOptions::Organize,
        }
    }
}

/// How the split tool divides the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum SplitMethod {
    /// One single-page output per source page.
    All,
    /// Copy exactly the pages named by a page-range expression into one output.
    Pages { expression: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitOptions {
    pub method: SplitMethod,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            method: SplitMethod::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressOptions {
    /// Requested compression level in `0.1..=1.0`. Accepted and logged, but
    /// the only guaranteed effect is a structural re-save — byte-size
    /// reduction depends entirely on the engine.
    pub level: f32,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self { level: 0.8 }
    }
}

/// Rotation delta applied to every page, additive to any existing rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationAngle {
    #[default]
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl RotationAngle {
    pub fn degrees(self) -> i64 {
        match self {
            RotationAngle::Deg90 => 90,
            RotationAngle::Deg180 => 180,
            RotationAngle::Deg270 => 270,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotateOptions {
    pub angle: RotationAngle,
}

/// The five fixed watermark layout presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkAnchor {
    #[default]
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl WatermarkAnchor {
    /// Tilt applied when the user leaves it unset: the classic 45° diagonal
    /// for centred stamps, horizontal text in the corners.
    pub fn default_tilt(self) -> f32 {
        match self {
            WatermarkAnchor::Center => 45.0,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkOptions {
    pub text: String,
    pub anchor: WatermarkAnchor,
    /// Fill opacity in `0.0..=1.0`.
    pub opacity: f32,
    /// Font size in points.
    pub font_size: f32,
    /// Counter-clockwise tilt in degrees; `None` uses the anchor's default.
    pub tilt_degrees: Option<f32>,
}

impl WatermarkOptions {
    pub fn effective_tilt(&self) -> f32 {
        self.tilt_degrees.unwrap_or(self.anchor.default_tilt())
    }
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: "DRAFT".to_string(),
            anchor: WatermarkAnchor::Center,
            opacity: 0.5,
            font_size: 50.0,
            tilt_degrees: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemovePagesOptions {
    /// Page-range expression naming the pages to delete.
    pub expression: String,
}

/// Output encoding for rasterized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageOutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageOutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageOutputFormat::Png => "png",
            ImageOutputFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfToImagesOptions {
    pub format: ImageOutputFormat,
    /// JPEG quality in `1..=100`; ignored for PNG.
    pub quality: u8,
    /// Fixed oversampling factor applied when rasterizing.
    pub scale: f32,
}

impl Default for PdfToImagesOptions {
    fn default() -> Self {
        Self {
            format: ImageOutputFormat::Png,
            quality: 80,
            scale: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_know_their_tool() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolOptions::default_for(kind).tool(), kind);
        }
    }

    #[test]
    fn watermark_defaults_match_the_front_end() {
        let w = WatermarkOptions::default();
        assert_eq!(w.text, "DRAFT");
        assert_eq!(w.opacity, 0.5);
        assert_eq!(w.effective_tilt(), 45.0);
    }

    #[test]
    fn corner_anchors_default_to_no_tilt() {
        let w = WatermarkOptions {
            anchor: WatermarkAnchor::BottomRight,
            ..WatermarkOptions::default()
        };
        assert_eq!(w.effective_tilt(), 0.0);
        let tilted = WatermarkOptions {
            tilt_degrees: Some(30.0),
            ..w
        };
        assert_eq!(tilted.effective_tilt(), 30.0);
    }

    #[test]
    fn options_serde_round_trip() {
        let opts = ToolOptions::Split(SplitOptions {
            method: SplitMethod::Pages {
                expression: "1,3-4".into(),
            },
        });
        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"tool\":\"split\""), "got: {json}");
        let back: ToolOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tool(), ToolKind::Split);
    }

    #[test]
    fn rotation_degrees() {
        assert_eq!(RotationAngle::Deg90.degrees(), 90);
        assert_eq!(RotationAngle::Deg270.degrees(), 270);
        assert_eq!(RotationAngle::default().degrees(), 90);
    }
}
