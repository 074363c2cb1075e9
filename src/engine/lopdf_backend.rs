//! lopdf-backed implementation of the PDF collaborator traits.
//!
//! Everything here is plain object-model surgery: page deletion for
//! extraction/removal, `/Rotate` arithmetic, appended content streams for
//! watermarks, and the classic renumber-and-relink recipe for merging
//! documents. Image pages are built from scratch — JPEG payloads are
//! embedded as `DCTDecode` streams untouched, everything else is decoded
//! and embedded as raw RGB.
//!
//! Page numbers arriving over the trait boundary are 1-based, which is also
//! lopdf's page numbering, so no index translation happens in this file.

use crate::engine::{PdfAssembly, PdfDocument, PdfEngine, SaveMode, WatermarkSpec};
use crate::error::ToolError;
use crate::options::{RotationAngle, WatermarkAnchor};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Resource names registered on watermarked pages. Prefixed to avoid
/// colliding with names the source document already uses.
const WM_FONT: &str = "wmF1";
const WM_GS: &str = "wmGS1";

/// Margin in points between a corner-anchored watermark and the page edge.
const WM_MARGIN: f32 = 24.0;

/// The shipped object-model engine.
#[derive(Debug, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    fn open(&self, name: &str, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, ToolError> {
        let doc = Document::load_mem(bytes).map_err(|e| ToolError::Engine {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
        if doc.is_encrypted() {
            return Err(ToolError::Engine {
                name: name.to_string(),
                detail: "document is encrypted".to_string(),
            });
        }
        debug!(name, pages = doc.get_pages().len(), "opened document");
        Ok(Box::new(LopdfDocument {
            name: name.to_string(),
            doc,
        }))
    }

    fn new_assembly(&self) -> Box<dyn PdfAssembly> {
        Box::new(LopdfAssembly {
            sources: Vec::new(),
        })
    }
}

struct LopdfDocument {
    name: String,
    doc: Document,
}

impl LopdfDocument {
    fn engine_err(&self, e: impl ToString) -> ToolError {
        ToolError::Engine {
            name: self.name.clone(),
            detail: e.to_string(),
        }
    }

    fn serialize(doc: &mut Document, name: &str) -> Result<Vec<u8>, ToolError> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| ToolError::Engine {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
        Ok(bytes)
    }

    // The returned dictionary keeps `doc` mutably borrowed, so the error
    // path takes the document name separately instead of touching `self`.
    fn page_dict_mut<'a>(
        doc: &'a mut Document,
        page_id: ObjectId,
        name: &str,
    ) -> Result<&'a mut Dictionary, ToolError> {
        doc.get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| ToolError::Engine {
                name: name.to_string(),
                detail: e.to_string(),
            })
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn extract_pages(&self, pages: &[usize]) -> Result<Vec<u8>, ToolError> {
        let mut doc = self.doc.clone();
        let total = doc.get_pages().len() as u32;
        let keep: HashSet<u32> = pages.iter().map(|&p| p as u32).collect();
        // Deleting the complement preserves the kept pages' relative
        // (ascending) order without re-linking anything by hand.
        let delete: Vec<u32> = (1..=total).filter(|n| !keep.contains(n)).collect();
        if !delete.is_empty() {
            doc.delete_pages(&delete);
        }
        doc.prune_objects();
        Self::serialize(&mut doc, &self.name)
    }

    fn remove_pages(&mut self, pages: &[usize]) -> Result<(), ToolError> {
        let delete: Vec<u32> = pages.iter().map(|&p| p as u32).collect();
        self.doc.delete_pages(&delete);
        self.doc.prune_objects();
        Ok(())
    }

    fn rotate_all(&mut self, angle: RotationAngle) -> Result<(), ToolError> {
        let delta = angle.degrees();
        let page_ids: Vec<ObjectId> = self.doc.page_iter().collect();
        for page_id in page_ids {
            let current = current_rotation(&self.doc, page_id);
            let next = (current + delta).rem_euclid(360);
            Self::page_dict_mut(&mut self.doc, page_id, &self.name)?.set("Rotate", next);
        }
        Ok(())
    }

    fn watermark_all(&mut self, spec: &WatermarkSpec) -> Result<(), ToolError> {
        let font_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let gs_id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(spec.opacity),
            "CA" => Object::Real(spec.opacity),
        });

        let page_ids: Vec<ObjectId> = self.doc.page_iter().collect();
        for page_id in page_ids {
            let media_box = media_box(&self.doc, page_id);
            let (x, y) = anchor_position(spec, media_box);
            let stamp = watermark_ops(spec, x, y);

            let mut content = self
                .doc
                .get_page_content(page_id)
                .map_err(|e| self.engine_err(e))?;
            content.extend_from_slice(stamp.as_bytes());

            let stream_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), content));
            Self::page_dict_mut(&mut self.doc, page_id, &self.name)?
                .set("Contents", Object::Reference(stream_id));

            register_watermark_resources(&mut self.doc, page_id, font_id, gs_id)
                .map_err(|e| self.engine_err(e))?;
        }
        Ok(())
    }

    fn save(&mut self, mode: SaveMode) -> Result<Vec<u8>, ToolError> {
        if mode == SaveMode::Compact {
            let pruned = self.doc.prune_objects();
            debug!(name = %self.name, pruned = pruned.len(), "compacting before save");
            self.doc.compress();
        }
        Self::serialize(&mut self.doc, &self.name)
    }
}

/// The page's effective `/Rotate` value, following one level of indirection
/// and treating anything unreadable as 0.
fn current_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    let value = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .and_then(|d| d.get(b"Rotate").cloned());
    match value {
        Ok(Object::Integer(i)) => i,
        Ok(Object::Reference(r)) => doc
            .get_object(r)
            .and_then(Object::as_i64)
            .unwrap_or(0),
        _ => 0,
    }
}

/// The page's media box, walking the `Parent` chain for inherited values.
/// Falls back to US Letter when nothing is declared.
fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let mut current = Some(page_id);
    while let Some(id) = current {
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        let entry = match dict.get(b"MediaBox") {
            Ok(Object::Reference(r)) => doc.get_object(*r).ok(),
            Ok(o) => Some(o),
            Err(_) => None,
        };
        if let Some(values) = entry.and_then(|o| o.as_array().ok()) {
            if values.len() == 4 {
                let mut mb = [0.0f32; 4];
                for (slot, value) in mb.iter_mut().zip(values) {
                    *slot = match value {
                        Object::Integer(i) => *i as f32,
                        Object::Real(r) => *r,
                        _ => return [0.0, 0.0, 612.0, 792.0],
                    };
                }
                return mb;
            }
        }
        current = dict.get(b"Parent").ok().and_then(|o| o.as_reference().ok());
    }
    [0.0, 0.0, 612.0, 792.0]
}

/// Rough width of `text` in points at `font_size` — Helvetica averages
/// about half an em per glyph, close enough for placement.
fn estimated_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

/// Baseline origin for the watermark on a page with the given media box.
fn anchor_position(spec: &WatermarkSpec, media_box: [f32; 4]) -> (f32, f32) {
    let [x0, y0, x1, y1] = media_box;
    let width = x1 - x0;
    let text_width = estimated_text_width(&spec.text, spec.font_size);
    match spec.anchor {
        WatermarkAnchor::Center => (
            x0 + (width - text_width) / 2.0,
            y0 + (y1 - y0) / 2.0,
        ),
        WatermarkAnchor::TopLeft => (x0 + WM_MARGIN, y1 - WM_MARGIN - spec.font_size),
        WatermarkAnchor::TopRight => (
            x1 - WM_MARGIN - text_width,
            y1 - WM_MARGIN - spec.font_size,
        ),
        WatermarkAnchor::BottomLeft => (x0 + WM_MARGIN, y0 + WM_MARGIN),
        WatermarkAnchor::BottomRight => (x1 - WM_MARGIN - text_width, y0 + WM_MARGIN),
    }
}

/// Escape a string for a PDF literal string object.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => out.push(c),
        }
    }
    out
}

/// Content-stream operators drawing the watermark at the given baseline.
fn watermark_ops(spec: &WatermarkSpec, x: f32, y: f32) -> String {
    let rad = spec.tilt_degrees.to_radians();
    let (sin, cos) = rad.sin_cos();
    format!(
        "\nq\n/{WM_GS} gs\n0.5 0.5 0.5 rg\nBT\n/{WM_FONT} {size} Tf\n\
         {cos:.4} {sin:.4} {neg_sin:.4} {cos:.4} {x:.2} {y:.2} Tm\n({text}) Tj\nET\nQ\n",
        size = spec.font_size,
        neg_sin = -sin,
        text = escape_text(&spec.text),
    )
}

/// Make the watermark font and graphics state reachable from a page's
/// resources, preserving whatever the page already declares. Shared
/// resource dictionaries are updated in place; setting the same entries
/// twice is harmless.
fn register_watermark_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gs_id: ObjectId,
) -> Result<(), lopdf::Error> {
    let entry = doc
        .get_object(page_id)
        .and_then(Object::as_dict)?
        .get(b"Resources")
        .ok()
        .cloned();

    match entry {
        Some(Object::Reference(rid)) => {
            let mut resources = doc.get_object(rid).and_then(Object::as_dict)?.clone();
            add_watermark_entries(doc, &mut resources, font_id, gs_id);
            *doc.get_object_mut(rid)? = Object::Dictionary(resources);
        }
        Some(Object::Dictionary(mut resources)) => {
            add_watermark_entries(doc, &mut resources, font_id, gs_id);
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)?
                .set("Resources", Object::Dictionary(resources));
        }
        _ => {
            // No direct resources (possibly inherited): declare our own on
            // the page. Inherited entries stay visible on the parent.
            let mut resources = Dictionary::new();
            add_watermark_entries(doc, &mut resources, font_id, gs_id);
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)?
                .set("Resources", Object::Dictionary(resources));
        }
    }
    Ok(())
}

fn add_watermark_entries(
    doc: &Document,
    resources: &mut Dictionary,
    font_id: ObjectId,
    gs_id: ObjectId,
) {
    let mut fonts = resolved_subdict(doc, resources, b"Font");
    fonts.set(WM_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = resolved_subdict(doc, resources, b"ExtGState");
    states.set(WM_GS, Object::Reference(gs_id));
    resources.set("ExtGState", Object::Dictionary(states));
}

/// Clone a resource sub-dictionary, resolving one level of indirection.
fn resolved_subdict(doc: &Document, resources: &Dictionary, key: &[u8]) -> Dictionary {
    match resources.get(key) {
        Ok(Object::Dictionary(d)) => d.clone(),
        Ok(Object::Reference(r)) => doc
            .get_object(*r)
            .and_then(Object::as_dict)
            .map(Dictionary::clone)
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────

struct LopdfAssembly {
    sources: Vec<Document>,
}

impl PdfAssembly for LopdfAssembly {
    fn append_pdf(&mut self, name: &str, bytes: &[u8]) -> Result<usize, ToolError> {
        let doc = Document::load_mem(bytes).map_err(|e| ToolError::Engine {
            name: name.to_string(),
            detail: e.to_string(),
        })?;
        if doc.is_encrypted() {
            return Err(ToolError::Engine {
                name: name.to_string(),
                detail: "document is encrypted".to_string(),
            });
        }
        let pages = doc.get_pages().len();
        self.sources.push(doc);
        Ok(pages)
    }

    fn append_image(&mut self, name: &str, bytes: &[u8]) -> Result<(), ToolError> {
        let doc = image_page_document(name, bytes)?;
        self.sources.push(doc);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, ToolError> {
        if self.sources.is_empty() {
            return Err(ToolError::NoInput);
        }
        let mut merged = merge_documents(self.sources)?;
        let mut bytes = Vec::new();
        merged.save_to(&mut bytes).map_err(|e| ToolError::Engine {
            name: "assembly".to_string(),
            detail: e.to_string(),
        })?;
        Ok(bytes)
    }
}

/// The `/Type` name of an object's dictionary, if any.
fn object_type(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|d| d.get(b"Type").ok())
        .and_then(|t| t.as_name().ok())
}

/// Concatenate documents page-wise, in order.
///
/// Each source is renumbered into a disjoint id range, then all pages are
/// re-parented under a single `Pages` node whose `Kids` follow the
/// renumbered (and therefore staged) order. Outlines are dropped; nothing
/// else is touched.
fn merge_documents(sources: Vec<Document>) -> Result<Document, ToolError> {
    let assembly_err = |detail: &str| ToolError::Engine {
        name: "assembly".to_string(),
        detail: detail.to_string(),
    };

    let mut max_id = 1u32;
    let mut document_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut document_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in sources {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;
        for (_, page_id) in doc.get_pages() {
            let page = doc
                .get_object(page_id)
                .map_err(|e| assembly_err(&e.to_string()))?
                .to_owned();
            document_pages.insert(page_id, page);
        }
        document_objects.extend(doc.objects);
    }

    let mut merged = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in document_objects {
        let kind = object_type(&object).map(<[u8]>::to_vec);
        match kind.as_deref() {
            Some(b"Catalog") => {
                let id = catalog.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                catalog = Some((id, object));
            }
            Some(b"Pages") => {
                if let Ok(dict) = object.as_dict() {
                    let mut dict = dict.clone();
                    if let Some((_, previous)) = &pages_root {
                        for (key, value) in previous.iter() {
                            if !dict.has(key) {
                                dict.set(key.clone(), value.clone());
                            }
                        }
                    }
                    let id = pages_root.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                    pages_root = Some((id, dict));
                }
            }
            // Pages are re-inserted with a fixed parent below; outlines
            // would dangle across documents.
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, mut pages_dict) =
        pages_root.ok_or_else(|| assembly_err("no Pages root found in any source"))?;
    let (catalog_id, catalog_object) =
        catalog.ok_or_else(|| assembly_err("no Catalog found in any source"))?;

    for (object_id, object) in &document_pages {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", Object::Reference(pages_id));
            merged.objects.insert(*object_id, Object::Dictionary(dict));
        } else {
            warn!(?object_id, "skipping non-dictionary page object");
        }
    }

    pages_dict.set("Count", document_pages.len() as i64);
    pages_dict.set(
        "Kids",
        document_pages
            .keys()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<Object>>(),
    );
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let mut catalog_dict = catalog_object
        .as_dict()
        .map_err(|e| assembly_err(&e.to_string()))?
        .clone();
    catalog_dict.set("Pages", Object::Reference(pages_id));
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = max_id;
    merged.renumber_objects();
    Ok(merged)
}

/// Build a single-page document containing one image, the page sized
/// exactly to the image's pixel dimensions.
fn image_page_document(name: &str, bytes: &[u8]) -> Result<Document, ToolError> {
    let image_err = |detail: String| ToolError::Image {
        name: name.to_string(),
        detail,
    };

    let img = image::load_from_memory(bytes).map_err(|e| image_err(e.to_string()))?;
    let width = img.width() as i64;
    let height = img.height() as i64;

    let is_jpeg = matches!(
        image::guess_format(bytes),
        Ok(image::ImageFormat::Jpeg)
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    // JPEG bytes pass straight through as a DCTDecode stream; anything else
    // is flattened to raw 8-bit RGB.
    let xobject = if is_jpeg {
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
                "Filter" => "DCTDecode",
            },
            bytes.to_vec(),
        )
    } else {
        let rgb = img.to_rgb8();
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
            },
            rgb.into_raw(),
        )
    };
    let xobject_id = doc.add_object(xobject);

    let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ");
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => Object::Reference(xobject_id) },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_handles_pdf_delimiters() {
        assert_eq!(escape_text("plain"), "plain");
        assert_eq!(escape_text("a(b)c"), "a\\(b\\)c");
        assert_eq!(escape_text("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn anchor_positions_stay_inside_the_page() {
        let spec = WatermarkSpec {
            text: "DRAFT".into(),
            anchor: WatermarkAnchor::Center,
            opacity: 0.5,
            font_size: 50.0,
            tilt_degrees: 45.0,
        };
        let mb = [0.0, 0.0, 612.0, 792.0];
        for anchor in [
            WatermarkAnchor::Center,
            WatermarkAnchor::TopLeft,
            WatermarkAnchor::TopRight,
            WatermarkAnchor::BottomLeft,
            WatermarkAnchor::BottomRight,
        ] {
            let spec = WatermarkSpec {
                anchor,
                ..spec.clone()
            };
            let (x, y) = anchor_position(&spec, mb);
            assert!(x >= 0.0 && x <= 612.0, "{anchor:?}: x={x}");
            assert!(y >= 0.0 && y <= 792.0, "{anchor:?}: y={y}");
        }
    }

    #[test]
    fn corner_anchors_respect_the_margin() {
        let spec = WatermarkSpec {
            text: "x".into(),
            anchor: WatermarkAnchor::BottomLeft,
            opacity: 1.0,
            font_size: 10.0,
            tilt_degrees: 0.0,
        };
        let (x, y) = anchor_position(&spec, [0.0, 0.0, 100.0, 100.0]);
        assert_eq!((x, y), (WM_MARGIN, WM_MARGIN));
    }

    #[test]
    fn watermark_ops_reference_registered_resources() {
        let spec = WatermarkSpec {
            text: "DRAFT".into(),
            anchor: WatermarkAnchor::Center,
            opacity: 0.5,
            font_size: 50.0,
            tilt_degrees: 0.0,
        };
        let ops = watermark_ops(&spec, 10.0, 20.0);
        assert!(ops.contains(&format!("/{WM_FONT} 50 Tf")));
        assert!(ops.contains(&format!("/{WM_GS} gs")));
        assert!(ops.contains("(DRAFT) Tj"));
        // Untilted text matrix is the identity rotation.
        assert!(ops.contains("1.0000 0.0000"), "got: {ops}");
    }
}
