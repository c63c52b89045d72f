use image::codecs::jpeg::JpegEncoder;
use lopdf::{
    Dictionary, Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MM: f64 = 72.0 / 25.4;

const MARGIN: f64 = 20.0 * MM;
const IMAGE_BOTTOM: f64 = 40.0 * MM;
const IMAGE_MAX_WIDTH: f64 = 170.0 * MM;
const IMAGE_MAX_HEIGHT: f64 = 120.0 * MM;

const SNIPPET_CHARS: usize = 2000;
const SNIPPET_LINE_CHARS: usize = 110;
const SNIPPET_LEADING: f64 = 9.0;
const JPEG_QUALITY: u8 = 85;

pub const REPORT_TITLE: &str = "AgriVision Analysis Report";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

struct EmbeddedImage {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

/// Render a single-page A4 report for an analysis result.
///
/// The overlay is embedded when it can be read, otherwise the page carries
/// text only.
pub fn render_report(result: &Value, overlay_path: Option<&Path>) -> Result<Vec<u8>, ReportError> {
    let image = overlay_path.and_then(load_overlay);

    let mode = result.get("mode").and_then(Value::as_str).unwrap_or("n/a");
    let objects = result
        .get("detections")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    let snippet = json_snippet(result)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut resources = dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    };

    let mut operations = Vec::new();

    let mut y = PAGE_HEIGHT - 25.0 * MM;
    text_line(&mut operations, "F2", 18, MARGIN, y, REPORT_TITLE);

    y = PAGE_HEIGHT - 35.0 * MM;
    text_line(&mut operations, "F1", 11, MARGIN, y, &format!("Mode: {}", mode));
    y -= 6.0 * MM;
    text_line(&mut operations, "F1", 11, MARGIN, y, &format!("Objects: {}", objects));
    y -= 8.0 * MM;

    let text_floor = if image.is_some() {
        IMAGE_BOTTOM + IMAGE_MAX_HEIGHT + 4.0 * MM
    } else {
        MARGIN
    };
    for line in snippet.lines() {
        if y < text_floor {
            break;
        }
        text_line(&mut operations, "F1", 8, MARGIN, y, line);
        y -= SNIPPET_LEADING;
    }

    if let Some(image) = image {
        let scale = (IMAGE_MAX_WIDTH / image.width as f64).min(IMAGE_MAX_HEIGHT / image.height as f64);
        let draw_width = image.width as f64 * scale;
        let draw_height = image.height as f64 * scale;
        let x = (PAGE_WIDTH - draw_width) / 2.0;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.jpeg,
        ));
        resources.set("XObject", dictionary! { "Im1" => image_id });

        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![
                real(draw_width),
                0.into(),
                0.into(),
                real(draw_height),
                real(x),
                real(IMAGE_BOTTOM),
            ],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]));
        operations.push(Operation::new("Q", vec![]));
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
    let resources_id = doc.add_object(resources);

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

fn text_line(operations: &mut Vec<Operation>, font: &str, size: i64, x: f64, y: f64, text: &str) {
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), size.into()],
    ));
    operations.push(Operation::new("Td", vec![real(x), real(y)]));
    operations.push(Operation::new(
        "Tj",
        vec![Object::string_literal(pdf_text(text))],
    ));
    operations.push(Operation::new("ET", vec![]));
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Standard Type1 fonts only cover ASCII reliably.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

/// Pretty-printed JSON cut to `SNIPPET_CHARS`, with long rows wrapped.
fn json_snippet(result: &Value) -> Result<String, serde_json::Error> {
    let pretty = serde_json::to_string_pretty(result)?;
    let truncated: String = pretty.chars().take(SNIPPET_CHARS).collect();

    let mut out = String::with_capacity(truncated.len());
    for line in truncated.lines() {
        let chars: Vec<char> = line.chars().collect();
        for chunk in chars.chunks(SNIPPET_LINE_CHARS) {
            out.extend(chunk);
            out.push('\n');
        }
    }
    Ok(out)
}

fn load_overlay(path: &Path) -> Option<EmbeddedImage> {
    let decoded = match image::open(path) {
        Ok(image) => image.to_rgb8(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Overlay unreadable, text-only report");
            return None;
        }
    };

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let mut jpeg = Vec::new();
    if let Err(e) = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&decoded) {
        tracing::warn!(error = %e, "Overlay re-encoding failed, text-only report");
        return None;
    }

    Some(EmbeddedImage {
        jpeg,
        width,
        height,
    })
}
