use crate::{errors::DetectionFailure, types::Detection};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use std::path::Path;

pub const OUTLINE_COLOR: Rgba<u8> = Rgba([0, 200, 0, 255]);
pub const FILL_COLOR: Rgba<u8> = Rgba([0, 200, 0, 40]);
pub const OUTLINE_WIDTH: u32 = 4;

/// Draw every detection onto an RGBA copy of `source`.
///
/// Each box gets a translucent fill and an outline `OUTLINE_WIDTH` pixels wide,
/// growing inward from the box edge. Boxes are clamped to the image.
pub fn render_overlay(source: &RgbaImage, detections: &[Detection]) -> RgbaImage {
    let mut canvas = source.clone();
    let (width, height) = canvas.dimensions();

    for detection in detections {
        let [x1, y1, x2, y2] = detection.bbox;
        let x1 = x1.min(width);
        let y1 = y1.min(height);
        let x2 = x2.min(width);
        let y2 = y2.min(height);

        if x2 <= x1 || y2 <= y1 {
            tracing::trace!(bbox = ?detection.bbox, "Skipping degenerate box");
            continue;
        }

        fill_rect(&mut canvas, x1, y1, x2, y2, FILL_COLOR);

        for inset in 0..OUTLINE_WIDTH {
            let w = (x2 - x1).saturating_sub(2 * inset);
            let h = (y2 - y1).saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((x1 + inset) as i32, (y1 + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, OUTLINE_COLOR);
        }
    }

    canvas
}

fn fill_rect(canvas: &mut RgbaImage, x1: u32, y1: u32, x2: u32, y2: u32, color: Rgba<u8>) {
    for y in y1..y2 {
        for x in x1..x2 {
            canvas.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// Write the overlay as PNG, creating the parent directory if needed.
pub fn save_overlay(overlay: &RgbaImage, path: &Path) -> Result<(), DetectionFailure> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    overlay
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| DetectionFailure::Overlay(format!("{}: {}", path.display(), e)))
}
