/// Render overlay rectangles onto an RGBA canvas.
///
/// Each rectangle is scaled by the canvas size (`origin * size`,
/// `extent * size`), so a canvas the same size as the preview surface shows
/// exactly what the UI overlay draws.
use crate::errors::{OverlayError, OverlayResult};
use crate::perception::types::{NormalizedDisplayRect, SurfaceBounds};

/// Default overlay colour: translucent green.
pub const OVERLAY_COLOUR: [u8; 4] = [40, 220, 90, 230];

/// Largest RGBA canvas `render_overlay_png` will allocate, in bytes.
pub const MAX_CANVAS_BYTES: u64 = 256 * 1024 * 1024;

/// Draw every rect in `rects` as an outline of `thickness` pixels.
/// Parts outside the canvas are clipped; rects with no pixel area are skipped.
pub fn draw_overlay(
    canvas: &mut image::RgbaImage,
    rects: &[NormalizedDisplayRect],
    colour: [u8; 4],
    thickness: u32,
) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let (fw, fh) = (w as f64, h as f64);

    for rect in rects {
        let x1 = (rect.origin_x * fw).round() as i64;
        let y1 = (rect.origin_y * fh).round() as i64;
        let x2 = ((rect.origin_x + rect.width) * fw).round() as i64 - 1;
        let y2 = ((rect.origin_y + rect.height) * fh).round() as i64 - 1;
        if x2 < x1 || y2 < y1 {
            continue;
        }
        draw_rect(canvas, [x1, y1, x2, y2], colour, thickness as i64);
    }
}

/// Render `rects` onto a transparent canvas sized to `bounds` and encode PNG.
pub fn render_overlay_png(
    bounds: SurfaceBounds,
    rects: &[NormalizedDisplayRect],
) -> OverlayResult<Vec<u8>> {
    if bounds.is_degenerate() {
        return Err(OverlayError::Render(format!(
            "cannot render onto {}x{} surface",
            bounds.width, bounds.height
        )));
    }
    let (w, h) = canvas_size(bounds)?;
    let mut canvas = image::RgbaImage::new(w, h);

    // Thicker outlines on large surfaces so they stay visible when scaled down.
    let thickness = if w > 1600 { 3 } else { 2 };
    draw_overlay(&mut canvas, rects, OVERLAY_COLOUR, thickness);

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(canvas)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .map_err(|e| OverlayError::Render(format!("PNG encode: {e}")))?;
    Ok(out)
}

/// Pixel size for a surface, refusing anything that would not fit in
/// [`MAX_CANVAS_BYTES`].
fn canvas_size(bounds: SurfaceBounds) -> OverlayResult<(u32, u32)> {
    let too_large = || {
        OverlayError::Render(format!(
            "surface {}x{} exceeds the {MAX_CANVAS_BYTES}-byte canvas limit",
            bounds.width, bounds.height
        ))
    };
    let (fw, fh) = (bounds.width.round().max(1.0), bounds.height.round().max(1.0));
    if !fw.is_finite() || !fh.is_finite() || fw > u32::MAX as f64 || fh > u32::MAX as f64 {
        return Err(too_large());
    }
    let (w, h) = (fw as u32, fh as u32);
    let bytes = (w as u64)
        .checked_mul(h as u64)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(too_large)?;
    if bytes > MAX_CANVAS_BYTES {
        return Err(too_large());
    }
    Ok((w, h))
}

fn draw_rect(canvas: &mut image::RgbaImage, bbox: [i64; 4], col: [u8; 4], thickness: i64) {
    let (w, h) = canvas.dimensions();
    let (iw, ih) = (w as i64, h as i64);
    let [x1, y1, x2, y2] = bbox;

    // Clamp iteration ranges; the edges themselves are checked per pixel.
    let xs = x1.max(0)..=x2.min(iw - 1);
    let ys = y1.max(0)..=y2.min(ih - 1);

    for t in 0..thickness {
        let (ty, by) = (y1 + t, y2 - t);
        for x in xs.clone() {
            if (0..ih).contains(&ty) {
                put(canvas, x, ty, col);
            }
            if (0..ih).contains(&by) {
                put(canvas, x, by, col);
            }
        }
        let (lx, rx) = (x1 + t, x2 - t);
        for y in ys.clone() {
            if (0..iw).contains(&lx) {
                put(canvas, lx, y, col);
            }
            if (0..iw).contains(&rx) {
                put(canvas, rx, y, col);
            }
        }
    }
}

#[inline]
fn put(canvas: &mut image::RgbaImage, x: i64, y: i64, col: [u8; 4]) {
    canvas.put_pixel(x as u32, y as u32, image::Rgba(col));
}
