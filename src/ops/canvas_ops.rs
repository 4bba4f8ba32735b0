// ============================================================================
// CANVAS-LEVEL OPERATIONS: resize / clear / load
// ============================================================================

use std::path::Path;

use image::RgbaImage;
use tracing::info;

use crate::canvas::{PixelSurface, Repaint};
use crate::error::CanvasResult;
use crate::io;

/// Replace the surface with a `width`×`height` one that keeps the top-left
/// overlap of the old content. Newly exposed area is white.
///
/// On error the surface is left exactly as it was.
pub fn resize(surface: &mut PixelSurface, width: u32, height: u32) -> CanvasResult<Repaint> {
    let (old_w, old_h) = surface.dimensions();
    let next = surface.resized(width, height)?;
    *surface = next;
    info!(old_w, old_h, width, height, "canvas resized");
    Ok(Repaint::Whole)
}

/// Replace the surface with a fresh white one at `default_size`, whatever
/// size the canvas had before.
pub fn clear(surface: &mut PixelSurface, default_size: (u32, u32)) -> CanvasResult<Repaint> {
    let (width, height) = default_size;
    *surface = PixelSurface::new(width, height)?;
    info!(width, height, "canvas cleared");
    Ok(Repaint::Whole)
}

/// Composite a decoded bitmap at the origin. The canvas keeps its size: a
/// larger image is clipped, a smaller one leaves the rest untouched.
pub fn composite_image(surface: &mut PixelSurface, img: &RgbaImage) -> Repaint {
    let covered = surface.composite_at_origin(img);
    info!(
        image_w = img.width(),
        image_h = img.height(),
        covered = ?covered,
        "image composited"
    );
    Repaint::Whole
}

/// Decode `bytes` and composite them at the origin. Decoding happens before
/// the surface is touched, so a bad bitmap changes nothing.
pub fn load_image_bytes(surface: &mut PixelSurface, bytes: &[u8]) -> CanvasResult<Repaint> {
    let img = io::decode_image(bytes)?;
    Ok(composite_image(surface, &img))
}

pub fn load_image_path(surface: &mut PixelSurface, path: &Path) -> CanvasResult<Repaint> {
    let img = io::read_image(path)?;
    Ok(composite_image(surface, &img))
}
