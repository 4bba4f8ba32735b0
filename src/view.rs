use image::RgbaImage;
use rayon::prelude::*;

use crate::canvas::{Color, PixelSurface, Point};
use crate::error::{CanvasError, CanvasResult};

/// Zoom between screen space (origin at the canvas's top-left corner on
/// screen) and canvas pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { zoom: 1.0 }
    }
}

impl ViewTransform {
    pub fn new(zoom: f32) -> CanvasResult<Self> {
        let mut view = Self::default();
        view.set_zoom(zoom)?;
        Ok(view)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Any finite, strictly positive factor.
    pub fn set_zoom(&mut self, zoom: f32) -> CanvasResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CanvasError::InvalidZoom(zoom));
        }
        self.zoom = zoom;
        Ok(())
    }

    /// Sub-pixel canvas position under a screen position.
    pub fn screen_to_canvas(&self, sx: f32, sy: f32) -> Point {
        Point::new(sx / self.zoom, sy / self.zoom)
    }

    pub fn canvas_to_screen(&self, p: Point) -> (f32, f32) {
        (p.x * self.zoom, p.y * self.zoom)
    }

    /// Canvas pixel under a screen position, if it lies on a `width`×`height`
    /// canvas.
    pub fn screen_to_pixel(&self, sx: f32, sy: f32, width: u32, height: u32) -> Option<(u32, u32)> {
        let (px, py) = self.screen_to_canvas(sx, sy).pixel();
        if px >= 0 && py >= 0 && px < width as i64 && py < height as i64 {
            Some((px as u32, py as u32))
        } else {
            None
        }
    }

    /// On-screen size of a `width`×`height` canvas, never smaller than 1×1.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f32 * self.zoom).ceil().max(1.0) as u32;
        let h = (height as f32 * self.zoom).ceil().max(1.0) as u32;
        (w, h)
    }

    /// Nearest-neighbor sample `surface` into `target`. Target pixels whose
    /// centers map outside the surface are cleared to transparent.
    pub fn render_to(&self, surface: &PixelSurface, target: &mut RgbaImage) {
        let (tw, th) = target.dimensions();
        if tw == 0 || th == 0 {
            return;
        }
        let (sw, sh) = surface.dimensions();
        let src = surface.as_image().as_raw();
        let src_stride = sw as usize * 4;
        let zoom = self.zoom;
        let row_bytes = tw as usize * 4;
        let outside = Color::TRANSPARENT.to_rgba8().0;
        let dst: &mut [u8] = target;

        dst.par_chunks_mut(row_bytes).enumerate().for_each(|(ty, row)| {
            let sy = ((ty as f32 + 0.5) / zoom).floor() as i64;
            for tx in 0..tw as usize {
                let out = &mut row[tx * 4..tx * 4 + 4];
                let sx = ((tx as f32 + 0.5) / zoom).floor() as i64;
                if sx < 0 || sy < 0 || sx >= sw as i64 || sy >= sh as i64 {
                    out.copy_from_slice(&outside);
                    continue;
                }
                let i = sy as usize * src_stride + sx as usize * 4;
                out.copy_from_slice(&src[i..i + 4]);
            }
        });
    }

    pub fn render(&self, surface: &PixelSurface) -> RgbaImage {
        let (w, h) = self.scaled_size(surface.width(), surface.height());
        let mut target = RgbaImage::new(w, h);
        self.render_to(surface, &mut target);
        target
    }
}
