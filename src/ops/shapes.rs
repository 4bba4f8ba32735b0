use rayon::prelude::*;
use tracing::debug;

use crate::canvas::{Color, DirtyRect, PixelSurface, Point};

/// Apex height of the stamped triangle above the click point.
pub const TRIANGLE_RISE: f32 = 60.0;
/// Horizontal reach of each base corner from the click point.
pub const TRIANGLE_REACH: f32 = 60.0;
/// Depth of the base below the click point.
pub const TRIANGLE_DROP: f32 = 30.0;

/// Outline primitives drawn by the shape tools.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Line { from: Point, to: Point },
    /// Axis-aligned, `min` is the top-left corner.
    Rectangle { min: Point, max: Point },
    Circle { center: Point, radius: f32 },
    Triangle { apex: Point, right: Point, left: Point },
}

impl Shape {
    pub fn line(from: Point, to: Point) -> Self {
        Shape::Line { from, to }
    }

    /// Rectangle spanned by two opposite corners in any order.
    pub fn rectangle(a: Point, b: Point) -> Self {
        Shape::Rectangle {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Circle centered at `center` passing through `rim`.
    pub fn circle_through(center: Point, rim: Point) -> Self {
        Shape::Circle {
            center,
            radius: center.distance(rim),
        }
    }

    /// Fixed-size triangle around a click point.
    pub fn triangle_at(at: Point) -> Self {
        Shape::Triangle {
            apex: Point::new(at.x, at.y - TRIANGLE_RISE),
            right: Point::new(at.x + TRIANGLE_REACH, at.y + TRIANGLE_DROP),
            left: Point::new(at.x - TRIANGLE_REACH, at.y + TRIANGLE_DROP),
        }
    }

    /// Geometric bounds as (min_x, min_y, max_x, max_y).
    fn bounds(&self) -> (f32, f32, f32, f32) {
        match *self {
            Shape::Line { from, to } => (from.x.min(to.x), from.y.min(to.y), from.x.max(to.x), from.y.max(to.y)),
            Shape::Rectangle { min, max } => (min.x, min.y, max.x, max.y),
            Shape::Circle { center, radius } => (
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            Shape::Triangle { apex, right, left } => (
                apex.x.min(right.x).min(left.x),
                apex.y.min(right.y).min(left.y),
                apex.x.max(right.x).max(left.x),
                apex.y.max(right.y).max(left.y),
            ),
        }
    }

    /// Unsigned distance from `(px, py)` to the outline.
    fn outline_distance(&self, px: f32, py: f32) -> f32 {
        match *self {
            Shape::Line { from, to } => dist_segment(px, py, from, to),
            Shape::Rectangle { min, max } => {
                let cx = (min.x + max.x) * 0.5;
                let cy = (min.y + max.y) * 0.5;
                let hx = (max.x - min.x) * 0.5;
                let hy = (max.y - min.y) * 0.5;
                sdf_box(px - cx, py - cy, hx, hy).abs()
            }
            Shape::Circle { center, radius } => {
                let dx = px - center.x;
                let dy = py - center.y;
                ((dx * dx + dy * dy).sqrt() - radius).abs()
            }
            Shape::Triangle { apex, right, left } => dist_segment(px, py, apex, right)
                .min(dist_segment(px, py, right, left))
                .min(dist_segment(px, py, left, apex)),
        }
    }
}

/// SDF for an axis-aligned box centered at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

/// Distance to segment a→b; a zero-length segment is a point.
#[inline]
fn dist_segment(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let (ex, ey) = (b.x - a.x, b.y - a.y);
    let (wx, wy) = (px - a.x, py - a.y);
    let len2 = ex * ex + ey * ey;
    let t = if len2 > 1e-12 {
        ((wx * ex + wy * ey) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let dx = wx - ex * t;
    let dy = wy - ey * t;
    (dx * dx + dy * dy).sqrt()
}

/// Stroke the outline of `shape` with a band `weight` pixels wide.
///
/// Even weights sample pixel centers and odd weights sample pixel corners,
/// so an outline on integer coordinates covers exactly `weight` rows (or
/// columns): the odd band is centered on the pixel the coordinate names.
/// A pixel is painted when its sample lies strictly within `weight / 2` of
/// the outline. Colors are written as-is, no blending or anti-aliasing.
/// Returns the clipped region that was scanned, or `None` when the shape
/// misses the surface entirely.
pub fn stroke_shape(surface: &mut PixelSurface, shape: &Shape, color: Color, weight: u32) -> Option<DirtyRect> {
    let half = weight as f32 * 0.5;
    let sample = if weight % 2 == 1 { 0.0 } else { 0.5 };
    let (min_x, min_y, max_x, max_y) = shape.bounds();
    if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
        return None;
    }

    let x0 = (min_x - half).floor() as i64 - 1;
    let y0 = (min_y - half).floor() as i64 - 1;
    let x1 = (max_x + half).ceil() as i64 + 1;
    let y1 = (max_y + half).ceil() as i64 + 1;
    let (sw, sh) = surface.dimensions();
    let rect = DirtyRect::clipped(x0, y0, x1 - x0, y1 - y0, sw, sh)?;

    let rgba = color.to_rgba8().0;
    let row_bytes = sw as usize * 4;
    let first = rect.y as usize * row_bytes;
    let last = (rect.y + rect.height) as usize * row_bytes;
    let buf: &mut [u8] = surface.image_mut();

    buf[first..last]
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(row, row_buf)| {
            let py = (rect.y as usize + row) as f32 + sample;
            for col in rect.x..rect.x + rect.width {
                let px = col as f32 + sample;
                if shape.outline_distance(px, py) < half {
                    let i = col as usize * 4;
                    row_buf[i..i + 4].copy_from_slice(&rgba);
                }
            }
        });

    debug!(?shape, weight, "stroked shape");
    Some(rect)
}

/// Solid `size`×`size` square with its top-left at
/// `(⌊x⌋ − size/2, ⌊y⌋ − size/2)`.
pub fn stamp_square(surface: &mut PixelSurface, at: Point, size: u32, color: Color) -> Option<DirtyRect> {
    let (fx, fy) = at.pixel();
    let off = (size / 2) as i64;
    surface.fill_rect(fx - off, fy - off, size, size, color)
}

/// Stamp squares every pixel along `from`→`to`, both ends included.
pub fn stamp_segment(surface: &mut PixelSurface, from: Point, to: Point, size: u32, color: Color) -> Option<DirtyRect> {
    let dist = from.distance(to);
    let steps = dist.ceil().max(1.0) as u32;
    let mut dirty: Option<DirtyRect> = None;
    for i in 0..=steps {
        let p = Point::new(
            from.x + (to.x - from.x) * i as f32 / steps as f32,
            from.y + (to.y - from.y) * i as f32 / steps as f32,
        );
        if let Some(r) = stamp_square(surface, p, size, color) {
            dirty = Some(match dirty {
                Some(d) => d.union(r),
                None => r,
            });
        }
    }
    dirty
}
