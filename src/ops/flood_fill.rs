use std::collections::VecDeque;

use tracing::debug;

use crate::canvas::{Color, DirtyRect, PixelSurface};

/// Result of a bucket fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// Pixels recolored.
    pub filled: usize,
    /// Pixels taken off the work queue, painted or not. Never exceeds W×H.
    pub examined: usize,
    /// Bounding box of the recolored pixels.
    pub bounds: Option<DirtyRect>,
}

/// Replace the 4-connected region around `(x, y)` whose color ≈ the seed's
/// color with `fill`.
///
/// A seed outside the surface, or a seed that already holds the fill color,
/// is a no-op. The traversal is breadth-first over an explicit queue with a
/// visited mask, so each pixel is queued at most once.
pub fn flood_fill(surface: &mut PixelSurface, x: i64, y: i64, fill: Color) -> FillOutcome {
    if !surface.contains(x, y) {
        debug!(x, y, "fill seed outside surface");
        return FillOutcome::default();
    }

    let (width, height) = surface.dimensions();
    let start = (x as u32, y as u32);
    let target = Color::from_rgba8(surface.pixel(start.0, start.1));
    if target.approx_eq(&fill) {
        debug!(x, y, "fill color already present");
        return FillOutcome::default();
    }

    let fill_px = fill.to_rgba8();
    let w = width as usize;
    let mut visited = vec![false; w * height as usize];
    let mut queue = VecDeque::new();
    queue.push_back(start);
    visited[start.1 as usize * w + start.0 as usize] = true;

    let mut outcome = FillOutcome::default();
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0u32, 0u32);

    while let Some((px, py)) = queue.pop_front() {
        outcome.examined += 1;
        if !Color::from_rgba8(surface.pixel(px, py)).approx_eq(&target) {
            continue;
        }

        surface.put_pixel(px, py, fill_px);
        outcome.filled += 1;
        min_x = min_x.min(px);
        min_y = min_y.min(py);
        max_x = max_x.max(px);
        max_y = max_y.max(py);

        // Up, down, left, right; never diagonals
        let neighbors = [
            (px.checked_sub(1), Some(py)),
            ((px + 1 < width).then_some(px + 1), Some(py)),
            (Some(px), py.checked_sub(1)),
            (Some(px), (py + 1 < height).then_some(py + 1)),
        ];
        for (nx, ny) in neighbors {
            let (Some(nx), Some(ny)) = (nx, ny) else {
                continue;
            };
            let vi = ny as usize * w + nx as usize;
            if visited[vi] {
                continue;
            }
            visited[vi] = true;
            queue.push_back((nx, ny));
        }
    }

    if outcome.filled > 0 {
        outcome.bounds = Some(DirtyRect::from_bounds(min_x, min_y, max_x, max_y));
    }
    debug!(filled = outcome.filled, examined = outcome.examined, "flood fill done");
    outcome
}
