use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::{debug, info, warn};

use crate::components::tools::{GestureState, StrokeStyle, Tool, ToolEngine};
use crate::error::{CanvasError, CanvasResult};
use crate::ops::canvas_ops;
use crate::settings::EngineSettings;
use crate::view::ViewTransform;

/// Default canvas size, restored by every clear.
pub const DEFAULT_WIDTH: u32 = 1152;
pub const DEFAULT_HEIGHT: u32 = 648;

/// Per-channel tolerance for color equality.
pub const COLOR_EPSILON: f32 = 0.01;

// ============================================================================
// COLOR
// ============================================================================

/// Straight (non-premultiplied) RGBA color, each channel in `[0, 1]`.
///
/// Equality is approximate: two colors are equal when every channel differs
/// by less than [`COLOR_EPSILON`]. The bucket tool relies on this, so
/// anti-aliased edges of a slightly different shade are treated as part of
/// the region being filled.
#[derive(Clone, Copy, Debug)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same color with full alpha.
    pub const fn opaque(self) -> Self {
        Self::new(self.r, self.g, self.b, 1.0)
    }

    /// Every channel limited to `[0, 1]`; NaN becomes 0.
    pub fn clamped(self) -> Self {
        #[inline]
        fn unit(v: f32) -> f32 {
            if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
        }
        Self::new(unit(self.r), unit(self.g), unit(self.b), unit(self.a))
    }

    pub fn from_rgba8(px: Rgba<u8>) -> Self {
        Self::new(
            px[0] as f32 / 255.0,
            px[1] as f32 / 255.0,
            px[2] as f32 / 255.0,
            px[3] as f32 / 255.0,
        )
    }

    pub fn to_rgba8(self) -> Rgba<u8> {
        #[inline]
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Rgba([channel(self.r), channel(self.g), channel(self.b), channel(self.a)])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// ε-equality on all four channels.
    pub fn approx_eq(&self, other: &Color) -> bool {
        (self.r - other.r).abs() < COLOR_EPSILON
            && (self.g - other.g).abs() < COLOR_EPSILON
            && (self.b - other.b).abs() < COLOR_EPSILON
            && (self.a - other.a).abs() < COLOR_EPSILON
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other)
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// A position in canvas pixel space. Sub-pixel precision is kept until a
/// tool rasterizes it.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Integer pixel containing this point (may lie outside the surface).
    pub fn pixel(self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

/// Axis-aligned pixel rectangle, always inside the surface it was made for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    /// Build from inclusive pixel bounds.
    pub fn from_bounds(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        }
    }

    /// Intersect an arbitrary signed rectangle with a `surface_w`×`surface_h`
    /// surface. Returns `None` when nothing is left.
    pub fn clipped(x: i64, y: i64, width: i64, height: i64, surface_w: u32, surface_h: u32) -> Option<Self> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(surface_w as i64);
        let y1 = (y + height).min(surface_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        DirtyRect { x: x0, y: y0, width: x1 - x0, height: y1 - y0 }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// What the UI has to redraw after a mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repaint {
    Region(DirtyRect),
    /// Fill, resize, clear and load: extent is not known up front.
    Whole,
}

impl Repaint {
    /// Merge two pending requests so no update is ever lost.
    pub fn merge(self, other: Repaint) -> Repaint {
        match (self, other) {
            (Repaint::Region(a), Repaint::Region(b)) => Repaint::Region(a.union(b)),
            _ => Repaint::Whole,
        }
    }
}

// ============================================================================
// PIXEL SURFACE
// ============================================================================

/// Owned RGBA8 pixel buffer. Every public accessor is bounds-checked; the
/// raw buffer never leaves the crate mutably.
#[derive(Clone, Debug)]
pub struct PixelSurface {
    image: RgbaImage,
}

impl PixelSurface {
    /// Opaque white surface.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        Self::filled(width, height, Color::WHITE)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::dimensions(width, height));
        }
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, color.to_rgba8()),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }

    pub fn get(&self, x: u32, y: u32) -> CanvasResult<Color> {
        self.check(x as i64, y as i64)?;
        Ok(Color::from_rgba8(*self.image.get_pixel(x, y)))
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) -> CanvasResult<()> {
        self.check(x as i64, y as i64)?;
        self.image.put_pixel(x, y, color.to_rgba8());
        Ok(())
    }

    fn check(&self, x: i64, y: i64) -> CanvasResult<()> {
        if self.contains(x, y) {
            Ok(())
        } else {
            Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            })
        }
    }

    /// Raw read. Callers have already bounds-checked.
    #[inline]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    /// Raw write. Callers have already bounds-checked.
    #[inline]
    pub(crate) fn put_pixel(&mut self, x: u32, y: u32, px: Rgba<u8>) {
        self.image.put_pixel(x, y, px);
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Solid fill of a signed rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Color) -> Option<DirtyRect> {
        let rect = DirtyRect::clipped(x, y, width as i64, height as i64, self.width(), self.height())?;
        let px = color.to_rgba8();
        for yy in rect.y..rect.y + rect.height {
            for xx in rect.x..rect.x + rect.width {
                self.image.put_pixel(xx, yy, px);
            }
        }
        Some(rect)
    }

    /// New white surface of the given size holding this surface's top-left
    /// overlap. Content beyond the new bounds is dropped.
    pub fn resized(&self, width: u32, height: u32) -> CanvasResult<Self> {
        let mut next = Self::new(width, height)?;
        let copy_w = self.width().min(width) as usize * 4;
        let copy_h = self.height().min(height) as usize;
        let src_stride = self.width() as usize * 4;
        let dst_stride = width as usize * 4;
        let src = self.image.as_raw();
        let dst: &mut [u8] = &mut next.image;
        for row in 0..copy_h {
            let s = row * src_stride;
            let d = row * dst_stride;
            dst[d..d + copy_w].copy_from_slice(&src[s..s + copy_w]);
        }
        Ok(next)
    }

    /// Source-over composite `src` with its top-left at the canvas origin.
    /// The surface keeps its size; anything past its edges is clipped.
    pub fn composite_at_origin(&mut self, src: &RgbaImage) -> Option<DirtyRect> {
        let rect = DirtyRect::clipped(0, 0, src.width() as i64, src.height() as i64, self.width(), self.height())?;
        for y in 0..rect.height {
            for x in 0..rect.width {
                let top = *src.get_pixel(x, y);
                let base = *self.image.get_pixel(x, y);
                self.image.put_pixel(x, y, blend_over(base, top));
            }
        }
        Some(rect)
    }
}

/// Porter-Duff source-over on straight-alpha pixels.
pub(crate) fn blend_over(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    // Fast paths: nothing on top, or top fully covers
    if top[3] == 0 {
        return base;
    }
    if top[3] == 255 {
        return top;
    }

    let ta = top[3] as f32 / 255.0;
    let ba = base[3] as f32 / 255.0;
    let out_a = ta + ba * (1.0 - ta);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |t: u8, b: u8| -> u8 {
        let v = (t as f32 * ta + b as f32 * ba * (1.0 - ta)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(top[0], base[0]),
        mix(top[1], base[1]),
        mix(top[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

// ============================================================================
// CANVAS: the narrow API the UI talks to
// ============================================================================

/// Everything the UI can ask of the canvas, as a message.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasIntent {
    SetTool(Tool),
    SetColor(Color),
    SetLineWeight(u32),
    PointerPress { x: f32, y: f32 },
    PointerDrag { x: f32, y: f32, primary_held: bool },
    PointerRelease,
    Resize { width: u32, height: u32 },
    Clear,
    LoadImage(Vec<u8>),
    SetZoom(f32),
}

type RepaintCallback = Box<dyn FnMut(Repaint)>;

/// Single-document canvas: one surface, one tool engine, one view.
pub struct Canvas {
    surface: PixelSurface,
    default_size: (u32, u32),
    tools: ToolEngine,
    view: ViewTransform,
    dirty: Option<Repaint>,
    on_repaint: Option<RepaintCallback>,
}

impl Canvas {
    /// White canvas of the given size. Clearing returns to this size.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        let settings = EngineSettings {
            default_width: width,
            default_height: height,
            ..EngineSettings::default()
        };
        Self::with_settings(&settings)
    }

    pub fn with_settings(settings: &EngineSettings) -> CanvasResult<Self> {
        let surface = PixelSurface::new(settings.default_width, settings.default_height)?;
        let style = StrokeStyle::new(settings.color, settings.line_weight)?
            .with_interpolation(settings.interpolate_strokes);
        info!(
            width = settings.default_width,
            height = settings.default_height,
            "canvas created"
        );
        Ok(Self {
            surface,
            default_size: (settings.default_width, settings.default_height),
            tools: ToolEngine::new(Tool::default(), style),
            view: ViewTransform::default(),
            dirty: None,
            on_repaint: None,
        })
    }

    // ---- state -------------------------------------------------------------

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn default_size(&self) -> (u32, u32) {
        self.default_size
    }

    pub fn tool(&self) -> Tool {
        self.tools.tool()
    }

    pub fn color(&self) -> Color {
        self.tools.style().color
    }

    pub fn line_weight(&self) -> u32 {
        self.tools.style().line_weight
    }

    pub fn gesture(&self) -> GestureState {
        self.tools.gesture()
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn zoom(&self) -> f32 {
        self.view.zoom()
    }

    // ---- repaint signalling -------------------------------------------------

    /// Called after every mutation with the region that changed.
    pub fn set_repaint_callback(&mut self, callback: impl FnMut(Repaint) + 'static) {
        self.on_repaint = Some(Box::new(callback));
    }

    /// Pending repaint accumulated since the last call, if any.
    pub fn take_dirty(&mut self) -> Option<Repaint> {
        self.dirty.take()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    fn mark_dirty(&mut self, repaint: Repaint) {
        self.dirty = Some(match self.dirty {
            Some(existing) => existing.merge(repaint),
            None => repaint,
        });
        if let Some(cb) = self.on_repaint.as_mut() {
            cb(repaint);
        }
    }

    fn mark_dirty_opt(&mut self, repaint: Option<Repaint>) {
        if let Some(r) = repaint {
            self.mark_dirty(r);
        }
    }

    // ---- tool style ---------------------------------------------------------

    /// Switch tools. Any half-finished gesture of the previous tool is dropped.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tools.set_tool(tool);
    }

    /// Channels outside `[0, 1]` are clamped. Pen and shape strokes ignore
    /// alpha; only the bucket fill uses it.
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.tools.set_color(Color::new(r, g, b, a));
    }

    pub fn set_line_weight(&mut self, px: u32) -> CanvasResult<()> {
        self.tools.set_line_weight(px)
    }

    pub fn set_interpolate_strokes(&mut self, on: bool) {
        self.tools.set_interpolate_strokes(on);
    }

    // ---- pointer input (canvas coordinates) ---------------------------------

    pub fn on_pointer_press(&mut self, x: f32, y: f32) {
        let repaint = self.tools.press(&mut self.surface, Point::new(x, y));
        self.mark_dirty_opt(repaint);
    }

    pub fn on_pointer_drag(&mut self, x: f32, y: f32, primary_held: bool) {
        let repaint = self.tools.drag(&mut self.surface, Point::new(x, y), primary_held);
        self.mark_dirty_opt(repaint);
    }

    pub fn on_pointer_release(&mut self) {
        self.tools.release();
    }

    // ---- lifecycle ----------------------------------------------------------

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> CanvasResult<()> {
        let repaint = canvas_ops::resize(&mut self.surface, width, height)?;
        self.mark_dirty(repaint);
        Ok(())
    }

    /// Fresh white surface at the default size; custom sizes are discarded.
    pub fn clear_canvas(&mut self) -> CanvasResult<()> {
        let repaint = canvas_ops::clear(&mut self.surface, self.default_size)?;
        self.mark_dirty(repaint);
        Ok(())
    }

    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> CanvasResult<()> {
        let repaint = canvas_ops::load_image_bytes(&mut self.surface, bytes)?;
        self.mark_dirty(repaint);
        Ok(())
    }

    pub fn load_image_path(&mut self, path: impl AsRef<Path>) -> CanvasResult<()> {
        let repaint = canvas_ops::load_image_path(&mut self.surface, path.as_ref())?;
        self.mark_dirty(repaint);
        Ok(())
    }

    // ---- view ---------------------------------------------------------------

    pub fn set_zoom(&mut self, factor: f32) -> CanvasResult<()> {
        self.view.set_zoom(factor)?;
        self.mark_dirty(Repaint::Whole);
        Ok(())
    }

    /// Sample the surface at the current zoom into `target`.
    pub fn render_to(&self, target: &mut RgbaImage) {
        self.view.render_to(&self.surface, target);
    }

    /// Render into a freshly allocated image of the zoomed size.
    pub fn render(&self) -> RgbaImage {
        self.view.render(&self.surface)
    }

    // ---- message passing ----------------------------------------------------

    pub fn dispatch(&mut self, intent: CanvasIntent) -> CanvasResult<()> {
        debug!(?intent, "dispatch");
        match intent {
            CanvasIntent::SetTool(tool) => self.set_tool(tool),
            CanvasIntent::SetColor(c) => self.set_color(c.r, c.g, c.b, c.a),
            CanvasIntent::SetLineWeight(px) => self.set_line_weight(px)?,
            CanvasIntent::PointerPress { x, y } => self.on_pointer_press(x, y),
            CanvasIntent::PointerDrag { x, y, primary_held } => self.on_pointer_drag(x, y, primary_held),
            CanvasIntent::PointerRelease => self.on_pointer_release(),
            CanvasIntent::Resize { width, height } => self.resize_canvas(width, height)?,
            CanvasIntent::Clear => self.clear_canvas()?,
            CanvasIntent::LoadImage(bytes) => {
                if let Err(e) = self.load_image_bytes(&bytes) {
                    warn!(error = %e, "image load rejected");
                    return Err(e);
                }
            }
            CanvasIntent::SetZoom(f) => self.set_zoom(f)?,
        }
        Ok(())
    }
}
