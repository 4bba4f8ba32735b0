use tracing::debug;

use crate::canvas::{Color, PixelSurface, Point, Repaint};
use crate::error::{CanvasError, CanvasResult};
use crate::ops::flood_fill::flood_fill;
use crate::ops::shapes::{Shape, stamp_segment, stamp_square, stroke_shape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Pen,
    Eraser,
    Bucket,
    Line,
    Square,
    Circle,
    Triangle,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pen => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::Bucket => "Bucket Fill",
            Tool::Line => "Line",
            Tool::Square => "Square",
            Tool::Circle => "Circle",
            Tool::Triangle => "Triangle",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pen,
            Tool::Eraser,
            Tool::Bucket,
            Tool::Line,
            Tool::Square,
            Tool::Circle,
            Tool::Triangle,
        ]
    }

    /// Tools that need an anchor click before they draw.
    pub fn is_two_click(&self) -> bool {
        matches!(self, Tool::Line | Tool::Square | Tool::Circle)
    }

    fn handler(self) -> Box<dyn ToolHandler> {
        match self {
            Tool::Pen => Box::new(PenTool::default()),
            Tool::Eraser => Box::new(EraserTool::default()),
            Tool::Bucket => Box::new(BucketTool),
            Tool::Line => Box::new(LineTool::default()),
            Tool::Square => Box::new(SquareTool::default()),
            Tool::Circle => Box::new(CircleTool::default()),
            Tool::Triangle => Box::new(TriangleTool),
        }
    }
}

/// Where the active tool is in its gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureState {
    /// Single-click tools between presses.
    Idle,
    /// Pen or eraser with the button down.
    Stroking,
    WaitingForFirstPoint,
    WaitingForSecondPoint { anchor: Point },
}

/// Color, width and stroke options shared by every tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub line_weight: u32,
    /// Fill the gap between consecutive pen/eraser drag samples.
    pub interpolate: bool,
}

impl StrokeStyle {
    pub fn new(color: Color, line_weight: u32) -> CanvasResult<Self> {
        if line_weight == 0 {
            return Err(CanvasError::InvalidLineWeight(line_weight));
        }
        Ok(Self {
            color,
            line_weight,
            interpolate: false,
        })
    }

    pub fn with_interpolation(mut self, on: bool) -> Self {
        self.interpolate = on;
        self
    }
}

/// What a handler gets to work with for one event.
pub struct ToolContext<'a> {
    pub surface: &'a mut PixelSurface,
    pub style: &'a StrokeStyle,
}

impl ToolContext<'_> {
    /// Shape outlines are always painted opaque.
    fn stroke(&mut self, shape: &Shape) -> Option<Repaint> {
        let color = self.style.color.opaque();
        stroke_shape(self.surface, shape, color, self.style.line_weight).map(Repaint::Region)
    }
}

/// Per-tool pointer behavior. Coordinates are in canvas pixel space.
pub trait ToolHandler {
    fn tool(&self) -> Tool;

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint>;

    fn on_drag(&mut self, _ctx: &mut ToolContext<'_>, _at: Point, _primary_held: bool) -> Option<Repaint> {
        None
    }

    fn on_release(&mut self) {}

    fn gesture(&self) -> GestureState {
        GestureState::Idle
    }
}

// ---------------------------------------------------------------------------
// Pen / Eraser
// ---------------------------------------------------------------------------

#[derive(Default)]
struct BrushStroke {
    active: bool,
    last: Option<Point>,
}

impl BrushStroke {
    fn press(&mut self, ctx: &mut ToolContext<'_>, at: Point, color: Color) -> Option<Repaint> {
        self.active = true;
        self.last = Some(at);
        debug!(x = at.x, y = at.y, "stamp");
        stamp_square(ctx.surface, at, ctx.style.line_weight, color).map(Repaint::Region)
    }

    fn drag(&mut self, ctx: &mut ToolContext<'_>, at: Point, held: bool, color: Color) -> Option<Repaint> {
        if !self.active || !held {
            return None;
        }
        let weight = ctx.style.line_weight;
        let dirty = match self.last {
            Some(prev) if ctx.style.interpolate => stamp_segment(ctx.surface, prev, at, weight, color),
            _ => stamp_square(ctx.surface, at, weight, color),
        };
        self.last = Some(at);
        dirty.map(Repaint::Region)
    }

    fn release(&mut self) {
        self.active = false;
        self.last = None;
    }

    fn gesture(&self) -> GestureState {
        if self.active {
            GestureState::Stroking
        } else {
            GestureState::Idle
        }
    }
}

/// Paints the current color at full alpha.
#[derive(Default)]
struct PenTool {
    stroke: BrushStroke,
}

impl ToolHandler for PenTool {
    fn tool(&self) -> Tool {
        Tool::Pen
    }

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint> {
        let color = ctx.style.color.opaque();
        self.stroke.press(ctx, at, color)
    }

    fn on_drag(&mut self, ctx: &mut ToolContext<'_>, at: Point, primary_held: bool) -> Option<Repaint> {
        let color = ctx.style.color.opaque();
        self.stroke.drag(ctx, at, primary_held, color)
    }

    fn on_release(&mut self) {
        self.stroke.release();
    }

    fn gesture(&self) -> GestureState {
        self.stroke.gesture()
    }
}

/// Paints opaque white, whatever the current color.
#[derive(Default)]
struct EraserTool {
    stroke: BrushStroke,
}

impl ToolHandler for EraserTool {
    fn tool(&self) -> Tool {
        Tool::Eraser
    }

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint> {
        self.stroke.press(ctx, at, Color::WHITE)
    }

    fn on_drag(&mut self, ctx: &mut ToolContext<'_>, at: Point, primary_held: bool) -> Option<Repaint> {
        self.stroke.drag(ctx, at, primary_held, Color::WHITE)
    }

    fn on_release(&mut self) {
        self.stroke.release();
    }

    fn gesture(&self) -> GestureState {
        self.stroke.gesture()
    }
}

// ---------------------------------------------------------------------------
// Bucket
// ---------------------------------------------------------------------------

/// The only tool that keeps the current color's alpha.
struct BucketTool;

impl ToolHandler for BucketTool {
    fn tool(&self) -> Tool {
        Tool::Bucket
    }

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint> {
        let (x, y) = at.pixel();
        let outcome = flood_fill(ctx.surface, x, y, ctx.style.color);
        (outcome.filled > 0).then_some(Repaint::Whole)
    }
}

// ---------------------------------------------------------------------------
// Two-click shapes
// ---------------------------------------------------------------------------

/// Anchor of a two-click gesture, owned by the tool that uses it.
#[derive(Default)]
struct Anchor {
    point: Option<Point>,
}

impl Anchor {
    /// First click stores the point and yields nothing; the second click
    /// yields the stored anchor and resets.
    fn advance(&mut self, at: Point) -> Option<Point> {
        match self.point.take() {
            Some(anchor) => Some(anchor),
            None => {
                debug!(x = at.x, y = at.y, "anchor set");
                self.point = Some(at);
                None
            }
        }
    }

    fn gesture(&self) -> GestureState {
        match self.point {
            Some(anchor) => GestureState::WaitingForSecondPoint { anchor },
            None => GestureState::WaitingForFirstPoint,
        }
    }
}

macro_rules! two_click_tool {
    ($name:ident, $tool:expr, $build:expr) => {
        #[derive(Default)]
        struct $name {
            anchor: Anchor,
        }

        impl ToolHandler for $name {
            fn tool(&self) -> Tool {
                $tool
            }

            fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint> {
                let anchor = self.anchor.advance(at)?;
                let build: fn(Point, Point) -> Shape = $build;
                ctx.stroke(&build(anchor, at))
            }

            fn gesture(&self) -> GestureState {
                self.anchor.gesture()
            }
        }
    };
}

two_click_tool!(LineTool, Tool::Line, Shape::line);
two_click_tool!(SquareTool, Tool::Square, Shape::rectangle);
two_click_tool!(CircleTool, Tool::Circle, Shape::circle_through);

struct TriangleTool;

impl ToolHandler for TriangleTool {
    fn tool(&self) -> Tool {
        Tool::Triangle
    }

    fn on_press(&mut self, ctx: &mut ToolContext<'_>, at: Point) -> Option<Repaint> {
        ctx.stroke(&Shape::triangle_at(at))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the active tool handler and the stroke style, and routes pointer
/// events to the handler.
pub struct ToolEngine {
    handler: Box<dyn ToolHandler>,
    style: StrokeStyle,
}

impl ToolEngine {
    pub fn new(tool: Tool, style: StrokeStyle) -> Self {
        Self {
            handler: tool.handler(),
            style,
        }
    }

    pub fn tool(&self) -> Tool {
        self.handler.tool()
    }

    /// Always installs a fresh handler, even for the current tool, so any
    /// pending anchor or active stroke is dropped.
    pub fn set_tool(&mut self, tool: Tool) {
        debug!(from = ?self.handler.tool(), to = ?tool, "tool switch");
        self.handler = tool.handler();
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    pub fn set_color(&mut self, color: Color) {
        self.style.color = color.clamped();
    }

    pub fn set_line_weight(&mut self, px: u32) -> CanvasResult<()> {
        if px == 0 {
            return Err(CanvasError::InvalidLineWeight(px));
        }
        self.style.line_weight = px;
        Ok(())
    }

    pub fn set_interpolate_strokes(&mut self, on: bool) {
        self.style.interpolate = on;
    }

    pub fn gesture(&self) -> GestureState {
        self.handler.gesture()
    }

    pub fn press(&mut self, surface: &mut PixelSurface, at: Point) -> Option<Repaint> {
        let mut ctx = ToolContext {
            surface,
            style: &self.style,
        };
        self.handler.on_press(&mut ctx, at)
    }

    pub fn drag(&mut self, surface: &mut PixelSurface, at: Point, primary_held: bool) -> Option<Repaint> {
        let mut ctx = ToolContext {
            surface,
            style: &self.style,
        };
        self.handler.on_drag(&mut ctx, at, primary_held)
    }

    pub fn release(&mut self) {
        self.handler.on_release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DirtyRect;

    fn engine(tool: Tool, weight: u32) -> ToolEngine {
        ToolEngine::new(tool, StrokeStyle::new(Color::BLACK, weight).unwrap())
    }

    fn black(s: &PixelSurface, x: u32, y: u32) -> bool {
        s.get(x, y).unwrap() == Color::BLACK
    }

    #[test]
    fn pen_press_stamps_square() {
        let mut s = PixelSurface::new(20, 20).unwrap();
        let mut e = engine(Tool::Pen, 3);
        let r = e.press(&mut s, Point::new(10.4, 10.9));
        assert_eq!(r, Some(Repaint::Region(DirtyRect { x: 9, y: 9, width: 3, height: 3 })));
        assert!(black(&s, 9, 9) && black(&s, 11, 11));
        assert!(!black(&s, 12, 10));
        assert_eq!(e.gesture(), GestureState::Stroking);
    }

    #[test]
    fn pen_drag_needs_press_and_held_button() {
        let mut s = PixelSurface::new(30, 30).unwrap();
        let mut e = engine(Tool::Pen, 1);

        assert!(e.drag(&mut s, Point::new(5.0, 5.0), true).is_none());
        assert!(!black(&s, 5, 5));

        e.press(&mut s, Point::new(1.0, 1.0));
        assert!(e.drag(&mut s, Point::new(6.0, 6.0), false).is_none());
        assert!(!black(&s, 6, 6));

        assert!(e.drag(&mut s, Point::new(7.0, 7.0), true).is_some());
        assert!(black(&s, 7, 7));

        e.release();
        assert_eq!(e.gesture(), GestureState::Idle);
        assert!(e.drag(&mut s, Point::new(9.0, 9.0), true).is_none());
    }

    #[test]
    fn pen_drag_does_not_interpolate_by_default() {
        let mut s = PixelSurface::new(30, 5).unwrap();
        let mut e = engine(Tool::Pen, 1);
        e.press(&mut s, Point::new(2.0, 2.0));
        e.drag(&mut s, Point::new(20.0, 2.0), true);
        assert!(black(&s, 2, 2) && black(&s, 20, 2));
        assert!(!black(&s, 10, 2));

        e.set_interpolate_strokes(true);
        e.press(&mut s, Point::new(2.0, 4.0));
        e.drag(&mut s, Point::new(20.0, 4.0), true);
        assert!((2..=20).all(|x| black(&s, x, 4)));
    }

    #[test]
    fn eraser_paints_white() {
        let mut s = PixelSurface::filled(10, 10, Color::BLACK).unwrap();
        let mut e = engine(Tool::Eraser, 3);
        e.set_color(Color::rgb(1.0, 0.0, 0.0));
        e.press(&mut s, Point::new(5.0, 5.0));
        e.drag(&mut s, Point::new(8.0, 5.0), true);
        assert_eq!(s.get(5, 5).unwrap(), Color::WHITE);
        assert_eq!(s.get(8, 5).unwrap(), Color::WHITE);
        assert_eq!(s.get(1, 1).unwrap(), Color::BLACK);
    }

    #[test]
    fn bucket_fills_and_requests_whole_repaint() {
        let mut s = PixelSurface::new(8, 8).unwrap();
        let mut e = engine(Tool::Bucket, 3);
        assert_eq!(e.press(&mut s, Point::new(2.5, 2.5)), Some(Repaint::Whole));
        assert!(black(&s, 7, 7));
        // Already black: nothing to do
        assert_eq!(e.press(&mut s, Point::new(2.5, 2.5)), None);
        assert_eq!(e.press(&mut s, Point::new(-4.0, 2.0)), None);
    }

    #[test]
    fn two_click_state_machine() {
        let mut s = PixelSurface::new(40, 40).unwrap();
        let mut e = engine(Tool::Line, 2);
        assert_eq!(e.gesture(), GestureState::WaitingForFirstPoint);

        let before = s.as_image().clone();
        assert!(e.press(&mut s, Point::new(5.0, 5.0)).is_none());
        assert_eq!(s.as_image(), &before);
        assert_eq!(
            e.gesture(),
            GestureState::WaitingForSecondPoint {
                anchor: Point::new(5.0, 5.0)
            }
        );

        assert!(e.press(&mut s, Point::new(30.0, 5.0)).is_some());
        assert_eq!(e.gesture(), GestureState::WaitingForFirstPoint);
        assert!(black(&s, 15, 4) && black(&s, 15, 5));
        assert!(!black(&s, 15, 6));
    }

    #[test]
    fn tool_switch_discards_anchor() {
        let mut s = PixelSurface::new(40, 40).unwrap();
        let mut e = engine(Tool::Circle, 1);
        e.press(&mut s, Point::new(10.0, 10.0));
        assert!(matches!(e.gesture(), GestureState::WaitingForSecondPoint { .. }));

        e.set_tool(Tool::Circle);
        assert_eq!(e.gesture(), GestureState::WaitingForFirstPoint);

        // The next press is a first click again
        let before = s.as_image().clone();
        assert!(e.press(&mut s, Point::new(20.0, 20.0)).is_none());
        assert_eq!(s.as_image(), &before);
    }

    #[test]
    fn tool_switch_ends_pen_stroke() {
        let mut s = PixelSurface::new(20, 20).unwrap();
        let mut e = engine(Tool::Pen, 1);
        e.press(&mut s, Point::new(1.0, 1.0));
        e.set_tool(Tool::Pen);
        assert!(e.drag(&mut s, Point::new(9.0, 9.0), true).is_none());
    }

    #[test]
    fn square_from_two_clicks() {
        let mut s = PixelSurface::new(40, 20).unwrap();
        let mut e = engine(Tool::Square, 3);
        e.press(&mut s, Point::new(10.0, 10.0));
        e.press(&mut s, Point::new(30.0, 5.0));

        // Edges at y=5 and y=10, x=10 and x=30
        assert!(black(&s, 20, 5));
        assert!(black(&s, 20, 9));
        assert!(black(&s, 10, 7));
        assert!(black(&s, 29, 7));
        assert!(!black(&s, 20, 7));
    }

    #[test]
    fn circle_from_two_clicks_has_radius_five() {
        let mut s = PixelSurface::new(12, 12).unwrap();
        let mut e = engine(Tool::Circle, 1);
        e.press(&mut s, Point::new(0.0, 0.0));
        e.press(&mut s, Point::new(3.0, 4.0));

        assert!(black(&s, 4, 3) && black(&s, 5, 0) && black(&s, 0, 5));
        assert!(!black(&s, 4, 2));
        assert!(!black(&s, 0, 0));
        assert!(!black(&s, 1, 1));
        assert!(!black(&s, 7, 0));
    }

    #[test]
    fn triangle_draws_on_single_press() {
        let mut s = PixelSurface::new(200, 200).unwrap();
        let mut e = engine(Tool::Triangle, 3);
        assert_eq!(e.gesture(), GestureState::Idle);
        assert!(e.press(&mut s, Point::new(100.0, 100.0)).is_some());

        // apex, base midpoint and base corners
        assert!(black(&s, 100, 40));
        assert!(black(&s, 100, 130));
        assert!(black(&s, 159, 129));
        assert!(black(&s, 40, 130));
        // centroid is untouched
        assert!(!black(&s, 100, 100));
    }

    fn rows_at(s: &PixelSurface, x: u32) -> Vec<u32> {
        (0..s.height()).filter(|&y| black(s, x, y)).collect()
    }

    #[test]
    fn one_pixel_shapes_on_integer_clicks_are_drawn() {
        let mut s = PixelSurface::new(40, 20).unwrap();
        let mut e = engine(Tool::Line, 1);
        assert!(e.press(&mut s, Point::new(5.0, 10.0)).is_none());
        assert!(e.press(&mut s, Point::new(30.0, 10.0)).is_some());
        assert!((5..=30).all(|x| black(&s, x, 10)));
        assert_eq!(rows_at(&s, 15), vec![10]);
    }

    #[test]
    fn shape_tools_stroke_with_line_weight() {
        for weight in [1, 3, 5, 7, 9] {
            let mut s = PixelSurface::new(60, 40).unwrap();
            let mut e = engine(Tool::Line, weight);
            e.press(&mut s, Point::new(5.0, 20.0));
            e.press(&mut s, Point::new(50.0, 20.0));
            assert_eq!(rows_at(&s, 25).len() as u32, weight, "line weight {weight}");

            let mut s = PixelSurface::new(60, 40).unwrap();
            let mut e = engine(Tool::Square, weight);
            e.press(&mut s, Point::new(10.0, 10.0));
            e.press(&mut s, Point::new(50.0, 30.0));
            assert_eq!(rows_at(&s, 30).len() as u32, 2 * weight, "square weight {weight}");

            let mut s = PixelSurface::new(60, 60).unwrap();
            let mut e = engine(Tool::Circle, weight);
            e.press(&mut s, Point::new(30.0, 30.0));
            e.press(&mut s, Point::new(30.0, 45.0));
            let below: Vec<u32> = rows_at(&s, 30).into_iter().filter(|&y| y > 30).collect();
            assert_eq!(below.len() as u32, weight, "circle weight {weight}");

            let mut s = PixelSurface::new(200, 200).unwrap();
            let mut e = engine(Tool::Triangle, weight);
            e.press(&mut s, Point::new(100.0, 100.0));
            let base: Vec<u32> = rows_at(&s, 100).into_iter().filter(|&y| y > 100).collect();
            assert_eq!(base, ((130 - weight / 2)..=(130 + weight / 2)).collect::<Vec<_>>(), "triangle weight {weight}");
        }
    }

    #[test]
    fn pen_and_shapes_ignore_alpha() {
        let mut s = PixelSurface::new(20, 20).unwrap();
        let mut e = ToolEngine::new(Tool::Pen, StrokeStyle::new(Color::new(0.0, 0.0, 1.0, 0.25), 3).unwrap());
        e.press(&mut s, Point::new(5.0, 5.0));
        assert_eq!(s.get(5, 5).unwrap(), Color::rgb(0.0, 0.0, 1.0));

        e.set_tool(Tool::Square);
        e.press(&mut s, Point::new(2.0, 12.0));
        e.press(&mut s, Point::new(18.0, 18.0));
        assert_eq!(s.get(10, 12).unwrap(), Color::rgb(0.0, 0.0, 1.0));

        e.set_tool(Tool::Bucket);
        e.press(&mut s, Point::new(15.0, 2.0));
        assert_eq!(s.get(15, 2).unwrap(), Color::new(0.0, 0.0, 1.0, 0.25));
    }

    #[test]
    fn set_color_clamps_out_of_range_channels() {
        let mut e = engine(Tool::Bucket, 3);
        e.set_color(Color::new(1.5, -1.0, 0.5, 3.0));
        assert_eq!(e.style().color.to_array(), [1.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn zero_line_weight_is_rejected() {
        let mut e = engine(Tool::Pen, 3);
        assert!(matches!(e.set_line_weight(0), Err(CanvasError::InvalidLineWeight(0))));
        assert_eq!(e.style().line_weight, 3);
        e.set_line_weight(9).unwrap();
        assert_eq!(e.style().line_weight, 9);
    }
}
