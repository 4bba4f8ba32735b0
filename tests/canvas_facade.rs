use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use rasterpaint::{Canvas, CanvasError, CanvasIntent, Color, EngineSettings, GestureState, Repaint, Tool};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn px(canvas: &Canvas, x: u32, y: u32) -> Rgba<u8> {
    *canvas.surface().as_image().get_pixel(x, y)
}

fn png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .unwrap();
    buf
}

#[test]
fn default_settings_give_default_canvas() {
    let canvas = Canvas::with_settings(&EngineSettings::default()).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (1152, 648));
    assert_eq!(canvas.tool(), Tool::Pen);
    assert_eq!(canvas.line_weight(), 3);
    assert_eq!(canvas.color(), Color::BLACK);
    assert!(canvas.surface().as_image().pixels().all(|p| *p == WHITE));
}

#[test]
fn pen_stroke_then_erase() {
    let mut canvas = Canvas::new(50, 50).unwrap();
    canvas.on_pointer_press(10.0, 10.0);
    canvas.on_pointer_drag(20.0, 10.0, true);
    canvas.on_pointer_release();
    assert_eq!(px(&canvas, 10, 10), BLACK);
    assert_eq!(px(&canvas, 20, 10), BLACK);

    // Motion without the button held does nothing
    canvas.on_pointer_press(30.0, 30.0);
    canvas.on_pointer_drag(40.0, 40.0, false);
    assert_eq!(px(&canvas, 40, 40), WHITE);

    canvas.set_tool(Tool::Eraser);
    canvas.on_pointer_press(10.0, 10.0);
    assert_eq!(px(&canvas, 10, 10), WHITE);
    assert_eq!(px(&canvas, 20, 10), BLACK);
}

#[test]
fn bucket_fill_inside_square_outline() {
    let mut canvas = Canvas::new(40, 40).unwrap();
    canvas.set_tool(Tool::Square);
    canvas.on_pointer_press(5.0, 5.0);
    canvas.on_pointer_press(30.0, 30.0);

    canvas.set_tool(Tool::Bucket);
    canvas.set_color(0.0, 0.0, 1.0, 1.0);
    canvas.on_pointer_press(15.0, 15.0);
    assert_eq!(px(&canvas, 15, 15), Rgba([0, 0, 255, 255]));
    assert_eq!(px(&canvas, 1, 1), WHITE);
    assert_eq!(px(&canvas, 38, 38), WHITE);

    // Second fill with the same color changes nothing
    let before = canvas.surface().as_image().clone();
    canvas.take_dirty();
    canvas.on_pointer_press(15.0, 15.0);
    assert_eq!(canvas.surface().as_image(), &before);
    assert!(canvas.take_dirty().is_none());
}

#[test]
fn switching_tools_cancels_pending_anchor() {
    let mut canvas = Canvas::new(60, 60).unwrap();
    canvas.set_tool(Tool::Line);
    canvas.on_pointer_press(5.0, 5.0);
    assert!(matches!(canvas.gesture(), GestureState::WaitingForSecondPoint { .. }));

    canvas.set_tool(Tool::Square);
    assert_eq!(canvas.gesture(), GestureState::WaitingForFirstPoint);
    canvas.on_pointer_press(40.0, 40.0);
    assert!(canvas.surface().as_image().pixels().all(|p| *p == WHITE));
}

#[test]
fn circle_radius_from_two_clicks() {
    let mut canvas = Canvas::new(30, 30).unwrap();
    canvas.set_tool(Tool::Circle);
    canvas.set_line_weight(1).unwrap();
    canvas.on_pointer_press(15.0, 15.0);
    canvas.on_pointer_press(18.0, 19.0);

    assert_eq!(px(&canvas, 20, 15), BLACK);
    assert_eq!(px(&canvas, 10, 15), BLACK);
    assert_eq!(px(&canvas, 18, 19), BLACK);
    assert_eq!(px(&canvas, 19, 15), WHITE);
    assert_eq!(px(&canvas, 15, 15), WHITE);
    assert_eq!(px(&canvas, 23, 15), WHITE);
}

fn black_rows_at(canvas: &Canvas, x: u32) -> Vec<u32> {
    (0..canvas.height()).filter(|&y| px(canvas, x, y) == BLACK).collect()
}

#[test]
fn one_pixel_line_between_integer_clicks() {
    let mut canvas = Canvas::new(40, 20).unwrap();
    canvas.set_tool(Tool::Line);
    canvas.set_line_weight(1).unwrap();
    canvas.on_pointer_press(5.0, 10.0);
    canvas.on_pointer_press(30.0, 10.0);

    let painted = canvas.surface().as_image().pixels().filter(|p| **p == BLACK).count();
    assert_eq!(painted, 26);
    assert_eq!(black_rows_at(&canvas, 20), vec![10]);
}

#[test]
fn square_edges_match_line_weight() {
    let mut canvas = Canvas::new(40, 20).unwrap();
    canvas.set_tool(Tool::Square);
    canvas.set_line_weight(3).unwrap();
    canvas.on_pointer_press(10.0, 10.0);
    canvas.on_pointer_press(30.0, 5.0);
    assert_eq!(black_rows_at(&canvas, 20), vec![4, 5, 6, 9, 10, 11]);
}

#[test]
fn translucent_pen_over_ink_stays_opaque() {
    let mut canvas = Canvas::new(20, 20).unwrap();
    canvas.on_pointer_press(8.0, 8.0);
    canvas.on_pointer_release();
    canvas.set_color(1.0, 0.0, 0.0, 0.5);
    canvas.on_pointer_press(8.0, 8.0);
    assert_eq!(px(&canvas, 8, 8), Rgba([255, 0, 0, 255]));
}

#[test]
fn resize_then_clear() {
    let mut canvas = Canvas::new(20, 20).unwrap();
    canvas.on_pointer_press(5.0, 5.0);

    canvas.resize_canvas(30, 10).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (30, 10));
    assert_eq!(px(&canvas, 5, 5), BLACK);
    assert_eq!(px(&canvas, 25, 5), WHITE);

    assert!(matches!(
        canvas.resize_canvas(30, 0),
        Err(CanvasError::InvalidDimensions { .. })
    ));
    assert_eq!((canvas.width(), canvas.height()), (30, 10));

    canvas.clear_canvas().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (20, 20));
    assert_eq!(px(&canvas, 5, 5), WHITE);
}

#[test]
fn loading_composites_at_origin_without_resizing() {
    let mut canvas = Canvas::new(10, 10).unwrap();
    let mut img = RgbaImage::from_pixel(20, 3, Rgba([255, 0, 0, 255]));
    img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

    canvas.load_image_bytes(&png(&img)).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (10, 10));
    assert_eq!(px(&canvas, 9, 2), Rgba([255, 0, 0, 255]));
    assert_eq!(px(&canvas, 1, 1), WHITE);
    assert_eq!(px(&canvas, 0, 3), WHITE);
    assert_eq!(canvas.take_dirty(), Some(Repaint::Whole));
}

#[test]
fn undecodable_bytes_leave_canvas_alone() {
    let mut canvas = Canvas::new(10, 10).unwrap();
    canvas.on_pointer_press(3.0, 3.0);
    canvas.take_dirty();
    let before = canvas.surface().as_image().clone();

    let err = canvas.load_image_bytes(b"definitely not a bitmap").unwrap_err();
    assert!(matches!(err, CanvasError::ImageDecode(_)));
    assert_eq!(canvas.surface().as_image(), &before);
    assert!(canvas.take_dirty().is_none());
}

#[test]
fn load_from_missing_path_is_io_error() {
    let mut canvas = Canvas::new(4, 4).unwrap();
    let path = std::env::temp_dir().join("rasterpaint-missing-input.png");
    assert!(matches!(canvas.load_image_path(&path), Err(CanvasError::Io { .. })));
}

#[test]
fn zoomed_render_matches_scaled_size() {
    let mut canvas = Canvas::new(8, 4).unwrap();
    canvas.set_tool(Tool::Pen);
    canvas.set_line_weight(1).unwrap();
    canvas.on_pointer_press(0.0, 0.0);

    canvas.set_zoom(3.0).unwrap();
    let img = canvas.render();
    assert_eq!(img.dimensions(), (24, 12));
    assert_eq!(*img.get_pixel(2, 2), BLACK);
    assert_eq!(*img.get_pixel(3, 3), WHITE);

    // Screen position maps back to the same canvas pixel
    assert_eq!(canvas.view().screen_to_pixel(2.9, 2.9, 8, 4), Some((0, 0)));
    assert!(canvas.set_zoom(0.0).is_err());
    assert_eq!(canvas.zoom(), 3.0);
}

#[test]
fn every_mutation_reaches_the_callback() {
    let mut canvas = Canvas::new(30, 30).unwrap();
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    canvas.set_repaint_callback(move |_| seen.set(seen.get() + 1));

    canvas.on_pointer_press(5.0, 5.0);
    canvas.set_tool(Tool::Triangle);
    canvas.on_pointer_press(15.0, 15.0);
    canvas.resize_canvas(40, 40).unwrap();
    canvas.set_zoom(2.0).unwrap();
    canvas.clear_canvas().unwrap();
    assert_eq!(count.get(), 5);

    // Anchor clicks do not touch pixels
    canvas.set_tool(Tool::Circle);
    canvas.on_pointer_press(5.0, 5.0);
    assert_eq!(count.get(), 5);
}

#[test]
fn intents_drive_a_whole_session() {
    let mut canvas = Canvas::new(64, 64).unwrap();
    let intents = vec![
        CanvasIntent::SetTool(Tool::Line),
        CanvasIntent::SetLineWeight(5),
        CanvasIntent::SetColor(Color::rgb(0.0, 1.0, 0.0)),
        CanvasIntent::PointerPress { x: 4.0, y: 32.0 },
        CanvasIntent::PointerPress { x: 60.0, y: 32.0 },
        CanvasIntent::SetTool(Tool::Pen),
        CanvasIntent::PointerPress { x: 10.0, y: 10.0 },
        CanvasIntent::PointerDrag {
            x: 12.0,
            y: 10.0,
            primary_held: true,
        },
        CanvasIntent::PointerRelease,
        CanvasIntent::SetZoom(0.5),
    ];
    for intent in intents {
        canvas.dispatch(intent).unwrap();
    }

    assert_eq!(px(&canvas, 30, 31), Rgba([0, 255, 0, 255]));
    assert_eq!(px(&canvas, 12, 10), Rgba([0, 255, 0, 255]));
    assert_eq!(canvas.gesture(), GestureState::Idle);
    assert_eq!(canvas.render().dimensions(), (32, 32));

    canvas.dispatch(CanvasIntent::Clear).unwrap();
    assert!(canvas.surface().as_image().pixels().all(|p| *p == WHITE));
}
