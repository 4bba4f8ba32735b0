use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, TextureFilter, TextureOptions, Vec2};
use tracing::{info, warn};

use crate::canvas::Canvas;
use crate::components::tools::Tool;
use crate::io::FileHandler;
use crate::settings::{EngineSettings, SettingsStore};

const CANVAS_TEXTURE: &str = "rasterpaint_canvas";

fn texture_options() -> TextureOptions {
    TextureOptions {
        magnification: TextureFilter::Nearest,
        minification: TextureFilter::Nearest,
        ..Default::default()
    }
}

/// Main window: toolbar on top, status line at the bottom, canvas in the
/// middle. All drawing goes through the `Canvas` API.
pub struct RasterPaintApp {
    canvas: Canvas,
    settings: EngineSettings,
    store: SettingsStore,
    files: FileHandler,
    texture: Option<egui::TextureHandle>,
    color: [f32; 4],
    line_weight: u32,
    zoom_percent: f32,
    width_text: String,
    height_text: String,
    status: Option<String>,
    primary_was_down: bool,
}

impl RasterPaintApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut canvas: Canvas,
        settings: EngineSettings,
        store: SettingsStore,
        status: Option<String>,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        canvas.set_repaint_callback(move |_| ctx.request_repaint());

        Self {
            color: canvas.color().to_array(),
            line_weight: canvas.line_weight(),
            zoom_percent: canvas.zoom() * 100.0,
            width_text: canvas.width().to_string(),
            height_text: canvas.height().to_string(),
            canvas,
            settings,
            store,
            files: FileHandler::new(),
            texture: None,
            status,
            primary_was_down: false,
        }
    }

    fn report(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{msg}");
        self.status = Some(msg);
    }

    /// Remember the toolbar's color and line weight for the next session.
    fn persist_style(&mut self) {
        let color = self.canvas.color();
        let line_weight = self.canvas.line_weight();
        match self.store.update(|s| {
            s.color = color;
            s.line_weight = line_weight;
        }) {
            Ok(true) => info!(line_weight, "settings saved"),
            Ok(false) => {}
            Err(e) => self.report(format!("Could not save settings: {e}")),
        }
    }

    fn sync_size_fields(&mut self) {
        self.width_text = self.canvas.width().to_string();
        self.height_text = self.canvas.height().to_string();
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            let current = self.canvas.tool();
            for &tool in Tool::all() {
                // Clicking the active tool again also restarts its gesture
                if ui.selectable_label(current == tool, tool.label()).clicked() {
                    self.canvas.set_tool(tool);
                }
            }

            ui.separator();

            if ui.color_edit_button_rgba_unmultiplied(&mut self.color).changed() {
                let [r, g, b, a] = self.color;
                self.canvas.set_color(r, g, b, a);
                self.persist_style();
            }

            let before = self.line_weight;
            egui::ComboBox::from_id_source("line_weight")
                .selected_text(format!("{} px", self.line_weight))
                .show_ui(ui, |ui| {
                    for &w in &self.settings.line_weight_presets {
                        ui.selectable_value(&mut self.line_weight, w, format!("{w} px"));
                    }
                });
            if self.line_weight != before {
                match self.canvas.set_line_weight(self.line_weight) {
                    Ok(()) => self.persist_style(),
                    Err(e) => {
                        self.line_weight = before;
                        self.report(e.to_string());
                    }
                }
            }

            ui.separator();

            if ui.button("Clear").clicked() {
                match self.canvas.clear_canvas() {
                    Ok(()) => self.sync_size_fields(),
                    Err(e) => self.report(e.to_string()),
                }
            }

            if ui.button("Open…").clicked() {
                match self.files.open_into(&mut self.canvas) {
                    Ok(Some(path)) => self.status = Some(format!("Opened {}", path.display())),
                    Ok(None) => {}
                    Err(e) => self.report(e.to_string()),
                }
            }

            ui.separator();

            ui.label("W");
            ui.add(egui::TextEdit::singleline(&mut self.width_text).desired_width(48.0));
            ui.label("H");
            ui.add(egui::TextEdit::singleline(&mut self.height_text).desired_width(48.0));
            if ui.button("Resize").clicked() {
                self.apply_resize();
            }

            ui.separator();

            let range = self.settings.zoom_min * 100.0..=self.settings.zoom_max * 100.0;
            let slider = egui::Slider::new(&mut self.zoom_percent, range).suffix("%").text("Zoom");
            if ui.add(slider).changed() {
                if let Err(e) = self.canvas.set_zoom(self.zoom_percent / 100.0) {
                    self.report(e.to_string());
                }
            }
        });
    }

    fn apply_resize(&mut self) {
        let parsed = (
            self.width_text.trim().parse::<u32>(),
            self.height_text.trim().parse::<u32>(),
        );
        let (Ok(w), Ok(h)) = parsed else {
            self.report("Width and height must be whole numbers");
            return;
        };
        match self.canvas.resize_canvas(w, h) {
            Ok(()) => {
                info!(w, h, "resize requested from toolbar");
                self.status = None;
            }
            Err(e) => self.report(e.to_string()),
        }
        self.sync_size_fields();
    }

    /// Re-upload the canvas texture when the engine reports changes.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() && self.canvas.take_dirty().is_none() {
            return;
        }
        let img = self.canvas.render();
        let size = [img.width() as usize, img.height() as usize];
        let color_image = ColorImage::from_rgba_unmultiplied(size, img.as_raw());
        match self.texture.as_mut() {
            Some(tex) => tex.set(color_image, texture_options()),
            None => self.texture = Some(ctx.load_texture(CANVAS_TEXTURE, color_image, texture_options())),
        }
    }

    fn canvas_area(&mut self, ui: &mut egui::Ui) {
        self.refresh_texture(ui.ctx());
        let Some(tex) = self.texture.as_ref() else { return };
        let tex_id = tex.id();
        let (w, h) = self.canvas.view().scaled_size(self.canvas.width(), self.canvas.height());

        egui::ScrollArea::both().show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(Vec2::new(w as f32, h as f32), Sense::click_and_drag());
            let image_rect = response.rect;
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(tex_id, image_rect, uv, Color32::WHITE);

            let (pos, pressed, down, released, moved) = ui.input(|i| {
                (
                    i.pointer.interact_pos(),
                    i.pointer.primary_pressed(),
                    i.pointer.primary_down(),
                    i.pointer.primary_released(),
                    i.pointer.delta() != Vec2::ZERO,
                )
            });

            if let Some(pos) = pos {
                let rel = pos - image_rect.min;
                let p = self.canvas.view().screen_to_canvas(rel.x, rel.y);
                if pressed && response.hovered() {
                    self.canvas.on_pointer_press(p.x, p.y);
                } else if self.primary_was_down && moved {
                    self.canvas.on_pointer_drag(p.x, p.y, down);
                }
            }
            if released {
                self.canvas.on_pointer_release();
            }
            self.primary_was_down = down;
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} × {}  |  {:.0}%  |  {}",
                self.canvas.width(),
                self.canvas.height(),
                self.canvas.zoom() * 100.0,
                self.canvas.tool().label()
            ));
            if let Some(msg) = &self.status {
                ui.separator();
                ui.label(msg);
            }
        });
    }
}

impl eframe::App for RasterPaintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas_area(ui));
    }
}
