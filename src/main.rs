#![windows_subsystem = "windows"]

use clap::Parser;
use eframe::egui;
use tracing::{error, info, warn};

use rasterpaint::app::RasterPaintApp;
use rasterpaint::canvas::Canvas;
use rasterpaint::cli::CliArgs;
use rasterpaint::logger;

fn main() -> Result<(), eframe::Error> {
    let args = CliArgs::parse();

    let store = args.settings_store();
    let mut settings = store.settings().clone();
    let rejected = args.apply(&mut settings);

    // Initialize session log (overwrites previous session log)
    logger::init(&settings.log_level);
    for msg in &rejected {
        warn!("{msg}");
    }

    let mut status = None;
    let mut canvas = match Canvas::with_settings(&settings) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "could not create canvas");
            eprintln!("rasterpaint: {e}");
            std::process::exit(1);
        }
    };

    if let Some(zoom) = args.initial_zoom()
        && let Err(e) = canvas.set_zoom(zoom)
    {
        warn!(error = %e, "startup zoom rejected");
    }

    if let Some(path) = &args.open {
        match canvas.load_image_path(path) {
            Ok(()) => info!(path = %path.display(), "opened at startup"),
            Err(e) => {
                warn!(error = %e, "startup image rejected");
                status = Some(e.to_string());
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("RasterPaint"),
        ..Default::default()
    };

    eframe::run_native(
        "RasterPaint",
        options,
        Box::new(move |cc| Box::new(RasterPaintApp::new(cc, canvas, settings, store, status))),
    )
}
