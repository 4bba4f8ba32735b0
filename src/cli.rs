// ============================================================================
// RasterPaint CLI: launch options for the painting window
// ============================================================================
//
// Usage examples:
//   rasterpaint                                   (settings file defaults)
//   rasterpaint --width 800 --height 600
//   rasterpaint --open photo.png --zoom 0.5
//   rasterpaint --config ./my_settings.cfg --log-level debug
//
// Flags override the settings file for this session only. They are never
// written back; toolbar changes to color and line weight are.

use std::path::PathBuf;

use clap::Parser;

use crate::settings::{EngineSettings, SettingsStore};

/// RasterPaint raster painting program.
#[derive(Parser, Debug, Default)]
#[command(name = "rasterpaint", about = "RasterPaint raster painting program")]
pub struct CliArgs {
    /// Canvas width for new and cleared canvases.
    #[arg(long, value_name = "PX")]
    pub width: Option<u32>,

    /// Canvas height for new and cleared canvases.
    #[arg(long, value_name = "PX")]
    pub height: Option<u32>,

    /// Bitmap to composite onto the canvas at startup.
    #[arg(short, long, value_name = "FILE")]
    pub open: Option<PathBuf>,

    /// Initial zoom factor (1.0 = 100%).
    #[arg(short, long, allow_negative_numbers = true)]
    pub zoom: Option<f32>,

    /// Initial line weight in pixels.
    #[arg(short, long, value_name = "PX")]
    pub line_weight: Option<u32>,

    /// Settings file to use instead of the per-user one.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "rasterpaint=trace").
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Open the settings file named by `--config`, or the per-user one.
    pub fn settings_store(&self) -> SettingsStore {
        SettingsStore::open(self.config.clone())
    }

    /// Apply overrides to `settings`. Invalid values are left out and
    /// reported back as messages for the log.
    pub fn apply(&self, settings: &mut EngineSettings) -> Vec<String> {
        let mut rejected = Vec::new();

        match self.width {
            Some(0) => rejected.push("--width must be at least 1".to_string()),
            Some(w) => settings.default_width = w,
            None => {}
        }
        match self.height {
            Some(0) => rejected.push("--height must be at least 1".to_string()),
            Some(h) => settings.default_height = h,
            None => {}
        }
        match self.line_weight {
            Some(0) => rejected.push("--line-weight must be at least 1".to_string()),
            Some(w) => settings.line_weight = w,
            None => {}
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(z) = self.zoom {
            if !z.is_finite() || z <= 0.0 {
                rejected.push(format!("--zoom {z} is not a positive factor"));
            }
        }

        rejected
    }

    /// Startup zoom if one was given and is usable.
    pub fn initial_zoom(&self) -> Option<f32> {
        self.zoom.filter(|z| z.is_finite() && *z > 0.0)
    }
}
