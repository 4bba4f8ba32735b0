use std::path::{Path, PathBuf};

use crate::canvas::{Color, DEFAULT_HEIGHT, DEFAULT_WIDTH};

const SETTINGS_FILE: &str = "rasterpaint_settings.cfg";

/// Line weights offered by the weight picker.
pub const LINE_WEIGHT_PRESETS: [u32; 4] = [3, 5, 7, 9];

/// Persistent engine and UI preferences.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    /// Size of a new or cleared canvas.
    pub default_width: u32,
    pub default_height: u32,
    pub line_weight: u32,
    pub line_weight_presets: Vec<u32>,
    pub color: Color,
    /// Zoom slider range.
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Fill gaps between pen/eraser drag samples.
    pub interpolate_strokes: bool,
    /// Fallback log filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            line_weight: LINE_WEIGHT_PRESETS[0],
            line_weight_presets: LINE_WEIGHT_PRESETS.to_vec(),
            color: Color::BLACK,
            zoom_min: 0.01,
            zoom_max: 1.01,
            interpolate_strokes: false,
            log_level: "info".to_string(),
        }
    }
}

impl EngineSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/rasterpaint/rasterpaint_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\RasterPaint\rasterpaint_settings.cfg
    /// On macOS:   ~/Library/Application Support/RasterPaint/rasterpaint_settings.cfg
    /// Fallback:   same directory as the executable.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("rasterpaint");
            return Some(config_dir.join(SETTINGS_FILE));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("RasterPaint").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("RasterPaint")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join(SETTINGS_FILE)))
        }
    }

    /// Serialize a Color as "r,g,b,a"
    fn color_to_str(c: Color) -> String {
        format!("{},{},{},{}", c.r, c.g, c.b, c.a)
    }

    /// Parse a Color from "r,g,b,a" with every channel in [0, 1]
    fn str_to_color(s: &str) -> Option<Color> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return None;
        }
        let mut c = [0.0f32; 4];
        for (slot, part) in c.iter_mut().zip(&parts) {
            let v = part.trim().parse::<f32>().ok()?;
            if !(0.0..=1.0).contains(&v) {
                return None;
            }
            *slot = v;
        }
        Some(Color::from_array(c))
    }

    fn str_to_presets(s: &str) -> Option<Vec<u32>> {
        let presets: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>().ok().filter(|w| *w > 0))
            .collect::<Option<_>>()?;
        (!presets.is_empty()).then_some(presets)
    }

    /// Parse `key=value` lines. Unknown keys and malformed values keep
    /// their defaults.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "default_width" => {
                    if let Some(w) = val.parse::<u32>().ok().filter(|w| *w > 0) {
                        s.default_width = w;
                    }
                }
                "default_height" => {
                    if let Some(h) = val.parse::<u32>().ok().filter(|h| *h > 0) {
                        s.default_height = h;
                    }
                }
                "line_weight" => {
                    if let Some(w) = val.parse::<u32>().ok().filter(|w| *w > 0) {
                        s.line_weight = w;
                    }
                }
                "line_weight_presets" => {
                    if let Some(p) = Self::str_to_presets(val) {
                        s.line_weight_presets = p;
                    }
                }
                "color" => {
                    if let Some(c) = Self::str_to_color(val) {
                        s.color = c;
                    }
                }
                "zoom_min" => {
                    if let Some(z) = val.parse::<f32>().ok().filter(|z| z.is_finite() && *z > 0.0) {
                        s.zoom_min = z;
                    }
                }
                "zoom_max" => {
                    if let Some(z) = val.parse::<f32>().ok().filter(|z| z.is_finite() && *z > 0.0) {
                        s.zoom_max = z;
                    }
                }
                "interpolate_strokes" => {
                    s.interpolate_strokes = val == "true";
                }
                "log_level" => {
                    if !val.is_empty() {
                        s.log_level = val.to_string();
                    }
                }
                _ => {}
            }
        }
        if s.zoom_max < s.zoom_min {
            let d = Self::default();
            s.zoom_min = d.zoom_min;
            s.zoom_max = d.zoom_max;
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        let presets = self
            .line_weight_presets
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "default_width={}\n\
             default_height={}\n\
             line_weight={}\n\
             line_weight_presets={presets}\n\
             color={}\n\
             zoom_min={}\n\
             zoom_max={}\n\
             interpolate_strokes={}\n\
             log_level={}\n",
            self.default_width,
            self.default_height,
            self.line_weight,
            Self::color_to_str(self.color),
            self.zoom_min,
            self.zoom_max,
            self.interpolate_strokes,
            self.log_level,
        )
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the default location.
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::settings_path().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no settings directory")
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_config_string())
    }
}

/// The settings file as it is on disk, kept apart from per-session
/// command-line overrides so those never get written back.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    /// `None` means the per-user location.
    path: Option<PathBuf>,
    stored: EngineSettings,
}

impl SettingsStore {
    pub fn open(path: Option<PathBuf>) -> Self {
        let stored = match &path {
            Some(p) => EngineSettings::load_from(p),
            None => EngineSettings::load(),
        };
        Self { path, stored }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.stored
    }

    /// Apply `change` and write the file if anything differs. Returns
    /// whether a write happened.
    pub fn update(&mut self, change: impl FnOnce(&mut EngineSettings)) -> std::io::Result<bool> {
        let mut next = self.stored.clone();
        change(&mut next);
        if next == self.stored {
            return Ok(false);
        }
        match &self.path {
            Some(p) => next.save_to(p)?,
            None => next.save()?,
        }
        self.stored = next;
        Ok(true)
    }
}
