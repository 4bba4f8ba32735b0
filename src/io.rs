use std::path::{Path, PathBuf};

use image::RgbaImage;
use rfd::FileDialog;
use tracing::{info, warn};

use crate::canvas::Canvas;
use crate::error::{CanvasError, CanvasResult};

/// Extensions the enabled `image` decoders understand (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "bmp", "jpg", "jpeg"];

pub fn is_supported_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Decode an in-memory bitmap to straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> CanvasResult<RgbaImage> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.into_rgba8())
}

/// Read and decode a bitmap file.
pub fn read_image(path: &Path) -> CanvasResult<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|source| CanvasError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes)
}

/// Remembers the last opened file and drives the native Open dialog.
#[derive(Debug, Default)]
pub struct FileHandler {
    pub current_path: Option<PathBuf>,
}

impl FileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the native Open dialog. `None` when the user cancels.
    pub fn pick_image_path(&self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("All Files", &["*"]);
        if let Some(dir) = self.current_path.as_deref().and_then(Path::parent) {
            dialog = dialog.set_directory(dir);
        }
        dialog.pick_file()
    }

    /// Ask for a file and composite it onto `canvas`. `Ok(None)` when the
    /// dialog was cancelled.
    pub fn open_into(&mut self, canvas: &mut Canvas) -> CanvasResult<Option<PathBuf>> {
        let Some(path) = self.pick_image_path() else {
            return Ok(None);
        };
        if let Some(ext) = path.extension()
            && !is_supported_extension(&ext.to_string_lossy())
        {
            warn!(path = %path.display(), "unrecognized extension, trying to decode anyway");
        }
        canvas.load_image_path(&path)?;
        info!(path = %path.display(), "image opened");
        self.current_path = Some(path.clone());
        Ok(Some(path))
    }
}
