use std::path::PathBuf;

/// Convenience result type used across the engine.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Everything the canvas engine can reject.
///
/// A failing call never leaves the surface half-modified: the prior canvas
/// stays exactly as it was.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    /// Create/resize with a zero width or height.
    #[error("invalid canvas dimensions {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The bitmap could not be decoded.
    #[error("image decode error: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The bitmap file could not be read.
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Direct pixel access outside the surface.
    #[error("pixel ({x}, {y}) is outside the {width}×{height} surface")]
    OutOfBounds { x: i64, y: i64, width: u32, height: u32 },

    /// Zoom factors must be finite and strictly positive.
    #[error("invalid zoom factor {0}")]
    InvalidZoom(f32),

    /// Line weights must be at least one pixel.
    #[error("invalid line weight {0}px")]
    InvalidLineWeight(u32),
}

impl CanvasError {
    pub fn dimensions(width: u32, height: u32) -> Self {
        Self::InvalidDimensions { width, height }
    }
}
