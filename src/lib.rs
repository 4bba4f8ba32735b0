//! Raster canvas engine for a small paint program: the pixel surface, the
//! drawing tools that mutate it, and the zoom transform used to show it.
//!
//! The [`Canvas`] facade is the only thing the window talks to. Everything
//! runs on the calling thread; the row-parallel loops in `ops::shapes` and
//! `view` are joined before their call returns.

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod settings;
pub mod view;

pub use canvas::{Canvas, CanvasIntent, Color, DirtyRect, PixelSurface, Point, Repaint};
pub use components::tools::{GestureState, Tool};
pub use error::{CanvasError, CanvasResult};
pub use settings::EngineSettings;
pub use view::ViewTransform;
