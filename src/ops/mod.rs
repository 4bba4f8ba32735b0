pub mod canvas_ops;
pub mod flood_fill;
pub mod shapes;
