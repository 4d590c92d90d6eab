pub mod hit;
pub mod paint;

pub use hit::{hit_test, hit_test_rect, items_in_circle};
pub use paint::{OverlayShape, paint_grid, paint_scene};
