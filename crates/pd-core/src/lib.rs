pub mod asset;
pub mod config;
pub mod export;
pub mod geometry;
pub mod id;
pub mod model;
pub mod viewport;

pub use asset::{AssetError, AssetLoader, MemoryAssets, Pixmap, load_or_placeholder};
pub use config::{ConfigError, EditorConfig};
pub use geometry::{ArcDirection, HitShape};
pub use id::ItemId;
pub use model::*;
pub use viewport::Viewport;

// Re-export kurbo geometry types so downstream crates share one version
pub use kurbo::{Affine, Point, Rect, Vec2};
