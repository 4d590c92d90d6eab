//! Palette assets and the placeholder fallback.
//!
//! Decoding lives outside the engine: an [`AssetLoader`] hands back
//! already-decoded RGBA pixels. A failed load never fails a drop; the
//! caller gets a checkerboard placeholder instead.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Side length of the placeholder image.
pub const PLACEHOLDER_SIZE: u32 = 64;

/// Checker cell size inside the placeholder.
const CHECKER_CELL: u32 = 8;

/// Palette labels mapped to asset filenames.
pub const DEFAULT_ASSET_MAP: &[(&str, &str)] = &[
    ("Arrow", "arrow.png"),
    ("Block", "block.png"),
    ("Spring", "spring.jpg"),
    ("Text", "textbox.jpg"),
];

/// Resolve a palette label to its asset filename.
pub fn asset_filename(label: &str) -> Option<&'static str> {
    DEFAULT_ASSET_MAP
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, f)| *f)
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to decode asset {name}: {reason}")]
    Decode { name: String, reason: String },
}

/// Decoded RGBA8 image shared between the scene and the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub rgba: Arc<[u8]>,
    /// Set when this is the fallback checkerboard.
    pub placeholder: bool,
}

impl Pixmap {
    /// Build from raw RGBA8 bytes, checking the buffer length.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected || width == 0 || height == 0 {
            return Err(AssetError::Decode {
                name: format!("{width}x{height}"),
                reason: format!("expected {expected} bytes, got {}", rgba.len()),
            });
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into(),
            placeholder: false,
        })
    }

    /// The fixed-size light checkerboard used when an asset is missing.
    pub fn placeholder() -> Self {
        let n = PLACEHOLDER_SIZE;
        let mut rgba = Vec::with_capacity((n * n * 4) as usize);
        for y in 0..n {
            for x in 0..n {
                let dark = ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 1;
                let v = if dark { 0xd8 } else { 0xf0 };
                rgba.extend_from_slice(&[v, v, v, 0xff]);
            }
        }
        Self {
            width: n,
            height: n,
            rgba: rgba.into(),
            placeholder: true,
        }
    }
}

/// Source of decoded palette images.
pub trait AssetLoader {
    fn load(&self, name: &str) -> Result<Pixmap, AssetError>;
}

/// Load `name`, substituting the placeholder on any failure.
pub fn load_or_placeholder(loader: &dyn AssetLoader, name: &str) -> Pixmap {
    match loader.load(name) {
        Ok(pixmap) => pixmap,
        Err(err) => {
            log::warn!("{err}; using placeholder");
            Pixmap::placeholder()
        }
    }
}

/// In-memory asset table, keyed by filename.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    images: HashMap<String, Pixmap>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, pixmap: Pixmap) {
        self.images.insert(name.into(), pixmap);
    }
}

impl AssetLoader for MemoryAssets {
    fn load(&self, name: &str) -> Result<Pixmap, AssetError> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_64_square_checker() {
        let p = Pixmap::placeholder();
        assert_eq!((p.width, p.height), (64, 64));
        assert_eq!(p.rgba.len(), 64 * 64 * 4);
        assert!(p.placeholder);
        // (0,0) light, (8,0) dark
        assert_eq!(p.rgba[0], 0xf0);
        assert_eq!(p.rgba[8 * 4], 0xd8);
    }

    #[test]
    fn missing_asset_falls_back() {
        let assets = MemoryAssets::new();
        let p = load_or_placeholder(&assets, "block.png");
        assert!(p.placeholder);
    }

    #[test]
    fn known_asset_loads() {
        let mut assets = MemoryAssets::new();
        assets.insert("block.png", Pixmap::from_rgba(2, 1, vec![0; 8]).unwrap());
        let p = load_or_placeholder(&assets, "block.png");
        assert!(!p.placeholder);
        assert_eq!(p.width, 2);
    }

    #[test]
    fn rgba_length_is_checked() {
        assert!(matches!(
            Pixmap::from_rgba(2, 2, vec![0; 3]),
            Err(AssetError::Decode { .. })
        ));
    }

    #[test]
    fn palette_labels_resolve() {
        assert_eq!(asset_filename("Spring"), Some("spring.jpg"));
        assert_eq!(asset_filename("Nope"), None);
    }
}
