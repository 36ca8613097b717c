//! Render-target handles and formats shared between window backends and runtimes.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Handle of a 2D color texture owned by a graphics backend or runtime.
///
/// An unallocated slot is `Option<TextureId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub NonZeroU32);

impl TextureId {
    /// Handle from a raw backend name; zero is not a texture.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Handle of a runtime-owned swap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapChainId(pub u32);

/// Color storage format for render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA, linear.
    Rgba8Unorm,
    /// 8-bit RGBA, sRGB-encoded.
    Rgba8UnormSrgb,
}

impl TextureFormat {
    pub fn from_srgb(srgb: bool) -> Self {
        if srgb {
            TextureFormat::Rgba8UnormSrgb
        } else {
            TextureFormat::Rgba8Unorm
        }
    }

    pub fn is_srgb(self) -> bool {
        self == TextureFormat::Rgba8UnormSrgb
    }
}

/// Magnification/minification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2d {
    pub width: u32,
    pub height: u32,
}

impl Extent2d {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale by a resolution factor, truncating like an integer cast.
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            width: (self.width as f32 * factor) as u32,
            height: (self.height as f32 * factor) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_texture() {
        assert!(TextureId::from_raw(0).is_none());
        assert_eq!(TextureId::from_raw(7).map(TextureId::raw), Some(7));
    }

    #[test]
    fn scaled_extent_truncates() {
        assert_eq!(Extent2d::new(801, 601).scaled(0.5), Extent2d::new(400, 300));
        assert_eq!(Extent2d::new(640, 480).scaled(1.0), Extent2d::new(640, 480));
    }
}
