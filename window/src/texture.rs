//! Application render targets.
//!
//! Windows own up to two color textures that the application renders into.
//! A texture handle is created once and keeps its number for the lifetime
//! of the window; only its backing storage is reallocated on resize.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use vrplex_core::{Extent2d, TextureFilter, TextureFormat, TextureId};

use crate::error::{Result, WindowError};

/// Graphics-API access for render-target textures.
///
/// Textures are always clamped to edge.
pub trait TextureBackend: Send + Sync {
    /// Create a texture handle without storage.
    fn create_texture(&self, filter: TextureFilter) -> Result<TextureId>;

    /// (Re)allocate the storage of a texture. The handle is preserved.
    fn allocate(&self, texture: TextureId, size: Extent2d, format: TextureFormat) -> Result<()>;

    fn delete_texture(&self, texture: TextureId);
}

/// State of a texture in [`DummyTextureBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DummyTexture {
    pub filter: TextureFilter,
    pub size: Option<Extent2d>,
    pub format: Option<TextureFormat>,
    /// Number of storage allocations so far.
    pub allocations: u32,
}

/// Texture backend that only tracks handles and sizes.
#[derive(Debug)]
pub struct DummyTextureBackend {
    textures: Mutex<HashMap<TextureId, DummyTexture>>,
    next: AtomicU32,
}

impl DummyTextureBackend {
    pub fn new() -> Self {
        Self {
            textures: Mutex::new(HashMap::new()),
            next: AtomicU32::new(1),
        }
    }

    pub fn texture(&self, texture: TextureId) -> Option<DummyTexture> {
        self.textures.lock().get(&texture).copied()
    }

    /// Number of textures that exist.
    pub fn live_count(&self) -> usize {
        self.textures.lock().len()
    }
}

impl Default for DummyTextureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBackend for DummyTextureBackend {
    fn create_texture(&self, filter: TextureFilter) -> Result<TextureId> {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        let id = TextureId::from_raw(raw)
            .ok_or_else(|| WindowError::Texture("texture names exhausted".into()))?;
        log::trace!("DummyTextureBackend: creating texture {} ({:?})", raw, filter);
        self.textures.lock().insert(
            id,
            DummyTexture {
                filter,
                size: None,
                format: None,
                allocations: 0,
            },
        );
        Ok(id)
    }

    fn allocate(&self, texture: TextureId, size: Extent2d, format: TextureFormat) -> Result<()> {
        let mut textures = self.textures.lock();
        let entry = textures
            .get_mut(&texture)
            .ok_or_else(|| WindowError::Texture(format!("unknown texture {}", texture.raw())))?;
        log::trace!(
            "DummyTextureBackend: allocating texture {} ({}x{}, {:?})",
            texture.raw(),
            size.width,
            size.height,
            format
        );
        entry.size = Some(size);
        entry.format = Some(format);
        entry.allocations += 1;
        Ok(())
    }

    fn delete_texture(&self, texture: TextureId) {
        log::trace!("DummyTextureBackend: deleting texture {}", texture.raw());
        self.textures.lock().remove(&texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_survives_reallocation() {
        let backend = DummyTextureBackend::new();
        let id = backend.create_texture(TextureFilter::Nearest).unwrap();
        backend
            .allocate(id, Extent2d::new(800, 600), TextureFormat::Rgba8UnormSrgb)
            .unwrap();
        backend
            .allocate(id, Extent2d::new(1024, 768), TextureFormat::Rgba8UnormSrgb)
            .unwrap();
        let texture = backend.texture(id).unwrap();
        assert_eq!(texture.size, Some(Extent2d::new(1024, 768)));
        assert_eq!(texture.allocations, 2);
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn deleted_texture_cannot_be_allocated() {
        let backend = DummyTextureBackend::new();
        let id = backend.create_texture(TextureFilter::Linear).unwrap();
        backend.delete_texture(id);
        assert!(backend
            .allocate(id, Extent2d::new(1, 1), TextureFormat::Rgba8Unorm)
            .is_err());
        assert_eq!(backend.live_count(), 0);
    }
}
