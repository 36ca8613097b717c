//! Window and screen geometry.

use serde::{Deserialize, Serialize};

use crate::texture::Extent2d;

/// Integer rectangle in desktop pixel coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Extent2d {
        Extent2d::new(self.width, self.height)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && (x as i64) < self.x as i64 + self.width as i64
            && (y as i64) < self.y as i64 + self.height as i64
    }
}

/// A physical display as reported by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenInfo {
    /// Desktop area covered by the screen.
    pub geometry: Rect,
    /// Physical width and height in meters.
    pub physical_size: [f32; 2],
}

impl ScreenInfo {
    pub fn new(geometry: Rect, physical_size: [f32; 2]) -> Self {
        Self {
            geometry,
            physical_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains() {
        let r = Rect::new(10, 20, 100, 50);
        assert!(r.contains(10, 20));
        assert!(r.contains(109, 69));
        assert!(!r.contains(110, 20));
        assert!(!r.contains(9, 20));
    }
}
