//! Asymmetric view frustum.

use serde::{Deserialize, Serialize};

use crate::math::{frustum_gl, Mat4};

/// Asymmetric view volume given by six clip-plane distances.
///
/// Left/right/bottom/top are measured on the near plane. A valid frustum
/// has `right > left`, `top > bottom` and `far > near > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0)
    }
}

impl Frustum {
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        }
    }

    /// Frustum from half-angle tangents at unit distance, moved to the given near plane.
    pub fn from_unit_extents(extents: &EyeExtents, near: f32, far: f32) -> Self {
        let mut frustum = Self::new(
            extents.left,
            extents.right,
            extents.bottom,
            extents.top,
            1.0,
            far,
        );
        frustum.adjust_near_plane(near);
        frustum
    }

    /// Move the near plane while keeping the field of view.
    ///
    /// Left/right/bottom/top are scaled by `new_near / near`.
    pub fn adjust_near_plane(&mut self, new_near: f32) {
        let q = new_near / self.near;
        self.left *= q;
        self.right *= q;
        self.bottom *= q;
        self.top *= q;
        self.near = new_near;
    }

    pub fn is_valid(&self) -> bool {
        self.right > self.left && self.top > self.bottom && self.far > self.near && self.near > 0.0
    }

    /// Horizontal extent per unit of near distance.
    pub fn width_ratio(&self) -> f32 {
        (self.right - self.left) / self.near
    }

    /// Vertical extent per unit of near distance.
    pub fn height_ratio(&self) -> f32 {
        (self.top - self.bottom) / self.near
    }

    /// OpenGL-style projection matrix.
    pub fn to_matrix(&self) -> Mat4 {
        frustum_gl(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

/// Per-eye field of view as signed tangents at unit distance.
///
/// `left` and `bottom` are normally negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeExtents {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl EyeExtents {
    pub const fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Symmetric extents for a given full field of view in degrees.
    pub fn symmetric(horizontal_fov_deg: f32, vertical_fov_deg: f32) -> Self {
        let h = (horizontal_fov_deg.to_radians() / 2.0).tan();
        let v = (vertical_fov_deg.to_radians() / 2.0).tan();
        Self::new(-h, h, -v, v)
    }
}
