//! Per-frame render context of a window.

use serde::{Deserialize, Serialize};
use vrplex_core::math::{Mat4, Quat, Vec3};
use vrplex_core::{Extent2d, Eye, Frustum, OutputMode, Rect};

/// Everything the application needs to render one frame of one window.
///
/// Holds one or two views depending on the output mode. For a monoscopic
/// mode only view 0 is meaningful and the texture size of view 1 is `None`.
///
/// # Example
///
/// ```ignore
/// let textures = window.compute_render_context(&observer, 0.05, 100.0)?;
/// let ctx = window.render_context();
/// for view in 0..ctx.view_count() {
///     let projection = ctx.frustum(view).to_matrix();
///     let view_matrix = ctx.view_matrix(view);
///     // render into textures[view] at ctx.texture_size(view)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    process_index: usize,
    window_index: usize,
    window_geometry: Rect,
    screen_geometry: Rect,
    navigation_position: Vec3,
    navigation_orientation: Quat,
    screen_wall: [Vec3; 3],
    output_mode: OutputMode,
    tracking_position: [Vec3; 2],
    tracking_orientation: [Quat; 2],
    frustum: [Frustum; 2],
    view_matrix: [Mat4; 2],
    view_matrix_pure: [Mat4; 2],
    texture_size: [Option<Extent2d>; 2],
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            process_index: 0,
            window_index: 0,
            window_geometry: Rect::default(),
            screen_geometry: Rect::default(),
            navigation_position: Vec3::zeros(),
            navigation_orientation: Quat::identity(),
            screen_wall: [Vec3::zeros(); 3],
            output_mode: OutputMode::default(),
            tracking_position: [Vec3::zeros(); 2],
            tracking_orientation: [Quat::identity(); 2],
            frustum: [Frustum::default(); 2],
            view_matrix: [Mat4::identity(); 2],
            view_matrix_pure: [Mat4::identity(); 2],
            texture_size: [None; 2],
        }
    }
}

impl RenderContext {
    pub fn new(process_index: usize, window_index: usize) -> Self {
        Self {
            process_index,
            window_index,
            ..Self::default()
        }
    }

    pub fn process_index(&self) -> usize {
        self.process_index
    }

    pub fn window_index(&self) -> usize {
        self.window_index
    }

    pub fn window_geometry(&self) -> Rect {
        self.window_geometry
    }

    pub fn screen_geometry(&self) -> Rect {
        self.screen_geometry
    }

    pub fn navigation_position(&self) -> Vec3 {
        self.navigation_position
    }

    pub fn navigation_orientation(&self) -> Quat {
        self.navigation_orientation
    }

    /// Screen wall corners: bottom left, bottom right, top left.
    pub fn screen_wall(&self) -> [Vec3; 3] {
        self.screen_wall
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Number of views (1 or 2).
    pub fn view_count(&self) -> usize {
        self.output_mode.view_count()
    }

    pub fn eye(&self, view: usize) -> Eye {
        self.output_mode.eye(view)
    }

    pub fn tracking_position(&self, view: usize) -> Vec3 {
        self.tracking_position[view]
    }

    pub fn tracking_orientation(&self, view: usize) -> Quat {
        self.tracking_orientation[view]
    }

    pub fn frustum(&self, view: usize) -> Frustum {
        self.frustum[view]
    }

    pub fn projection_matrix(&self, view: usize) -> Mat4 {
        self.frustum[view].to_matrix()
    }

    /// View matrix including navigation.
    pub fn view_matrix(&self, view: usize) -> Mat4 {
        self.view_matrix[view]
    }

    /// View matrix from tracking only.
    pub fn view_matrix_pure(&self, view: usize) -> Mat4 {
        self.view_matrix_pure[view]
    }

    /// Size of the texture of a view, `None` if the view has no texture.
    pub fn texture_size(&self, view: usize) -> Option<Extent2d> {
        self.texture_size[view]
    }

    pub(crate) fn set_geometry(&mut self, window: Rect, screen: Rect) {
        self.window_geometry = window;
        self.screen_geometry = screen;
    }

    pub(crate) fn set_navigation(&mut self, position: Vec3, orientation: Quat) {
        self.navigation_position = position;
        self.navigation_orientation = orientation;
    }

    pub(crate) fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub(crate) fn set_screen_wall(&mut self, corners: [Vec3; 3]) {
        self.screen_wall = corners;
    }

    pub(crate) fn set_tracking(&mut self, view: usize, position: Vec3, orientation: Quat) {
        self.tracking_position[view] = position;
        self.tracking_orientation[view] = orientation;
    }

    pub(crate) fn set_frustum(&mut self, view: usize, frustum: Frustum) {
        self.frustum[view] = frustum;
    }

    pub(crate) fn set_view_matrices(&mut self, view: usize, pure: Mat4, navigated: Mat4) {
        self.view_matrix_pure[view] = pure;
        self.view_matrix[view] = navigated;
    }

    pub(crate) fn set_texture_size(&mut self, view: usize, size: Option<Extent2d>) {
        self.texture_size[view] = size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_monoscopic_without_textures() {
        let ctx = RenderContext::new(1, 3);
        assert_eq!(ctx.process_index(), 1);
        assert_eq!(ctx.window_index(), 3);
        assert_eq!(ctx.view_count(), 1);
        assert_eq!(ctx.eye(0), Eye::Center);
        assert_eq!(ctx.texture_size(0), None);
        assert_eq!(ctx.texture_size(1), None);
    }
}
