//! Per-frame render context computation and render-target management.

use std::fmt;
use std::sync::Arc;

use vrplex_core::config::{ScreenPlacement, WindowConfig};
use vrplex_core::math::{mat4_from_rotation, mat4_from_translation, Mat4, Quat, Vec3};
use vrplex_core::{
    Extent2d, Eye, Frustum, HmdKind, HmdRuntime, OutputMode, Rect, ScreenInfo, SwapChainId,
    TextureFilter, TextureFormat, TextureId,
};
use vrplex_device::Observer;

use crate::context::RenderContext;
use crate::error::{Result, WindowError};
use crate::screen_wall::{screen_wall, wall_frustum};
use crate::texture::TextureBackend;

/// Runtime-owned swap chain of one eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChain {
    pub id: SwapChainId,
    pub size: Extent2d,
}

#[derive(Debug, Clone, Copy, Default)]
struct TextureSlot {
    texture: Option<TextureId>,
    size: Option<Extent2d>,
}

/// Fills a window's [`RenderContext`] once per frame and keeps its render
/// targets sized for the output mode.
///
/// HMD output modes take projection and render-target size from the
/// runtime; every other mode looks through a screen wall and renders at the
/// window's pixel size times the resolution factor.
pub struct RenderContextBuilder {
    mode: OutputMode,
    resolution_factor: f32,
    placement: ScreenPlacement,
    fixed_to_observer: bool,
    textures: Arc<dyn TextureBackend>,
    hmd: Option<Arc<dyn HmdRuntime>>,
    slots: [TextureSlot; 2],
    swap_chains: [Option<SwapChain>; 2],
    context: RenderContext,
}

impl RenderContextBuilder {
    /// Create a builder for one window.
    ///
    /// Fails with [`WindowError::HmdUnavailable`] if the output mode needs a
    /// runtime and `hmd` is missing or of another family.
    pub fn new(
        process_index: usize,
        window_index: usize,
        config: &WindowConfig,
        textures: Arc<dyn TextureBackend>,
        hmd: Option<Arc<dyn HmdRuntime>>,
    ) -> Result<Self> {
        let mode = config.output_mode;
        let hmd = match mode.hmd_kind() {
            None => None,
            Some(kind) => match hmd {
                Some(runtime) if runtime.kind() == kind => Some(runtime),
                _ => return Err(WindowError::HmdUnavailable { mode, kind }),
            },
        };
        let mut context = RenderContext::new(process_index, window_index);
        context.set_output_mode(mode);
        Ok(Self {
            mode,
            resolution_factor: config.resolution_factor,
            placement: config.screen.clone(),
            fixed_to_observer: config.screen_is_fixed_to_observer,
            textures,
            hmd,
            slots: [TextureSlot::default(); 2],
            swap_chains: [None; 2],
            context,
        })
    }

    pub fn output_mode(&self) -> OutputMode {
        self.mode
    }

    /// Context of the last [`compute`](Self::compute) call.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn hmd(&self) -> Option<&Arc<dyn HmdRuntime>> {
        self.hmd.as_ref()
    }

    pub fn swap_chains(&self) -> [Option<SwapChain>; 2] {
        self.swap_chains
    }

    /// Compute the render context for the next frame.
    ///
    /// Returns the textures the application renders into, one per view.
    /// For swap-chain runtimes these are the chains' current buffers.
    pub fn compute(
        &mut self,
        observer: &dyn Observer,
        window: Rect,
        screen: &ScreenInfo,
        near: f32,
        far: f32,
    ) -> Result<[Option<TextureId>; 2]> {
        let navigation_position = observer.navigation_position();
        let navigation_orientation = observer.navigation_orientation();
        let wall = if matches!(self.mode, OutputMode::Oculus | OutputMode::Osvr) {
            [Vec3::zeros(); 3]
        } else {
            let tracking = self.fixed_to_observer.then(|| observer.tracking_matrix());
            screen_wall(&self.placement, &window, screen, tracking.as_ref())
        };

        self.context.set_geometry(window, screen.geometry);
        self.context
            .set_navigation(navigation_position, navigation_orientation);
        self.context.set_output_mode(self.mode);
        self.context.set_screen_wall(wall);

        for view in 0..self.mode.view_count() {
            let eye = self.mode.eye(view);
            let position = observer.tracking_position(eye);
            let orientation = observer.tracking_orientation(eye);
            self.context.set_tracking(view, position, orientation);

            let (frustum, view_orientation) = match &self.hmd {
                Some(hmd) => (
                    Frustum::from_unit_extents(&hmd.eye_extents(eye), near, far),
                    orientation,
                ),
                None => wall_frustum(&wall, &position, near, far),
            };
            self.context.set_frustum(view, frustum);

            let (pure, navigated) = view_matrices(
                position,
                view_orientation,
                navigation_position,
                navigation_orientation,
                self.fixed_to_observer,
            );
            self.context.set_view_matrices(view, pure, navigated);
        }

        if self.mode == OutputMode::Oculus {
            self.ensure_swap_chains()
        } else {
            self.ensure_textures(window.size())
        }
    }

    /// Delete all textures and destroy all swap chains.
    pub fn release(&mut self) {
        for slot in &mut self.slots {
            if let Some(texture) = slot.texture.take() {
                self.textures.delete_texture(texture);
            }
            slot.size = None;
        }
        for chain in &mut self.swap_chains {
            if let (Some(chain), Some(hmd)) = (chain.take(), &self.hmd) {
                hmd.destroy_swap_chain(chain.id);
            }
        }
    }

    fn filter(&self) -> TextureFilter {
        if self.resolution_factor == 1.0 && self.mode.is_pixel_exact() {
            TextureFilter::Nearest
        } else {
            TextureFilter::Linear
        }
    }

    fn required_size(&self, eye: Eye, window: Extent2d) -> Extent2d {
        let base = match &self.hmd {
            Some(hmd) => hmd.recommended_texture_size(eye),
            None => window,
        };
        base.scaled(self.resolution_factor)
    }

    fn ensure_textures(&mut self, window: Extent2d) -> Result<[Option<TextureId>; 2]> {
        let views = self.mode.view_count();
        let filter = self.filter();
        let format = TextureFormat::from_srgb(self.mode.wants_srgb());
        let mut needs_registering = false;

        for view in 0..views {
            let size = self.required_size(self.mode.eye(view), window);
            let slot = &mut self.slots[view];
            let texture = match slot.texture {
                Some(texture) => texture,
                None => {
                    let texture = self.textures.create_texture(filter)?;
                    slot.texture = Some(texture);
                    slot.size = None;
                    needs_registering = true;
                    texture
                }
            };
            if slot.size != Some(size) {
                log::debug!(
                    "Allocating view {} texture {} at {}x{} ({:?})",
                    view,
                    texture.raw(),
                    size.width,
                    size.height,
                    format
                );
                self.textures.allocate(texture, size, format)?;
                slot.size = Some(size);
                needs_registering = true;
            }
            self.context.set_texture_size(view, Some(size));
        }

        if views == 1 {
            if let Some(texture) = self.slots[1].texture.take() {
                self.textures.delete_texture(texture);
            }
            self.slots[1].size = None;
            self.context.set_texture_size(1, None);
        }

        if self.mode == OutputMode::Osvr && needs_registering {
            if let Some(hmd) = &self.hmd {
                let live: Vec<TextureId> = self.slots[..views]
                    .iter()
                    .filter_map(|slot| slot.texture)
                    .collect();
                hmd.register_textures(&live);
            }
        }

        Ok([self.slots[0].texture, self.slots[1].texture])
    }

    fn ensure_swap_chains(&mut self) -> Result<[Option<TextureId>; 2]> {
        let hmd = self
            .hmd
            .clone()
            .ok_or(WindowError::HmdUnavailable {
                mode: self.mode,
                kind: HmdKind::Oculus,
            })?;
        let mut textures = [None; 2];
        for (view, texture) in textures.iter_mut().enumerate() {
            let eye = self.mode.eye(view);
            let size = hmd.recommended_texture_size(eye).scaled(self.resolution_factor);
            let chain = match self.swap_chains[view] {
                Some(chain) if chain.size == size => chain,
                _ => {
                    // Forget the old chain before creating, a failed create
                    // must not leave a destroyed id behind.
                    if let Some(old) = self.swap_chains[view].take() {
                        hmd.destroy_swap_chain(old.id);
                    }
                    let id = hmd.create_swap_chain(eye, size, TextureFormat::Rgba8UnormSrgb)?;
                    log::debug!(
                        "Created swap chain {} for {:?} at {}x{}",
                        id.0,
                        eye,
                        size.width,
                        size.height
                    );
                    let chain = SwapChain { id, size };
                    self.swap_chains[view] = Some(chain);
                    chain
                }
            };
            self.context.set_texture_size(view, Some(chain.size));
            *texture = Some(hmd.swap_chain_texture(chain.id)?);
        }
        Ok(textures)
    }
}

impl Drop for RenderContextBuilder {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for RenderContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContextBuilder")
            .field("mode", &self.mode)
            .field("resolution_factor", &self.resolution_factor)
            .field("fixed_to_observer", &self.fixed_to_observer)
            .field("slots", &self.slots)
            .field("swap_chains", &self.swap_chains)
            .finish_non_exhaustive()
    }
}

/// Pure and navigated view matrices of one eye.
///
/// With a screen fixed to the observer, navigation rotation is applied
/// before the eye translation.
fn view_matrices(
    position: Vec3,
    orientation: Quat,
    navigation_position: Vec3,
    navigation_orientation: Quat,
    fixed_to_observer: bool,
) -> (Mat4, Mat4) {
    let eye_rotation = mat4_from_rotation(&orientation.inverse());
    let eye_translation = mat4_from_translation(&-position);
    let nav_rotation = mat4_from_rotation(&navigation_orientation.inverse());
    let nav_translation = mat4_from_translation(&-navigation_position);

    let pure = eye_rotation * eye_translation;
    let navigated = if fixed_to_observer {
        eye_rotation * nav_rotation * eye_translation * nav_translation
    } else {
        pure * nav_rotation * nav_translation
    };
    (pure, navigated)
}
