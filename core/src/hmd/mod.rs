//! Head-mounted display runtime interface.
//!
//! Vendor runtimes are consumed only through [`HmdRuntime`]. Device polling
//! reads entity poses and controller inputs from it, and window backends use
//! it for per-eye projection, render-target sizing, swap chains and frame
//! submission.
//!
//! # Available runtimes
//!
//! - [`mock::MockHmd`]: scriptable in-process runtime for tests and headless sessions

pub mod mock;

use crate::error::HmdError;
use crate::frustum::EyeExtents;
use crate::math::{Quat, Vec3};
use crate::output::{Eye, HmdKind};
use crate::texture::{Extent2d, SwapChainId, TextureFormat, TextureId};

/// Standing eye height in meters applied to seated runtime poses.
pub const DEFAULT_EYE_HEIGHT: f32 = 1.76;

/// Poses below this height from an eye-tracking runtime are treated as seated.
pub const SEATED_HEIGHT_THRESHOLD: f32 = 1.1;

/// Tracked entity exposed by a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmdEntity {
    Head,
    Eye(Eye),
    /// Hand controller by runtime slot (0 = left / first, 1 = right / second).
    Controller(u8),
}

/// Input source on a runtime for button and analog polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HmdInput {
    /// Gamepad bundled with the headset.
    Remote,
    /// Hand controller by runtime slot.
    Controller(u8),
}

/// Pose reported by a runtime for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityPose {
    pub position: Vec3,
    pub orientation: Quat,
    /// `(velocity, angular_velocity)` when the runtime measures them.
    pub velocities: Option<(Vec3, Vec3)>,
}

impl EntityPose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            velocities: None,
        }
    }

    pub fn with_velocities(mut self, velocity: Vec3, angular_velocity: Vec3) -> Self {
        self.velocities = Some((velocity, angular_velocity));
        self
    }
}

/// A head-mounted display runtime.
///
/// Methods a runtime family has no use for keep their default
/// implementations: no-ops or [`HmdError::Unsupported`].
pub trait HmdRuntime: Send + Sync {
    fn kind(&self) -> HmdKind;

    /// Field of view of one eye as tangents at unit distance.
    fn eye_extents(&self, eye: Eye) -> EyeExtents;

    /// Render-target size the runtime recommends for one eye at factor 1.
    fn recommended_texture_size(&self, eye: Eye) -> Extent2d;

    /// Current pose of an entity, or `None` if the runtime has no fresh data.
    fn entity_pose(&self, entity: HmdEntity) -> Option<EntityPose>;

    /// Fill `out` with button states. Returns `false` if the input is not available.
    fn buttons(&self, _input: HmdInput, _out: &mut [bool]) -> bool {
        false
    }

    /// Fill `out` with analog states. Returns `false` if the input is not available.
    fn analogs(&self, _input: HmdInput, _out: &mut [f32]) -> bool {
        false
    }

    /// Create a runtime-owned swap chain for one eye.
    fn create_swap_chain(
        &self,
        _eye: Eye,
        _size: Extent2d,
        _format: TextureFormat,
    ) -> Result<SwapChainId, HmdError> {
        Err(HmdError::Unsupported("swap chains"))
    }

    fn destroy_swap_chain(&self, _chain: SwapChainId) {}

    /// Texture the application renders into this frame.
    fn swap_chain_texture(&self, chain: SwapChainId) -> Result<TextureId, HmdError> {
        Err(HmdError::UnknownSwapChain(chain.0))
    }

    fn commit_swap_chain(&self, _chain: SwapChainId) {}

    /// Register render buffers with the runtime's presenter.
    fn register_textures(&self, _textures: &[TextureId]) {}

    /// Hand a finished eye texture to the compositor.
    fn submit_eye_texture(&self, _eye: Eye, _texture: TextureId, _format: TextureFormat) {}

    /// Present previously registered buffers through the runtime's own presenter.
    fn present_registered(&self) {}

    /// Finish the frame: submit layers, or wait for the next frame's poses.
    fn end_frame(&self) {}

    /// Offset added to seated poses to reach a standing eye height.
    fn default_eye_height(&self) -> f32 {
        DEFAULT_EYE_HEIGHT
    }
}
