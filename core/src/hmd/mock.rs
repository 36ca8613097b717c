//! Scriptable in-process HMD runtime.
//!
//! Does not talk to any hardware. Poses and inputs are set by the caller,
//! swap chains hand out synthetic texture ids, and every frame-related call
//! is recorded so tests can assert on the submission sequence.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use super::{EntityPose, HmdEntity, HmdInput, HmdRuntime};
use crate::error::HmdError;
use crate::frustum::EyeExtents;
use crate::output::{Eye, HmdKind};
use crate::texture::{Extent2d, SwapChainId, TextureFormat, TextureId};

const SWAP_CHAIN_LENGTH: usize = 3;

/// Frame-related call observed by [`MockHmd`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HmdCall {
    CreateSwapChain(SwapChainId, Extent2d, TextureFormat),
    DestroySwapChain(SwapChainId),
    CommitSwapChain(SwapChainId),
    RegisterTextures(Vec<TextureId>),
    SubmitEye(Eye, TextureId, TextureFormat),
    PresentRegistered,
    EndFrame,
}

#[derive(Debug)]
struct MockSwapChain {
    buffers: [TextureId; SWAP_CHAIN_LENGTH],
    current: usize,
}

#[derive(Debug, Default)]
struct MockInput {
    buttons: Vec<bool>,
    analogs: Vec<f32>,
}

/// Mock HMD runtime.
#[derive(Debug)]
pub struct MockHmd {
    kind: HmdKind,
    extents: [EyeExtents; 2],
    recommended: Mutex<Extent2d>,
    fail_swap_chains: AtomicBool,
    poses: Mutex<HashMap<HmdEntity, EntityPose>>,
    inputs: Mutex<HashMap<HmdInput, MockInput>>,
    swap_chains: Mutex<HashMap<u32, MockSwapChain>>,
    calls: Mutex<Vec<HmdCall>>,
    next_swap_chain: AtomicU32,
    next_texture: AtomicU32,
}

impl MockHmd {
    /// Create a runtime of the given family with a 100x90 degree field of view
    /// per eye and a 1080x1200 recommended render target.
    pub fn new(kind: HmdKind) -> Self {
        let left = EyeExtents::new(-1.2, 1.0, -1.1, 1.1);
        let right = EyeExtents::new(-1.0, 1.2, -1.1, 1.1);
        Self {
            kind,
            extents: [left, right],
            recommended: Mutex::new(Extent2d::new(1080, 1200)),
            fail_swap_chains: AtomicBool::new(false),
            poses: Mutex::new(HashMap::new()),
            inputs: Mutex::new(HashMap::new()),
            swap_chains: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_swap_chain: AtomicU32::new(1),
            next_texture: AtomicU32::new(0x1000),
        }
    }

    pub fn with_eye_extents(mut self, left: EyeExtents, right: EyeExtents) -> Self {
        self.extents = [left, right];
        self
    }

    pub fn with_recommended_size(mut self, size: Extent2d) -> Self {
        *self.recommended.get_mut() = size;
        self
    }

    /// Change the recommended render target size, as a runtime does when
    /// its pixel density setting changes.
    pub fn set_recommended_size(&self, size: Extent2d) {
        *self.recommended.lock() = size;
    }

    /// Make swap chain creation fail while `fail` is set.
    pub fn fail_swap_chain_creation(&self, fail: bool) {
        self.fail_swap_chains.store(fail, Ordering::Relaxed);
    }

    /// Set the pose reported for an entity.
    pub fn set_pose(&self, entity: HmdEntity, pose: EntityPose) {
        self.poses.lock().insert(entity, pose);
    }

    /// Make pose queries for an entity fail until a pose is set again.
    pub fn clear_pose(&self, entity: HmdEntity) {
        self.poses.lock().remove(&entity);
    }

    pub fn set_buttons(&self, input: HmdInput, buttons: &[bool]) {
        self.inputs.lock().entry(input).or_default().buttons = buttons.to_vec();
    }

    pub fn set_analogs(&self, input: HmdInput, analogs: &[f32]) {
        self.inputs.lock().entry(input).or_default().analogs = analogs.to_vec();
    }

    /// Calls recorded since construction or the last [`take_calls`](Self::take_calls).
    pub fn take_calls(&self) -> Vec<HmdCall> {
        std::mem::take(&mut *self.calls.lock())
    }

    /// Number of live swap chains.
    pub fn swap_chain_count(&self) -> usize {
        self.swap_chains.lock().len()
    }

    fn record(&self, call: HmdCall) {
        log::trace!("MockHmd: {:?}", call);
        self.calls.lock().push(call);
    }

    fn alloc_texture(&self) -> TextureId {
        let raw = self.next_texture.fetch_add(1, Ordering::Relaxed);
        TextureId::from_raw(raw).unwrap_or(TextureId(std::num::NonZeroU32::MIN))
    }
}

impl HmdRuntime for MockHmd {
    fn kind(&self) -> HmdKind {
        self.kind
    }

    fn eye_extents(&self, eye: Eye) -> EyeExtents {
        match eye {
            Eye::Right => self.extents[1],
            _ => self.extents[0],
        }
    }

    fn recommended_texture_size(&self, _eye: Eye) -> Extent2d {
        *self.recommended.lock()
    }

    fn entity_pose(&self, entity: HmdEntity) -> Option<EntityPose> {
        self.poses.lock().get(&entity).copied()
    }

    fn buttons(&self, input: HmdInput, out: &mut [bool]) -> bool {
        let inputs = self.inputs.lock();
        let Some(state) = inputs.get(&input) else {
            return false;
        };
        for (dst, src) in out.iter_mut().zip(&state.buttons) {
            *dst = *src;
        }
        true
    }

    fn analogs(&self, input: HmdInput, out: &mut [f32]) -> bool {
        let inputs = self.inputs.lock();
        let Some(state) = inputs.get(&input) else {
            return false;
        };
        for (dst, src) in out.iter_mut().zip(&state.analogs) {
            *dst = *src;
        }
        true
    }

    fn create_swap_chain(
        &self,
        _eye: Eye,
        size: Extent2d,
        format: TextureFormat,
    ) -> Result<SwapChainId, HmdError> {
        if self.kind != HmdKind::Oculus {
            return Err(HmdError::Unsupported("swap chains"));
        }
        if self.fail_swap_chains.load(Ordering::Relaxed) {
            return Err(HmdError::SwapChainCreation("runtime refused".into()));
        }
        if size.width == 0 || size.height == 0 {
            return Err(HmdError::SwapChainCreation(format!(
                "invalid size {}x{}",
                size.width, size.height
            )));
        }
        let id = SwapChainId(self.next_swap_chain.fetch_add(1, Ordering::Relaxed));
        let buffers = [
            self.alloc_texture(),
            self.alloc_texture(),
            self.alloc_texture(),
        ];
        self.swap_chains
            .lock()
            .insert(id.0, MockSwapChain { buffers, current: 0 });
        self.record(HmdCall::CreateSwapChain(id, size, format));
        Ok(id)
    }

    fn destroy_swap_chain(&self, chain: SwapChainId) {
        // Recorded even for unknown ids so double destroys show up.
        if self.swap_chains.lock().remove(&chain.0).is_none() {
            log::warn!("MockHmd: destroying unknown swap chain {}", chain.0);
        }
        self.record(HmdCall::DestroySwapChain(chain));
    }

    fn swap_chain_texture(&self, chain: SwapChainId) -> Result<TextureId, HmdError> {
        self.swap_chains
            .lock()
            .get(&chain.0)
            .map(|c| c.buffers[c.current])
            .ok_or(HmdError::UnknownSwapChain(chain.0))
    }

    fn commit_swap_chain(&self, chain: SwapChainId) {
        if let Some(c) = self.swap_chains.lock().get_mut(&chain.0) {
            c.current = (c.current + 1) % SWAP_CHAIN_LENGTH;
        }
        self.record(HmdCall::CommitSwapChain(chain));
    }

    fn register_textures(&self, textures: &[TextureId]) {
        self.record(HmdCall::RegisterTextures(textures.to_vec()));
    }

    fn submit_eye_texture(&self, eye: Eye, texture: TextureId, format: TextureFormat) {
        self.record(HmdCall::SubmitEye(eye, texture, format));
    }

    fn present_registered(&self) {
        self.record(HmdCall::PresentRegistered);
    }

    fn end_frame(&self) {
        self.record(HmdCall::EndFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, Vec3};

    #[test]
    fn missing_pose_is_not_ready() {
        let hmd = MockHmd::new(HmdKind::OpenVr);
        assert!(hmd.entity_pose(HmdEntity::Head).is_none());
        hmd.set_pose(
            HmdEntity::Head,
            EntityPose::new(Vec3::new(0.0, 1.0, 0.0), Quat::identity()),
        );
        assert!(hmd.entity_pose(HmdEntity::Head).is_some());
        hmd.clear_pose(HmdEntity::Head);
        assert!(hmd.entity_pose(HmdEntity::Head).is_none());
    }

    #[test]
    fn swap_chain_rotates_on_commit() {
        let hmd = MockHmd::new(HmdKind::Oculus);
        let chain = hmd
            .create_swap_chain(Eye::Left, Extent2d::new(64, 64), TextureFormat::Rgba8UnormSrgb)
            .unwrap();
        let first = hmd.swap_chain_texture(chain).unwrap();
        hmd.commit_swap_chain(chain);
        let second = hmd.swap_chain_texture(chain).unwrap();
        assert_ne!(first, second);
        hmd.destroy_swap_chain(chain);
        assert_eq!(hmd.swap_chain_count(), 0);
        assert!(hmd.swap_chain_texture(chain).is_err());
    }

    #[test]
    fn compositor_runtime_has_no_swap_chains() {
        let hmd = MockHmd::new(HmdKind::OpenVr);
        let err = hmd
            .create_swap_chain(Eye::Left, Extent2d::new(64, 64), TextureFormat::Rgba8Unorm)
            .unwrap_err();
        assert_eq!(err, HmdError::Unsupported("swap chains"));
    }

    #[test]
    fn swap_chain_creation_can_be_made_to_fail() {
        let hmd = MockHmd::new(HmdKind::Oculus);
        hmd.fail_swap_chain_creation(true);
        assert!(matches!(
            hmd.create_swap_chain(Eye::Left, Extent2d::new(64, 64), TextureFormat::Rgba8UnormSrgb),
            Err(HmdError::SwapChainCreation(_))
        ));
        hmd.fail_swap_chain_creation(false);
        hmd.set_recommended_size(Extent2d::new(200, 100));
        assert_eq!(hmd.recommended_texture_size(Eye::Left), Extent2d::new(200, 100));
        assert!(hmd
            .create_swap_chain(Eye::Left, Extent2d::new(64, 64), TextureFormat::Rgba8UnormSrgb)
            .is_ok());
    }

    #[test]
    fn inputs_are_copied_up_to_output_length() {
        let hmd = MockHmd::new(HmdKind::OpenVr);
        hmd.set_buttons(HmdInput::Controller(0), &[true, false, true]);
        let mut out = [false; 2];
        assert!(hmd.buttons(HmdInput::Controller(0), &mut out));
        assert_eq!(out, [true, false]);
        let mut analogs = [0.0; 3];
        assert!(!hmd.analogs(HmdInput::Controller(1), &mut analogs));
    }
}
