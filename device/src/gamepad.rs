//! Shared gamepad handles.
//!
//! A device may read buttons and analogs from the same physical pad. The
//! registry hands out one reference-counted [`GamepadHandle`] per physical
//! pad, so both roles hold the same handle and the pad is released exactly
//! once, when the last role drops it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{DeviceError, Result};

/// Number of buttons exposed by a gamepad.
pub const GAMEPAD_BUTTON_COUNT: usize = 18;

/// Number of axes exposed by a gamepad.
pub const GAMEPAD_AXIS_COUNT: usize = 4;

/// Snapshot of a gamepad.
///
/// Buttons are ordered up, down, left, right, L1, R1, L2, R2, L3, R3, A, B,
/// X, Y, center, guide, select, start. Axes are ordered right Y, right X,
/// left Y, left X.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GamepadState {
    pub buttons: [bool; GAMEPAD_BUTTON_COUNT],
    pub axes: [f32; GAMEPAD_AXIS_COUNT],
}

/// Window-system or OS gamepad access.
pub trait GamepadProvider: Send + Sync {
    /// Device ids of connected pads; the position in the list is the pad index.
    fn connected(&self) -> Vec<i32>;

    fn state(&self, device_id: i32) -> Option<GamepadState>;

    fn open(&self, _device_id: i32) {}

    fn release(&self, _device_id: i32) {}
}

/// An open physical gamepad.
pub struct GamepadHandle {
    device_id: i32,
    provider: Arc<dyn GamepadProvider>,
}

impl GamepadHandle {
    pub fn device_id(&self) -> i32 {
        self.device_id
    }

    pub fn state(&self) -> Option<GamepadState> {
        self.provider.state(self.device_id)
    }
}

impl std::fmt::Debug for GamepadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadHandle")
            .field("device_id", &self.device_id)
            .finish_non_exhaustive()
    }
}

impl Drop for GamepadHandle {
    fn drop(&mut self) {
        log::debug!("Releasing gamepad {}", self.device_id);
        self.provider.release(self.device_id);
    }
}

/// Hands out shared gamepad handles by pad index.
#[derive(Default)]
pub struct GamepadRegistry {
    provider: Option<Arc<dyn GamepadProvider>>,
    open: Mutex<HashMap<i32, Weak<GamepadHandle>>>,
}

impl GamepadRegistry {
    pub fn new(provider: Option<Arc<dyn GamepadProvider>>) -> Self {
        Self {
            provider,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Open the pad at `pad_index`, reusing a live handle for the same physical pad.
    pub fn open(&self, pad_index: i64) -> Result<Arc<GamepadHandle>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(DeviceError::NoGamepadProvider)?;
        let connected = provider.connected();
        let device_id = usize::try_from(pad_index)
            .ok()
            .and_then(|i| connected.get(i).copied())
            .ok_or(DeviceError::GamepadNotConnected(pad_index))?;

        let mut open = self.open.lock();
        if let Some(handle) = open.get(&device_id).and_then(Weak::upgrade) {
            return Ok(handle);
        }
        provider.open(device_id);
        let handle = Arc::new(GamepadHandle {
            device_id,
            provider: Arc::clone(provider),
        });
        open.insert(device_id, Arc::downgrade(&handle));
        Ok(handle)
    }
}

impl std::fmt::Debug for GamepadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadRegistry")
            .field("has_provider", &self.provider.is_some())
            .field("open", &self.open.lock().len())
            .finish()
    }
}

/// In-memory gamepads for tests and headless sessions.
#[derive(Debug, Default)]
pub struct DummyGamepads {
    pads: Mutex<Vec<(i32, GamepadState)>>,
    opened: Mutex<Vec<i32>>,
    released: Mutex<Vec<i32>>,
}

impl DummyGamepads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a pad; it takes the next pad index.
    pub fn connect(&self, device_id: i32) {
        self.pads.lock().push((device_id, GamepadState::default()));
    }

    pub fn set_state(&self, device_id: i32, state: GamepadState) {
        if let Some(pad) = self.pads.lock().iter_mut().find(|(id, _)| *id == device_id) {
            pad.1 = state;
        }
    }

    pub fn opened(&self) -> Vec<i32> {
        self.opened.lock().clone()
    }

    pub fn released(&self) -> Vec<i32> {
        self.released.lock().clone()
    }
}

impl GamepadProvider for DummyGamepads {
    fn connected(&self) -> Vec<i32> {
        self.pads.lock().iter().map(|(id, _)| *id).collect()
    }

    fn state(&self, device_id: i32) -> Option<GamepadState> {
        self.pads
            .lock()
            .iter()
            .find(|(id, _)| *id == device_id)
            .map(|(_, state)| *state)
    }

    fn open(&self, device_id: i32) {
        self.opened.lock().push(device_id);
    }

    fn release(&self, device_id: i32) {
        self.released.lock().push(device_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(ids: &[i32]) -> (Arc<DummyGamepads>, GamepadRegistry) {
        let pads = Arc::new(DummyGamepads::new());
        for id in ids {
            pads.connect(*id);
        }
        let registry = GamepadRegistry::new(Some(pads.clone() as Arc<dyn GamepadProvider>));
        (pads, registry)
    }

    #[test]
    fn same_pad_is_shared() {
        let (pads, registry) = registry_with(&[40, 41]);
        let a = registry.open(1).unwrap();
        let b = registry.open(1).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.device_id(), 41);
        assert_eq!(pads.opened(), vec![41]);
        drop(a);
        assert!(pads.released().is_empty());
        drop(b);
        assert_eq!(pads.released(), vec![41]);
    }

    #[test]
    fn different_pads_are_distinct() {
        let (_pads, registry) = registry_with(&[40, 41]);
        let a = registry.open(0).unwrap();
        let b = registry.open(1).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn reopen_after_release_creates_new_handle() {
        let (pads, registry) = registry_with(&[7]);
        drop(registry.open(0).unwrap());
        let _again = registry.open(0).unwrap();
        assert_eq!(pads.opened(), vec![7, 7]);
    }

    #[test]
    fn invalid_indices() {
        let (_pads, registry) = registry_with(&[7]);
        assert!(matches!(
            registry.open(1),
            Err(DeviceError::GamepadNotConnected(1))
        ));
        assert!(matches!(
            registry.open(-1),
            Err(DeviceError::GamepadNotConnected(-1))
        ));
        assert!(matches!(
            GamepadRegistry::default().open(0),
            Err(DeviceError::NoGamepadProvider)
        ));
    }

    #[test]
    fn handle_reads_state() {
        let (pads, registry) = registry_with(&[3]);
        let mut state = GamepadState::default();
        state.buttons[10] = true;
        state.axes[3] = -0.75;
        pads.set_state(3, state);
        assert_eq!(registry.open(0).unwrap().state(), Some(state));
    }
}
