//! Process-wide backend state passed explicitly to devices and windows.

use std::sync::Arc;

use vrplex_core::{Clock, HmdKind, HmdRuntime, MonotonicClock};

use crate::callback::CallbackHub;
use crate::error::{DeviceError, Result};
use crate::gamepad::{GamepadProvider, GamepadRegistry};
use crate::interface::InterfaceProvider;

/// Backend state shared by every device and window of one process.
///
/// Built once at startup and passed by reference. Dropping it after all
/// devices and windows releases the runtimes it holds.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vrplex_core::config::{DeviceConfig, TrackingType};
/// use vrplex_core::hmd::mock::MockHmd;
/// use vrplex_core::HmdKind;
/// use vrplex_device::{DummyGamepads, RuntimeContext, TrackedDevice, TrackingBackend};
///
/// let config = DeviceConfig::new("head").with_tracking(TrackingType::OpenVr, "head");
/// let ctx = RuntimeContext::new(0)
///     .with_hmd(Arc::new(MockHmd::new(HmdKind::OpenVr)))
///     .with_gamepads(Arc::new(DummyGamepads::new()));
/// let mut device = TrackedDevice::new(0, &config, &ctx);
/// device.update(&ctx);
/// assert!(matches!(device.tracking_backend(), Some(TrackingBackend::Hmd { .. })));
/// ```
pub struct RuntimeContext {
    process_index: usize,
    clock: Arc<dyn Clock>,
    hmd: Option<Arc<dyn HmdRuntime>>,
    gamepads: GamepadRegistry,
    callbacks: CallbackHub,
    interfaces: Option<Arc<dyn InterfaceProvider>>,
}

impl RuntimeContext {
    /// Context for the process with the given index, using the system monotonic clock.
    pub fn new(process_index: usize) -> Self {
        Self {
            process_index,
            clock: Arc::new(MonotonicClock::new()),
            hmd: None,
            gamepads: GamepadRegistry::default(),
            callbacks: CallbackHub::new(),
            interfaces: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hmd(mut self, hmd: Arc<dyn HmdRuntime>) -> Self {
        log::info!("Using {:?} runtime", hmd.kind());
        self.hmd = Some(hmd);
        self
    }

    pub fn with_gamepads(mut self, provider: Arc<dyn GamepadProvider>) -> Self {
        self.gamepads = GamepadRegistry::new(Some(provider));
        self
    }

    pub fn with_interfaces(mut self, provider: Arc<dyn InterfaceProvider>) -> Self {
        self.interfaces = Some(provider);
        self
    }

    pub fn process_index(&self) -> usize {
        self.process_index
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn hmd(&self) -> Option<&Arc<dyn HmdRuntime>> {
        self.hmd.as_ref()
    }

    /// The HMD runtime, if it belongs to the requested family.
    pub fn hmd_of_kind(&self, kind: HmdKind) -> Result<Arc<dyn HmdRuntime>> {
        self.hmd
            .as_ref()
            .filter(|hmd| hmd.kind() == kind)
            .cloned()
            .ok_or(DeviceError::RuntimeUnavailable(kind))
    }

    pub fn gamepads(&self) -> &GamepadRegistry {
        &self.gamepads
    }

    pub fn callbacks(&self) -> &CallbackHub {
        &self.callbacks
    }

    pub fn interfaces(&self) -> Result<Arc<dyn InterfaceProvider>> {
        self.interfaces
            .clone()
            .ok_or(DeviceError::NoInterfaceProvider)
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("process_index", &self.process_index)
            .field("hmd", &self.hmd.as_ref().map(|h| h.kind()))
            .field("gamepads", &self.gamepads)
            .field("callbacks", &self.callbacks.len())
            .field("interfaces", &self.interfaces.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrplex_core::hmd::mock::MockHmd;

    #[test]
    fn hmd_kind_must_match() {
        let ctx = RuntimeContext::new(0).with_hmd(Arc::new(MockHmd::new(HmdKind::OpenVr)));
        assert!(ctx.hmd_of_kind(HmdKind::OpenVr).is_ok());
        assert!(matches!(
            ctx.hmd_of_kind(HmdKind::Oculus),
            Err(DeviceError::RuntimeUnavailable(HmdKind::Oculus))
        ));
    }

    #[test]
    fn no_providers_by_default() {
        let ctx = RuntimeContext::new(2);
        assert_eq!(ctx.process_index(), 2);
        assert!(ctx.hmd().is_none());
        assert!(ctx.interfaces().is_err());
    }
}
