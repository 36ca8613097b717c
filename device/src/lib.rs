//! # vrplex device
//!
//! Tracked input devices and the observers built from them.
//!
//! A [`TrackedDevice`] binds each of its three channels (tracking, buttons,
//! analogs) to one backend when it is created and polls them once per frame
//! in [`TrackedDevice::update`]. Velocities are estimated by finite
//! differences unless the backend measures them.
//!
//! Backend state that used to be process global (HMD runtime, gamepads,
//! network callback slots, path interfaces, the clock) lives in a
//! [`RuntimeContext`] that is passed by reference.
//!
//! # Backends
//!
//! - `static`: fixed values from configuration
//! - `vrpn`: push reports through [`CallbackHub`] snapshot slots
//! - `gamepad`: shared [`GamepadHandle`]s from the [`GamepadRegistry`]
//! - `oculus` / `openvr`: entities and inputs of an [`vrplex_core::HmdRuntime`]
//! - `osvr`: eye entities of the runtime, or [`InterfaceProvider`] paths

pub mod backend;
pub mod callback;
mod device;
mod error;
pub mod gamepad;
pub mod interface;
mod observer;
mod runtime;

pub use backend::{AnalogsBackend, ButtonsBackend, TrackingBackend, TrackingPoll};
pub use callback::{CallbackHub, CallbackSource, TrackerSlot};
pub use device::{DeviceState, TrackedDevice};
pub use error::{DeviceError, Result};
pub use gamepad::{DummyGamepads, GamepadHandle, GamepadProvider, GamepadRegistry, GamepadState};
pub use interface::{DummyInterfaces, InterfaceId, InterfaceProvider};
pub use observer::{Observer, TrackedObserver};
pub use runtime::RuntimeContext;

/// Device library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("vrplex device v{} initialized", VERSION);
}
