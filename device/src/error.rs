//! Device error types.

use thiserror::Error;

/// Errors raised while binding a device to a backend or decoding replicated state.
///
/// Binding errors never abort a session; the device logs them and stays inert.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("invalid {channel} parameter \"{parameter}\"")]
    InvalidParameter {
        channel: &'static str,
        parameter: String,
    },
    #[error("gamepad {0} is not connected")]
    GamepadNotConnected(i64),
    #[error("no gamepad provider is available")]
    NoGamepadProvider,
    #[error("no {0:?} runtime is available")]
    RuntimeUnavailable(vrplex_core::HmdKind),
    #[error("no interface provider is available")]
    NoInterfaceProvider,
    #[error("interface path {0} does not exist")]
    UnknownInterface(String),
    #[error("replicated state belongs to device {found}, expected {expected}")]
    StateMismatch { expected: usize, found: usize },
    #[error("replicated state of device {device} has {found} {channel}, expected {expected}")]
    StateSizeMismatch {
        device: usize,
        channel: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("failed to encode or decode device state: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
