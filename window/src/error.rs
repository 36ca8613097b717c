//! Window error types.

use thiserror::Error;
use vrplex_core::{HmdError, HmdKind, OutputMode};

/// Errors raised while constructing a window or computing its render context.
///
/// Construction errors are fatal for the window: it is never created.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("cannot create a graphics surface: {0}")]
    SurfaceUnavailable(String),
    #[error("the surface does not share resources with the primary context")]
    SurfaceNotShared,
    #[error("quad-buffered stereo is not supported by the surface")]
    StereoUnsupported,
    #[error("output mode {mode:?} needs a {kind:?} runtime")]
    HmdUnavailable { mode: OutputMode, kind: HmdKind },
    #[error("cannot set up the output pass: {0}")]
    OutputPass(String),
    #[error("cannot load output plugin {0}")]
    PluginLoad(String),
    #[error("output plugin {path} does not provide {symbol}")]
    PluginUnresolved { path: String, symbol: &'static str },
    #[error("output plugin {0} failed to initialize")]
    PluginInit(String),
    #[error("texture backend error: {0}")]
    Texture(String),
    #[error(transparent)]
    Hmd(#[from] HmdError),
    #[error("cannot start render thread: {0}")]
    Thread(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WindowError>;
