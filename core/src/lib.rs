//! # vrplex core
//!
//! Types shared by every vrplex crate: math aliases, pose samples and
//! clocks, frustums, output modes, render-target handles, window geometry,
//! input codes, the session configuration and the HMD runtime interface.

pub mod config;
pub mod error;
pub mod frustum;
pub mod geometry;
pub mod hmd;
pub mod input;
pub mod math;
pub mod output;
pub mod pose;
pub mod texture;

pub use config::Config;
pub use error::{ConfigError, HmdError};
pub use frustum::{EyeExtents, Frustum};
pub use geometry::{Rect, ScreenInfo};
pub use hmd::{EntityPose, HmdEntity, HmdInput, HmdRuntime};
pub use output::{Eye, HmdKind, OutputMode};
pub use pose::{Clock, ManualClock, MonotonicClock, PoseSample, Timestamp};
pub use texture::{Extent2d, SwapChainId, TextureFilter, TextureFormat, TextureId};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("vrplex core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
