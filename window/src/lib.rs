//! # vrplex window
//!
//! Output windows and the per-frame render pipeline.
//!
//! Once per frame and window the application calls
//! [`Window::compute_render_context`], renders its scene into the returned
//! textures using the [`RenderContext`], and then drives the window's
//! render thread through [`Window::render_to_screen`],
//! [`Window::async_swap_buffers`] and [`Window::wait_for_swap_buffers`].
//!
//! The graphics API and the window system are reached through
//! [`TextureBackend`], [`WindowSystem`] and [`PresentSurface`]; vendor HMD
//! runtimes through [`vrplex_core::HmdRuntime`].

pub mod builder;
pub mod context;
mod error;
pub mod event;
pub mod plugin;
pub mod runtime_sync;
pub mod screen_wall;
pub mod surface;
pub mod texture;
pub mod thread;
mod window;

pub use builder::{RenderContextBuilder, SwapChain};
pub use context::RenderContext;
pub use error::{Result, WindowError};
pub use event::{Event, EventKind, EventQueue};
pub use plugin::{OutputPlugin, PluginLoader, StaticPlugin, StaticPluginLoader};
pub use runtime_sync::FrameSync;
pub use surface::{
    HeadlessWindowSystem, NativeWindow, PresentSurface, SurfaceCall, SurfaceFormat, WindowSystem,
};
pub use texture::{DummyTextureBackend, TextureBackend};
pub use thread::{RenderWorker, WindowRenderThread};
pub use window::{Frame, RenderCallback, Window, WindowEnv, WindowInfo};

/// Window library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version.
pub fn init() {
    log::info!("vrplex window v{} initialized", VERSION);
}
