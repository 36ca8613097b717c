//! Output plugins.
//!
//! An output plugin replaces the built-in output pass of a window. It is
//! configured as `"path arg1 arg2 ..."`; the path names a library that must
//! provide three entry points:
//!
//! - [`INIT_SYMBOL`]: called once with the window and the arguments, returns
//!   `false` on failure
//! - [`PRESENT_SYMBOL`]: called on the render thread once per frame with the
//!   render context and the view textures
//! - [`SHUTDOWN_SYMBOL`]: called once when the window is destroyed
//!
//! Libraries are found through a [`PluginLoader`]. [`StaticPluginLoader`]
//! serves libraries registered in-process.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use vrplex_core::TextureId;

use crate::context::RenderContext;
use crate::error::{Result, WindowError};
use crate::window::WindowInfo;

pub const INIT_SYMBOL: &str = "vrplex_output_plugin_init";
pub const SHUTDOWN_SYMBOL: &str = "vrplex_output_plugin_shutdown";
pub const PRESENT_SYMBOL: &str = "vrplex_output_plugin_present";

pub type InitFn = dyn Fn(&WindowInfo, &[String]) -> bool + Send + Sync;
pub type ShutdownFn = dyn Fn(&WindowInfo) + Send + Sync;
pub type PresentFn = dyn Fn(&WindowInfo, &RenderContext, &[Option<TextureId>; 2]) + Send + Sync;

/// Entry point resolved from a plugin library.
#[derive(Clone)]
pub enum PluginSymbol {
    Init(Arc<InitFn>),
    Shutdown(Arc<ShutdownFn>),
    Present(Arc<PresentFn>),
}

impl fmt::Debug for PluginSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSymbol::Init(_) => f.write_str("Init"),
            PluginSymbol::Shutdown(_) => f.write_str("Shutdown"),
            PluginSymbol::Present(_) => f.write_str("Present"),
        }
    }
}

/// A loaded plugin library.
pub trait PluginLibrary: Send + Sync {
    fn resolve(&self, symbol: &str) -> Option<PluginSymbol>;
}

/// Finds plugin libraries by path.
pub trait PluginLoader: Send + Sync {
    fn load(&self, path: &str) -> Option<Arc<dyn PluginLibrary>>;
}

/// Plugin library assembled from closures.
///
/// # Example
///
/// ```ignore
/// let plugin = StaticPlugin::new()
///     .with_init(|_window, args| args.is_empty())
///     .with_shutdown(|_window| {})
///     .with_present(|_window, ctx, textures| warp(ctx, textures));
/// loader.register("libwarp.so", plugin);
/// ```
#[derive(Default, Clone)]
pub struct StaticPlugin {
    symbols: HashMap<&'static str, PluginSymbol>,
}

impl StaticPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_init<F>(mut self, f: F) -> Self
    where
        F: Fn(&WindowInfo, &[String]) -> bool + Send + Sync + 'static,
    {
        self.symbols.insert(INIT_SYMBOL, PluginSymbol::Init(Arc::new(f)));
        self
    }

    pub fn with_shutdown<F>(mut self, f: F) -> Self
    where
        F: Fn(&WindowInfo) + Send + Sync + 'static,
    {
        self.symbols
            .insert(SHUTDOWN_SYMBOL, PluginSymbol::Shutdown(Arc::new(f)));
        self
    }

    pub fn with_present<F>(mut self, f: F) -> Self
    where
        F: Fn(&WindowInfo, &RenderContext, &[Option<TextureId>; 2]) + Send + Sync + 'static,
    {
        self.symbols
            .insert(PRESENT_SYMBOL, PluginSymbol::Present(Arc::new(f)));
        self
    }
}

impl PluginLibrary for StaticPlugin {
    fn resolve(&self, symbol: &str) -> Option<PluginSymbol> {
        self.symbols.get(symbol).cloned()
    }
}

impl fmt::Debug for StaticPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.symbols.keys()).finish()
    }
}

/// In-process registry of plugin libraries keyed by path.
#[derive(Default)]
pub struct StaticPluginLoader {
    libraries: RwLock<HashMap<String, Arc<dyn PluginLibrary>>>,
}

impl StaticPluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: impl Into<String>, library: impl PluginLibrary + 'static) {
        self.libraries.write().insert(path.into(), Arc::new(library));
    }
}

impl PluginLoader for StaticPluginLoader {
    fn load(&self, path: &str) -> Option<Arc<dyn PluginLibrary>> {
        self.libraries.read().get(path).cloned()
    }
}

impl fmt::Debug for StaticPluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.libraries.read().keys())
            .finish()
    }
}

/// An initialized output plugin bound to one window.
#[derive(Clone)]
pub struct OutputPlugin {
    path: String,
    window: WindowInfo,
    shutdown: Arc<ShutdownFn>,
    present: Arc<PresentFn>,
}

impl OutputPlugin {
    /// Load, resolve and initialize the plugin given by `spec`.
    ///
    /// Every failure is fatal for the window.
    pub fn load(spec: &str, loader: &dyn PluginLoader, window: &WindowInfo) -> Result<Self> {
        let mut parts = spec.split_whitespace();
        let path = parts.next().unwrap_or_default().to_owned();
        let args: Vec<String> = parts.map(str::to_owned).collect();

        let library = loader
            .load(&path)
            .ok_or_else(|| WindowError::PluginLoad(path.clone()))?;
        let unresolved = |symbol| WindowError::PluginUnresolved {
            path: path.clone(),
            symbol,
        };
        let Some(PluginSymbol::Init(init)) = library.resolve(INIT_SYMBOL) else {
            return Err(unresolved(INIT_SYMBOL));
        };
        let Some(PluginSymbol::Shutdown(shutdown)) = library.resolve(SHUTDOWN_SYMBOL) else {
            return Err(unresolved(SHUTDOWN_SYMBOL));
        };
        let Some(PluginSymbol::Present(present)) = library.resolve(PRESENT_SYMBOL) else {
            return Err(unresolved(PRESENT_SYMBOL));
        };

        if !init(window, &args) {
            return Err(WindowError::PluginInit(path));
        }
        log::info!("Window {}: output plugin {} initialized", window.id, path);
        Ok(Self {
            path,
            window: window.clone(),
            shutdown,
            present,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn present(&self, context: &RenderContext, textures: &[Option<TextureId>; 2]) {
        (self.present)(&self.window, context, textures);
    }

    pub fn shutdown(&self) {
        log::debug!("Window {}: shutting down output plugin {}", self.window.id, self.path);
        (self.shutdown)(&self.window);
    }
}

impl fmt::Debug for OutputPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPlugin")
            .field("path", &self.path)
            .field("window", &self.window.id)
            .finish_non_exhaustive()
    }
}
