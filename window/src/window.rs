//! Output windows.

use std::fmt;
use std::sync::Arc;

use vrplex_core::config::{Config, WindowConfig};
use vrplex_core::input::is_fullscreen_shortcut;
use vrplex_core::{HmdRuntime, OutputMode, Rect, ScreenInfo, TextureFormat, TextureId};
use vrplex_device::Observer;

use crate::builder::{RenderContextBuilder, SwapChain};
use crate::context::RenderContext;
use crate::error::{Result, WindowError};
use crate::event::{Event, EventKind, EventQueue};
use crate::plugin::{OutputPlugin, PluginLoader, StaticPluginLoader};
use crate::runtime_sync::FrameSync;
use crate::surface::{
    DrawBuffer, NativeWindow, OutputQuad, PresentSurface, SurfaceFormat, WindowSystem,
};
use crate::texture::TextureBackend;
use crate::thread::{RenderWorker, WindowRenderThread};

/// Identity of a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: String,
    /// Index among the windows of its process.
    pub index: usize,
    pub process: usize,
    pub output_mode: OutputMode,
}

/// Data of one frame handed to the presentation side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub context: RenderContext,
    pub textures: [Option<TextureId>; 2],
    pub swap_chains: [Option<SwapChain>; 2],
}

/// Application callback run on the render thread before the output stage.
pub type RenderCallback = Box<dyn FnMut(&Frame) + Send>;

/// Services a window is created with.
#[derive(Clone)]
pub struct WindowEnv {
    pub system: Arc<dyn WindowSystem>,
    pub textures: Arc<dyn TextureBackend>,
    pub hmd: Option<Arc<dyn HmdRuntime>>,
    pub plugins: Arc<dyn PluginLoader>,
    pub events: EventQueue,
}

impl WindowEnv {
    pub fn new(system: Arc<dyn WindowSystem>, textures: Arc<dyn TextureBackend>) -> Self {
        Self {
            system,
            textures,
            hmd: None,
            plugins: Arc::new(StaticPluginLoader::new()),
            events: EventQueue::new(),
        }
    }

    pub fn with_hmd(mut self, hmd: Arc<dyn HmdRuntime>) -> Self {
        self.hmd = Some(hmd);
        self
    }

    pub fn with_plugins(mut self, plugins: Arc<dyn PluginLoader>) -> Self {
        self.plugins = plugins;
        self
    }

    pub fn with_events(mut self, events: EventQueue) -> Self {
        self.events = events;
        self
    }
}

impl fmt::Debug for WindowEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowEnv")
            .field("hmd", &self.hmd.as_ref().map(|h| h.kind()))
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

/// Render-thread side of a window: output stage and buffer swap.
struct OutputWorker {
    mode: OutputMode,
    surface: Box<dyn PresentSurface>,
    plugin: Option<OutputPlugin>,
    hmd: Option<Arc<dyn HmdRuntime>>,
    render: Option<RenderCallback>,
    swap_chains: [Option<SwapChain>; 2],
}

impl OutputWorker {
    fn render_output(&mut self, frame: &Frame) {
        if let Some(plugin) = &self.plugin {
            plugin.present(&frame.context, &frame.textures);
            return;
        }
        if let (OutputMode::Osvr, Some(hmd)) = (self.mode, &self.hmd) {
            hmd.present_registered();
            return;
        }

        let viewport = frame.context.window_geometry().size();
        let [left, right] = frame.textures;
        if self.mode == OutputMode::Stereo {
            for (target, texture) in [(DrawBuffer::BackLeft, left), (DrawBuffer::BackRight, right)] {
                self.surface.draw_output(&OutputQuad {
                    mode: self.mode,
                    target,
                    textures: [texture, None],
                    viewport,
                });
            }
        } else {
            self.surface.draw_output(&OutputQuad {
                mode: self.mode,
                target: DrawBuffer::Back,
                textures: frame.textures,
                viewport,
            });
        }

        if let (OutputMode::OpenVr, Some(hmd)) = (self.mode, &self.hmd) {
            for (view, texture) in frame.textures.iter().enumerate() {
                if let Some(texture) = texture {
                    hmd.submit_eye_texture(self.mode.eye(view), *texture, TextureFormat::Rgba8Unorm);
                }
            }
        }
    }
}

impl RenderWorker<Frame> for OutputWorker {
    fn begin(&mut self) {
        self.surface.make_current();
    }

    fn render(&mut self, frame: &Frame) {
        if let Some(render) = &mut self.render {
            render(frame);
        }
        self.swap_chains = frame.swap_chains;
        self.render_output(frame);
    }

    fn swap(&mut self) {
        match (self.mode, &self.hmd) {
            (OutputMode::Oculus, Some(hmd)) => {
                for chain in self.swap_chains.iter().flatten() {
                    hmd.commit_swap_chain(chain.id);
                }
                hmd.end_frame();
            }
            (OutputMode::OpenVr, Some(hmd)) => hmd.end_frame(),
            _ => self.surface.swap_buffers(),
        }
    }

    fn end(&mut self) {
        self.surface.done_current();
    }
}

enum Presenter {
    Thread(WindowRenderThread<Frame>),
    Runtime {
        sync: Arc<FrameSync<Frame>>,
        pending: Option<Frame>,
        submitted: bool,
        _surface: Box<dyn PresentSurface>,
    },
    Stopped,
}

/// An output window of the local process.
///
/// Each window renders on its own thread, except for runtimes that present
/// from a thread of their own; those get frames through a [`FrameSync`].
///
/// # Example
///
/// ```ignore
/// let mut window = Window::new(0, 0, &config, &env, None)?;
/// loop {
///     let textures = window.compute_render_context(&observer, 0.05, 100.0)?;
///     // render the scene into `textures`
///     window.render_to_screen();
///     window.async_swap_buffers();
///     window.wait_for_swap_buffers();
/// }
/// ```
pub struct Window {
    info: WindowInfo,
    config: WindowConfig,
    native: Box<dyn NativeWindow>,
    screens: Vec<ScreenInfo>,
    builder: RenderContextBuilder,
    textures: [Option<TextureId>; 2],
    presenter: Presenter,
    plugin: Option<OutputPlugin>,
    events: EventQueue,
}

impl Window {
    /// Create and show a window.
    ///
    /// Any error is fatal for the window.
    pub fn new(
        index: usize,
        process: usize,
        config: &WindowConfig,
        env: &WindowEnv,
        render: Option<RenderCallback>,
    ) -> Result<Self> {
        let info = WindowInfo {
            id: config.id.clone(),
            index,
            process,
            output_mode: config.output_mode,
        };
        log::info!(
            "Creating window {} (process {}, {:?})",
            info.id,
            process,
            info.output_mode
        );
        let window = Self::create(info, config, env, render);
        if let Err(err) = &window {
            log::error!("Window {}: {}", config.id, err);
        }
        window
    }

    /// Create every window of a process in configuration order.
    pub fn for_process(config: &Config, process: usize, env: &WindowEnv) -> Result<Vec<Self>> {
        let Some(process_config) = config.processes.get(process) else {
            return Ok(Vec::new());
        };
        process_config
            .windows
            .iter()
            .enumerate()
            .map(|(index, window)| Self::new(index, process, window, env, None))
            .collect()
    }

    fn create(
        info: WindowInfo,
        config: &WindowConfig,
        env: &WindowEnv,
        render: Option<RenderCallback>,
    ) -> Result<Self> {
        let mode = config.output_mode;
        let format = SurfaceFormat::for_output_mode(mode);
        let screens = env.system.screens();
        if screens.is_empty() {
            return Err(WindowError::SurfaceUnavailable("no screens".into()));
        }

        let (mut native, mut surface) = env.system.create_window(&config.id, format)?;
        if !surface.shares_resources() {
            return Err(WindowError::SurfaceNotShared);
        }
        if format.stereo && !surface.format().stereo {
            return Err(WindowError::StereoUnsupported);
        }

        let builder = RenderContextBuilder::new(
            info.process,
            info.index,
            config,
            env.textures.clone(),
            env.hmd.clone(),
        )?;

        let plugin = match &config.output_plugin {
            Some(spec) => Some(OutputPlugin::load(spec, env.plugins.as_ref(), &info)?),
            None => {
                if mode != OutputMode::GoogleVr {
                    surface.init_output_pass().map_err(WindowError::OutputPass)?;
                }
                None
            }
        };

        apply_initial_geometry(
            native.as_mut(),
            config,
            &screens,
            env.system.primary_screen(),
        );
        native.show();

        let presenter = if mode == OutputMode::GoogleVr {
            Presenter::Runtime {
                sync: Arc::new(FrameSync::new()),
                pending: None,
                submitted: false,
                _surface: surface,
            }
        } else {
            let worker = OutputWorker {
                mode,
                surface,
                plugin: plugin.clone(),
                hmd: builder.hmd().cloned(),
                render,
                swap_chains: [None; 2],
            };
            let name = format!("vrplex-window-{}", info.id);
            match WindowRenderThread::spawn(name, Frame::default(), worker) {
                Ok(thread) => Presenter::Thread(thread),
                Err(err) => {
                    if let Some(plugin) = &plugin {
                        plugin.shutdown();
                    }
                    return Err(err.into());
                }
            }
        };

        log::debug!(
            "Window {} at {:?} on screen {}",
            info.id,
            native.geometry(),
            native.screen()
        );
        Ok(Self {
            info,
            config: config.clone(),
            native,
            screens,
            builder,
            textures: [None; 2],
            presenter,
            plugin,
            events: env.events.clone(),
        })
    }

    pub fn info(&self) -> &WindowInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn index(&self) -> usize {
        self.info.index
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn geometry(&self) -> Rect {
        self.native.geometry()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.native.is_fullscreen()
    }

    /// Context of the last [`compute_render_context`](Self::compute_render_context) call.
    pub fn render_context(&self) -> &RenderContext {
        self.builder.context()
    }

    /// Textures of the last [`compute_render_context`](Self::compute_render_context) call.
    pub fn textures(&self) -> [Option<TextureId>; 2] {
        self.textures
    }

    /// Frame exchange for runtimes that present on their own thread.
    pub fn frame_sync(&self) -> Option<Arc<FrameSync<Frame>>> {
        match &self.presenter {
            Presenter::Runtime { sync, .. } => Some(sync.clone()),
            _ => None,
        }
    }

    /// Compute the render context of the next frame and make sure the
    /// render targets exist at the right size.
    ///
    /// Returns the textures the application renders into.
    pub fn compute_render_context(
        &mut self,
        observer: &dyn Observer,
        near: f32,
        far: f32,
    ) -> Result<[Option<TextureId>; 2]> {
        let geometry = self.native.geometry();
        let screen = self.current_screen();
        let textures = self.builder.compute(observer, geometry, &screen, near, far)?;
        self.textures = textures;
        let frame = Frame {
            context: self.builder.context().clone(),
            textures,
            swap_chains: self.builder.swap_chains(),
        };
        match &mut self.presenter {
            Presenter::Thread(thread) => {
                if let Some(slot) = thread.frame_mut() {
                    *slot = frame;
                }
            }
            Presenter::Runtime { pending, .. } => *pending = Some(frame),
            Presenter::Stopped => {}
        }
        Ok(textures)
    }

    /// Present the textures; returns when the output stage has run.
    pub fn render_to_screen(&mut self) {
        match &mut self.presenter {
            Presenter::Thread(thread) => thread.render_to_screen(),
            Presenter::Runtime {
                sync,
                pending,
                submitted,
                ..
            } => {
                if let Some(frame) = pending.take() {
                    sync.submit(frame);
                    *submitted = true;
                }
            }
            Presenter::Stopped => {}
        }
    }

    /// Start the buffer swap without waiting for it.
    pub fn async_swap_buffers(&mut self) {
        if let Presenter::Thread(thread) = &mut self.presenter {
            thread.async_swap_buffers();
        }
    }

    /// Wait for the buffer swap, or for the runtime to present the frame.
    pub fn wait_for_swap_buffers(&mut self) {
        match &mut self.presenter {
            Presenter::Thread(thread) => thread.wait_for_swap_buffers(),
            Presenter::Runtime {
                sync, submitted, ..
            } => {
                if std::mem::take(submitted) {
                    sync.wait_presented();
                }
            }
            Presenter::Stopped => {}
        }
    }

    /// Deliver an input event from the window system.
    ///
    /// The fullscreen shortcuts toggle fullscreen; everything else goes to
    /// the event queue together with the current render context.
    pub fn handle_event(&mut self, kind: EventKind) {
        if let EventKind::KeyPress { key, modifiers } = kind {
            if is_fullscreen_shortcut(key, modifiers) {
                let fullscreen = !self.native.is_fullscreen();
                log::debug!("Window {}: fullscreen {}", self.info.id, fullscreen);
                self.native.set_fullscreen(fullscreen);
                return;
            }
        }
        self.events.push(Event {
            window: self.info.index,
            kind,
            context: self.builder.context().clone(),
        });
    }

    /// Stop rendering and release all resources. Also done on drop.
    pub fn shutdown(&mut self) {
        if matches!(self.presenter, Presenter::Stopped) {
            return;
        }
        if let Presenter::Thread(mut thread) =
            std::mem::replace(&mut self.presenter, Presenter::Stopped)
        {
            thread.shutdown();
        }
        if let Some(plugin) = self.plugin.take() {
            plugin.shutdown();
        }
        self.builder.release();
        log::info!("Window {} destroyed", self.info.id);
    }

    fn current_screen(&self) -> ScreenInfo {
        let index = self.native.screen();
        self.screens
            .get(index)
            .or_else(|| self.screens.first())
            .copied()
            .unwrap_or_else(|| ScreenInfo::new(self.native.geometry(), [1.0, 1.0]))
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("info", &self.info)
            .field("geometry", &self.native.geometry())
            .field("builder", &self.builder)
            .field("plugin", &self.plugin)
            .finish_non_exhaustive()
    }
}

fn apply_initial_geometry(
    native: &mut dyn NativeWindow,
    config: &WindowConfig,
    screens: &[ScreenInfo],
    primary: usize,
) {
    let index = match config.initial_screen {
        Some(index) if index < screens.len() => index,
        Some(index) => {
            log::warn!(
                "Window {}: screen {} does not exist, using the primary screen",
                config.id,
                index
            );
            primary
        }
        None => primary,
    };
    let Some(screen) = screens.get(index).or_else(|| screens.first()) else {
        return;
    };
    native.set_screen(index);

    let [width, height] = config.initial_size;
    if config.initial_fullscreen {
        native.set_geometry(screen.geometry);
        native.set_fullscreen(true);
    } else if let Some([x, y]) = config.initial_position.filter(|[x, y]| *x >= 0 && *y >= 0) {
        native.set_geometry(Rect::new(
            screen.geometry.x + x,
            screen.geometry.y + y,
            width,
            height,
        ));
    } else {
        let current = native.geometry();
        native.set_geometry(Rect::new(current.x, current.y, width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrplex_core::input::{KeyCode, Modifiers};

    use crate::surface::HeadlessWindowSystem;
    use crate::texture::DummyTextureBackend;

    fn env(system: HeadlessWindowSystem) -> WindowEnv {
        WindowEnv::new(Arc::new(system), Arc::new(DummyTextureBackend::new()))
    }

    #[test]
    fn initial_position_is_relative_to_screen() {
        let system = HeadlessWindowSystem::with_screens(vec![
            ScreenInfo::new(Rect::new(0, 0, 1920, 1080), [0.52, 0.29]),
            ScreenInfo::new(Rect::new(1920, 0, 1920, 1080), [0.52, 0.29]),
        ]);
        let mut config = WindowConfig::new("side", "viewer", OutputMode::Center);
        config.initial_screen = Some(1);
        config.initial_position = Some([100, 50]);
        config.initial_size = [320, 240];
        let window = Window::new(0, 0, &config, &env(system), None).unwrap();
        assert_eq!(window.geometry(), Rect::new(2020, 50, 320, 240));
    }

    #[test]
    fn fullscreen_shortcut_is_not_enqueued() {
        let env = env(HeadlessWindowSystem::new());
        let config = WindowConfig::new("main", "viewer", OutputMode::Center);
        let mut window = Window::new(0, 0, &config, &env, None).unwrap();

        window.handle_event(EventKind::KeyPress {
            key: KeyCode::F11,
            modifiers: Modifiers::empty(),
        });
        assert!(window.is_fullscreen());
        window.handle_event(EventKind::KeyPress {
            key: KeyCode::F,
            modifiers: Modifiers::CONTROL | Modifiers::SHIFT,
        });
        assert!(!window.is_fullscreen());
        assert!(env.events.is_empty());

        window.handle_event(EventKind::KeyPress {
            key: KeyCode::F,
            modifiers: Modifiers::CONTROL,
        });
        let events = env.events.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].context, *window.render_context());
    }

    #[test]
    fn output_pass_failure_is_fatal() {
        let system = HeadlessWindowSystem::new().with_output_pass_error("no shader");
        let config = WindowConfig::new("main", "viewer", OutputMode::Center);
        let err = Window::new(0, 0, &config, &env(system), None).unwrap_err();
        assert!(matches!(err, WindowError::OutputPass(msg) if msg == "no shader"));
    }

    #[test]
    fn surface_checks_are_fatal() {
        let config = WindowConfig::new("main", "viewer", OutputMode::Stereo);
        let err =
            Window::new(0, 0, &config, &env(HeadlessWindowSystem::new().without_stereo()), None)
                .unwrap_err();
        assert!(matches!(err, WindowError::StereoUnsupported));

        let err =
            Window::new(0, 0, &config, &env(HeadlessWindowSystem::new().without_sharing()), None)
                .unwrap_err();
        assert!(matches!(err, WindowError::SurfaceNotShared));
    }
}
