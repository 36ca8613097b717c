//! Window-system seams.
//!
//! The window system creates native windows and their presentation
//! surfaces. Native windows stay on the main thread; surfaces move to the
//! window's render thread and are only used there.
//!
//! # Available systems
//!
//! - [`HeadlessWindowSystem`]: in-memory windows that record every surface
//!   call, for tests and headless sessions

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use vrplex_core::{Extent2d, OutputMode, Rect, ScreenInfo, TextureId};

use crate::error::{Result, WindowError};

/// Framebuffer properties requested for, or provided by, a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub double_buffer: bool,
    /// Quad-buffered stereo with separate left and right back buffers.
    pub stereo: bool,
}

impl SurfaceFormat {
    pub fn for_output_mode(mode: OutputMode) -> Self {
        Self {
            double_buffer: mode.wants_double_buffer(),
            stereo: mode.wants_quad_buffer_stereo(),
        }
    }
}

/// Back buffer targeted by an output draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawBuffer {
    Back,
    BackLeft,
    BackRight,
}

/// One draw of the built-in output pass: a full-window quad textured with
/// the view textures and combined as the output mode requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputQuad {
    pub mode: OutputMode,
    pub target: DrawBuffer,
    pub textures: [Option<TextureId>; 2],
    pub viewport: Extent2d,
}

/// Creates windows and reports the screen layout.
pub trait WindowSystem: Send + Sync {
    fn screens(&self) -> Vec<ScreenInfo>;

    fn primary_screen(&self) -> usize;

    /// Create a hidden window and its presentation surface.
    fn create_window(
        &self,
        title: &str,
        format: SurfaceFormat,
    ) -> Result<(Box<dyn NativeWindow>, Box<dyn PresentSurface>)>;
}

/// Main-thread side of a window.
pub trait NativeWindow: Send {
    fn geometry(&self) -> Rect;

    fn set_geometry(&mut self, geometry: Rect);

    /// Index of the screen the window is on.
    fn screen(&self) -> usize;

    fn set_screen(&mut self, screen: usize);

    fn is_fullscreen(&self) -> bool;

    fn set_fullscreen(&mut self, fullscreen: bool);

    fn show(&mut self);
}

/// Render-thread side of a window.
pub trait PresentSurface: Send {
    /// Format the surface actually got.
    fn format(&self) -> SurfaceFormat;

    /// Whether textures of the primary context are visible to this surface.
    fn shares_resources(&self) -> bool;

    /// Prepare the built-in output pass.
    fn init_output_pass(&mut self) -> std::result::Result<(), String>;

    fn make_current(&mut self);

    fn done_current(&mut self);

    fn draw_output(&mut self, quad: &OutputQuad);

    fn swap_buffers(&mut self);
}

/// Surface call recorded by [`HeadlessWindowSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    InitOutputPass,
    MakeCurrent,
    DoneCurrent,
    Draw(OutputQuad),
    SwapBuffers,
}

/// Shared state of one headless window.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindowState {
    pub geometry: Rect,
    pub screen: usize,
    pub fullscreen: bool,
    pub visible: bool,
    pub calls: Vec<SurfaceCall>,
}

type SharedState = Arc<Mutex<HeadlessWindowState>>;

#[derive(Debug, Default)]
struct HeadlessOptions {
    no_stereo: bool,
    no_sharing: bool,
    output_pass_error: Option<String>,
}

/// Window system without a display.
#[derive(Debug)]
pub struct HeadlessWindowSystem {
    screens: Vec<ScreenInfo>,
    options: HeadlessOptions,
    windows: Mutex<HashMap<String, SharedState>>,
}

impl HeadlessWindowSystem {
    /// One 1920x1080 screen of 0.52x0.29 meters.
    pub fn new() -> Self {
        Self::with_screens(vec![ScreenInfo::new(
            Rect::new(0, 0, 1920, 1080),
            [0.52, 0.29],
        )])
    }

    /// The first screen is the primary one.
    pub fn with_screens(screens: Vec<ScreenInfo>) -> Self {
        Self {
            screens,
            options: HeadlessOptions::default(),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Surfaces never get quad-buffered stereo.
    pub fn without_stereo(mut self) -> Self {
        self.options.no_stereo = true;
        self
    }

    /// Surfaces do not share resources with the primary context.
    pub fn without_sharing(mut self) -> Self {
        self.options.no_sharing = true;
        self
    }

    /// The built-in output pass fails to initialize.
    pub fn with_output_pass_error(mut self, error: impl Into<String>) -> Self {
        self.options.output_pass_error = Some(error.into());
        self
    }

    /// Snapshot of a window created with the given title.
    pub fn window(&self, title: &str) -> Option<HeadlessWindowState> {
        self.windows.lock().get(title).map(|s| s.lock().clone())
    }

    /// Take the surface calls recorded for a window so far.
    pub fn take_calls(&self, title: &str) -> Vec<SurfaceCall> {
        self.windows
            .lock()
            .get(title)
            .map(|s| std::mem::take(&mut s.lock().calls))
            .unwrap_or_default()
    }
}

impl Default for HeadlessWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for HeadlessWindowSystem {
    fn screens(&self) -> Vec<ScreenInfo> {
        self.screens.clone()
    }

    fn primary_screen(&self) -> usize {
        0
    }

    fn create_window(
        &self,
        title: &str,
        format: SurfaceFormat,
    ) -> Result<(Box<dyn NativeWindow>, Box<dyn PresentSurface>)> {
        let Some(primary) = self.screens.first() else {
            return Err(WindowError::SurfaceUnavailable("no screens".into()));
        };
        log::trace!("HeadlessWindowSystem: creating window {} ({:?})", title, format);
        let state = Arc::new(Mutex::new(HeadlessWindowState {
            geometry: Rect::new(primary.geometry.x, primary.geometry.y, 640, 480),
            screen: 0,
            fullscreen: false,
            visible: false,
            calls: Vec::new(),
        }));
        self.windows.lock().insert(title.to_owned(), state.clone());

        let window = HeadlessWindow {
            state: state.clone(),
            screens: self.screens.iter().map(|s| s.geometry).collect(),
        };
        let surface = HeadlessSurface {
            state,
            format: SurfaceFormat {
                double_buffer: format.double_buffer,
                stereo: format.stereo && !self.options.no_stereo,
            },
            shares_resources: !self.options.no_sharing,
            output_pass_error: self.options.output_pass_error.clone(),
        };
        Ok((Box::new(window), Box::new(surface)))
    }
}

struct HeadlessWindow {
    state: SharedState,
    screens: Vec<Rect>,
}

impl NativeWindow for HeadlessWindow {
    fn geometry(&self) -> Rect {
        self.state.lock().geometry
    }

    fn set_geometry(&mut self, geometry: Rect) {
        let mut state = self.state.lock();
        state.geometry = geometry;
        let cx = geometry.x + (geometry.width / 2) as i32;
        let cy = geometry.y + (geometry.height / 2) as i32;
        if let Some(screen) = self.screens.iter().position(|s| s.contains(cx, cy)) {
            state.screen = screen;
        }
    }

    fn screen(&self) -> usize {
        self.state.lock().screen
    }

    fn set_screen(&mut self, screen: usize) {
        let Some(target) = self.screens.get(screen) else {
            return;
        };
        let mut state = self.state.lock();
        let old = self.screens[state.screen];
        state.geometry.x += target.x - old.x;
        state.geometry.y += target.y - old.y;
        state.screen = screen;
    }

    fn is_fullscreen(&self) -> bool {
        self.state.lock().fullscreen
    }

    fn set_fullscreen(&mut self, fullscreen: bool) {
        let mut state = self.state.lock();
        state.fullscreen = fullscreen;
        if fullscreen {
            state.geometry = self.screens[state.screen];
        }
    }

    fn show(&mut self) {
        self.state.lock().visible = true;
    }
}

struct HeadlessSurface {
    state: SharedState,
    format: SurfaceFormat,
    shares_resources: bool,
    output_pass_error: Option<String>,
}

impl HeadlessSurface {
    fn record(&self, call: SurfaceCall) {
        log::trace!("HeadlessSurface: {:?}", call);
        self.state.lock().calls.push(call);
    }
}

impl PresentSurface for HeadlessSurface {
    fn format(&self) -> SurfaceFormat {
        self.format
    }

    fn shares_resources(&self) -> bool {
        self.shares_resources
    }

    fn init_output_pass(&mut self) -> std::result::Result<(), String> {
        self.record(SurfaceCall::InitOutputPass);
        match &self.output_pass_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn make_current(&mut self) {
        self.record(SurfaceCall::MakeCurrent);
    }

    fn done_current(&mut self) {
        self.record(SurfaceCall::DoneCurrent);
    }

    fn draw_output(&mut self, quad: &OutputQuad) {
        self.record(SurfaceCall::Draw(*quad));
    }

    fn swap_buffers(&mut self) {
        self.record(SurfaceCall::SwapBuffers);
    }
}
