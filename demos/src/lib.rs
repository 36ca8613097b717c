//! # vrplex demos
//!
//! Headless sessions that run the whole per-frame pipeline without a GPU or
//! a display: devices are polled, observers updated, and every window of a
//! process computes its render context and goes through the render/swap
//! handshake.
//!
//! ## Available Demos
//!
//! - `headless_session` - run a configuration for a number of frames

use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vrplex_core::hmd::mock::MockHmd;
use vrplex_core::math::quat_from_euler_degrees;
use vrplex_core::{Config, EntityPose, HmdEntity, HmdRuntime, ManualClock, Timestamp};
use vrplex_device::{DummyGamepads, RuntimeContext, TrackedDevice, TrackedObserver};
use vrplex_window::{DummyTextureBackend, HeadlessWindowSystem, Window, WindowEnv};

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulated frame period.
pub const FRAME_TIME: Duration = Duration::from_micros(16_667);

pub type SessionResult<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub frame: u64,
    pub windows: usize,
    /// Serialized size of the device states a master would broadcast.
    pub state_bytes: usize,
    pub events: usize,
}

/// Presents frames of a runtime-driven window from a thread of its own.
struct RuntimePresenter {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Everything one process of a configuration runs.
pub struct Session {
    process: usize,
    config: Config,
    clock: Arc<ManualClock>,
    hmd: Option<Arc<MockHmd>>,
    ctx: RuntimeContext,
    devices: Vec<TrackedDevice>,
    observers: Vec<TrackedObserver>,
    windows: Vec<Window>,
    env: WindowEnv,
    presenters: Vec<RuntimePresenter>,
    frame: u64,
}

impl Session {
    /// Build devices, observers and the windows of `process`.
    ///
    /// An HMD runtime is simulated when a window of the process asks for one.
    pub fn new(config: Config, process: usize) -> SessionResult<Self> {
        if process >= config.processes.len() {
            return Err(format!(
                "process {} does not exist ({} configured)",
                process,
                config.processes.len()
            )
            .into());
        }
        let clock = Arc::new(ManualClock::new(Timestamp(0)));
        let hmd = config.processes[process]
            .windows
            .iter()
            .find_map(|w| w.output_mode.hmd_kind())
            .map(|kind| Arc::new(MockHmd::new(kind)));

        let mut ctx = RuntimeContext::new(process)
            .with_clock(clock.clone())
            .with_gamepads(Arc::new(DummyGamepads::new()));
        let mut env = WindowEnv::new(
            Arc::new(HeadlessWindowSystem::new()),
            Arc::new(DummyTextureBackend::new()),
        );
        if let Some(hmd) = &hmd {
            log::info!("Simulating a {:?} runtime", hmd.kind());
            ctx = ctx.with_hmd(hmd.clone());
            env = env.with_hmd(hmd.clone() as Arc<dyn HmdRuntime>);
        }

        let devices = TrackedDevice::from_config(&config, &ctx);
        let observers = TrackedObserver::from_config(&config);
        let windows = Window::for_process(&config, process, &env)?;
        let presenters = windows
            .iter()
            .filter_map(|w| w.frame_sync().map(|sync| (w.id().to_owned(), sync)))
            .map(|(id, sync)| {
                let stop = Arc::new(AtomicBool::new(false));
                let handle = thread::Builder::new()
                    .name(format!("vrplex-runtime-{id}"))
                    .spawn({
                        let stop = stop.clone();
                        move || {
                            while !stop.load(Ordering::Acquire) {
                                sync.present(|frame| {
                                    log::trace!("Runtime presented {:?}", frame.textures);
                                });
                                thread::yield_now();
                            }
                        }
                    })?;
                Ok(RuntimePresenter { stop, handle })
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        log::info!(
            "Session for process {} with {} devices, {} observers, {} windows",
            config.processes[process].id,
            devices.len(),
            observers.len(),
            windows.len()
        );
        Ok(Self {
            process,
            config,
            clock,
            hmd,
            ctx,
            devices,
            observers,
            windows,
            env,
            presenters,
            frame: 0,
        })
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn devices(&self) -> &[TrackedDevice] {
        &self.devices
    }

    pub fn observers(&self) -> &[TrackedObserver] {
        &self.observers
    }

    /// Run one frame.
    pub fn frame(&mut self, near: f32, far: f32) -> SessionResult<FrameStats> {
        self.clock.advance(FRAME_TIME);
        if let Some(hmd) = &self.hmd {
            // Slow head turn.
            let yaw = self.frame as f32 * 0.5;
            hmd.set_pose(
                HmdEntity::Head,
                EntityPose::new([0.0, 1.7, 0.0].into(), quat_from_euler_degrees(yaw, 0.0, 0.0)),
            );
        }

        let mut state_bytes = 0;
        for device in &mut self.devices {
            device.update(&self.ctx);
            if device.is_owned() {
                state_bytes += device.encode_state()?.len();
            }
        }
        for observer in &mut self.observers {
            observer.update(&self.devices);
        }

        for window in &mut self.windows {
            let observer = self
                .config
                .observer_index(&window.config().observer)
                .and_then(|i| self.observers.get(i))
                .ok_or_else(|| format!("window {} has no observer", window.id()))?;
            window.compute_render_context(observer, near, far)?;
            window.render_to_screen();
        }
        for window in &mut self.windows {
            window.async_swap_buffers();
        }
        for window in &mut self.windows {
            window.wait_for_swap_buffers();
        }

        let events = self.env.events.drain();
        for event in &events {
            log::debug!("Window {}: {:?}", event.window, event.kind);
        }

        let stats = FrameStats {
            frame: self.frame,
            windows: self.windows.len(),
            state_bytes,
            events: events.len(),
        };
        self.frame += 1;
        Ok(stats)
    }

    /// Stop all windows and runtime presenters. Also done on drop.
    pub fn shutdown(&mut self) {
        if self.windows.is_empty() && self.presenters.is_empty() {
            return;
        }
        self.windows.clear();
        for presenter in self.presenters.drain(..) {
            presenter.stop.store(true, Ordering::Release);
            if presenter.handle.join().is_err() {
                log::error!("Runtime presenter panicked");
            }
        }
        log::info!(
            "Session for process {} stopped after {} frames",
            self.process,
            self.frame
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Default configuration: one desktop window showing a standalone observer.
pub fn default_config() -> Config {
    use vrplex_core::config::{ObserverConfig, ProcessConfig, WindowConfig};
    use vrplex_core::OutputMode;

    let mut config = Config::default();
    config.observers.push(ObserverConfig::new("viewer"));
    config.processes.push(ProcessConfig {
        id: "master".into(),
        windows: vec![WindowConfig::new("main", "viewer", OutputMode::Center)],
    });
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config(text: &str) -> Config {
        Config::from_toml_str(text).unwrap()
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn default_session_runs() {
        let mut session = Session::new(default_config(), 0).unwrap();
        for frame in 0..3 {
            let stats = session.frame(0.1, 100.0).unwrap();
            assert_eq!(stats.frame, frame);
            assert_eq!(stats.windows, 1);
        }
        assert!(session.windows()[0].textures()[0].is_some());
        session.shutdown();
    }

    #[rstest]
    #[case::cave_master(include_str!("../configs/cave.toml"), "master", 1)]
    #[case::cave_slave(include_str!("../configs/cave.toml"), "slave", 1)]
    #[case::hmd(include_str!("../configs/hmd.toml"), "master", 1)]
    fn shipped_configs_run(#[case] text: &str, #[case] process: &str, #[case] windows: usize) {
        let config = config(text);
        let process = config.process_index(process).unwrap();
        let mut session = Session::new(config, process).unwrap();
        let stats = session.frame(0.05, 100.0).unwrap();
        assert_eq!(stats.windows, windows);
        assert!(session.windows()[0].render_context().frustum(0).is_valid());
    }

    #[test]
    fn unknown_process_is_rejected() {
        assert!(Session::new(default_config(), 3).is_err());
    }

    #[rstest]
    #[case::oculus("oculus", "oculus", "head")]
    #[case::openvr("openvr", "openvr", "head")]
    #[case::osvr("osvr", "osvr", "eye-center")]
    #[case::googlevr("googlevr", "static", "0 1.7 0 0 0 0")]
    fn hmd_sessions_run(#[case] mode: &str, #[case] tracking: &str, #[case] parameters: &str) {
        let text = format!(
            r#"
[[device]]
id = "head"
tracking = {{ type = "{tracking}", parameters = "{parameters}" }}

[[observer]]
id = "viewer"
head_device = "head"

[[process]]
id = "master"

[[process.window]]
id = "hmd"
observer = "viewer"
output_mode = "{mode}"
"#
        );
        let mut session = Session::new(config(&text), 0).unwrap();
        let mut state_bytes = 0;
        for _ in 0..4 {
            state_bytes = session.frame(0.1, 100.0).unwrap().state_bytes;
        }
        assert!(state_bytes > 0);
        assert_eq!(session.windows()[0].render_context().view_count(), 2);
        session.shutdown();
    }
}
