//! Tracked input devices.

use serde::{Deserialize, Serialize};
use vrplex_core::config::{Config, DeviceConfig};
use vrplex_core::math::{scaled_axis, Quat, Vec3};
use vrplex_core::PoseSample;

use crate::backend::{
    analog_count, button_count, initial_analogs, initial_buttons, AnalogsBackend,
    ButtonsBackend, TrackingBackend,
};
use crate::error::{DeviceError, Result};
use crate::runtime::RuntimeContext;

/// Observable state of a device, the part replicated to other processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    pub index: usize,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub buttons: Vec<bool>,
    pub analogs: Vec<f32>,
}

impl DeviceState {
    fn new(index: usize, buttons: Vec<bool>, analogs: Vec<f32>) -> Self {
        Self {
            index,
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            buttons,
            analogs,
        }
    }
}

#[derive(Debug)]
struct Binding {
    tracking: TrackingBackend,
    buttons: ButtonsBackend,
    analogs: AnalogsBackend,
}

/// One configured input device.
///
/// Every process holds a `TrackedDevice` for every configured device so the
/// button and analog arrays have their configured sizes everywhere. Only the
/// owning process binds backends and polls them; the others receive the state
/// through [`TrackedDevice::apply_state`].
///
/// # Example
///
/// ```ignore
/// let mut devices = TrackedDevice::from_config(&config, &ctx);
/// loop {
///     for device in &mut devices {
///         device.update(&ctx);
///     }
///     // ...
/// }
/// ```
#[derive(Debug)]
pub struct TrackedDevice {
    id: String,
    process: usize,
    state: DeviceState,
    binding: Option<Binding>,
    previous: Option<PoseSample>,
}

impl TrackedDevice {
    /// Create the device at `index` of the configuration.
    ///
    /// Backends are bound only when `ctx` belongs to the owning process. A
    /// backend that cannot be bound is logged and left inert; construction
    /// itself never fails.
    pub fn new(index: usize, config: &DeviceConfig, ctx: &RuntimeContext) -> Self {
        let mut state = DeviceState::new(
            index,
            initial_buttons(&config.buttons),
            initial_analogs(&config.analogs),
        );
        debug_assert_eq!(state.buttons.len(), button_count(&config.buttons));
        debug_assert_eq!(state.analogs.len(), analog_count(&config.analogs));

        let binding = (config.process == ctx.process_index()).then(|| {
            let tracking = TrackingBackend::resolve(&config.tracking, ctx).unwrap_or_else(|err| {
                log::warn!("Device {}: tracking disabled: {}", config.id, err);
                TrackingBackend::Inert
            });
            let buttons = ButtonsBackend::resolve(&config.buttons, ctx).unwrap_or_else(|err| {
                log::warn!("Device {}: buttons disabled: {}", config.id, err);
                ButtonsBackend::Inert
            });
            let analogs = AnalogsBackend::resolve(&config.analogs, ctx).unwrap_or_else(|err| {
                log::warn!("Device {}: analogs disabled: {}", config.id, err);
                AnalogsBackend::Inert
            });
            (state.position, state.orientation) = tracking.initial_pose();
            Binding {
                tracking,
                buttons,
                analogs,
            }
        });

        log::debug!(
            "Device {} created ({} buttons, {} analogs, {})",
            config.id,
            state.buttons.len(),
            state.analogs.len(),
            if binding.is_some() { "polled here" } else { "replicated" }
        );

        Self {
            id: config.id.clone(),
            process: config.process,
            state,
            binding,
            previous: None,
        }
    }

    /// Create every configured device in configuration order.
    pub fn from_config(config: &Config, ctx: &RuntimeContext) -> Vec<Self> {
        config
            .devices
            .iter()
            .enumerate()
            .map(|(index, device)| Self::new(index, device, ctx))
            .collect()
    }

    /// Poll the bound backends and estimate velocities.
    ///
    /// Does nothing on a process that does not own the device.
    pub fn update(&mut self, ctx: &RuntimeContext) {
        let Some(binding) = self.binding.as_mut() else {
            return;
        };
        let now = ctx.clock().now();

        let poll = binding.tracking.poll(now);
        if let Some(sample) = &poll.sample {
            self.state.position = sample.position;
            self.state.orientation = sample.orientation;
        }
        binding.buttons.poll(&mut self.state.buttons);
        binding.analogs.poll(&mut self.state.analogs);

        if binding.tracking.is_tracked() {
            match (&poll.sample, &self.previous) {
                (Some(sample), _) if poll.measured_velocity => {
                    self.state.velocity = sample.velocity;
                    self.state.angular_velocity = sample.angular_velocity;
                }
                (_, Some(previous)) => {
                    let elapsed = previous.timestamp.and_then(|last| now.seconds_since(last));
                    if let Some(secs) = elapsed {
                        let secs = secs as f32;
                        self.state.velocity = (self.state.position - previous.position) / secs;
                        let delta = self.state.orientation * previous.orientation.conjugate();
                        self.state.angular_velocity = scaled_axis(&delta) / secs;
                    }
                }
                _ => {}
            }
            self.previous = Some(PoseSample {
                position: self.state.position,
                orientation: self.state.orientation,
                velocity: self.state.velocity,
                angular_velocity: self.state.angular_velocity,
                timestamp: Some(now),
            });
        }
    }

    /// Pose and velocities as of the last update of a tracked device.
    pub fn last_sample(&self) -> Option<&PoseSample> {
        self.previous.as_ref()
    }

    /// Serialize the observable state for replication.
    pub fn encode_state(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.state)?)
    }

    /// Replace the observable state with one received from the owning process.
    ///
    /// Button and analog counts are fixed by configuration; a state of another
    /// shape is rejected and the current state is kept.
    pub fn apply_state(&mut self, bytes: &[u8]) -> Result<()> {
        let state: DeviceState = bincode::deserialize(bytes)?;
        if state.index != self.state.index {
            return Err(DeviceError::StateMismatch {
                expected: self.state.index,
                found: state.index,
            });
        }
        let sizes = [
            ("buttons", self.state.buttons.len(), state.buttons.len()),
            ("analogs", self.state.analogs.len(), state.analogs.len()),
        ];
        for (channel, expected, found) in sizes {
            if expected != found {
                return Err(DeviceError::StateSizeMismatch {
                    device: state.index,
                    channel,
                    expected,
                    found,
                });
            }
        }
        self.state = state;
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.state.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn process(&self) -> usize {
        self.process
    }

    /// Whether this process polls the device.
    pub fn is_owned(&self) -> bool {
        self.binding.is_some()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn orientation(&self) -> Quat {
        self.state.orientation
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.state.angular_velocity
    }

    pub fn buttons(&self) -> &[bool] {
        &self.state.buttons
    }

    pub fn analogs(&self) -> &[f32] {
        &self.state.analogs
    }

    pub fn button(&self, i: usize) -> bool {
        self.state.buttons.get(i).copied().unwrap_or(false)
    }

    pub fn analog(&self, i: usize) -> f32 {
        self.state.analogs.get(i).copied().unwrap_or(0.0)
    }

    pub fn tracking_backend(&self) -> Option<&TrackingBackend> {
        self.binding.as_ref().map(|b| &b.tracking)
    }

    pub fn buttons_backend(&self) -> Option<&ButtonsBackend> {
        self.binding.as_ref().map(|b| &b.buttons)
    }

    pub fn analogs_backend(&self) -> Option<&AnalogsBackend> {
        self.binding.as_ref().map(|b| &b.analogs)
    }
}
