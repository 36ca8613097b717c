//! Backend bindings for the tracking, button and analog channels of a device.
//!
//! Each channel is bound once, at construction, to exactly one source. The
//! binding is a closed enum per channel, and a single `poll` entry point
//! dispatches on it. A binding that cannot be established (unknown entity,
//! disconnected pad, missing runtime) is reported by `resolve` and the caller
//! falls back to [`TrackingBackend::Inert`] (and its button/analog
//! counterparts), which leaves the channel at its default state.

use std::sync::Arc;

use vrplex_core::config::{
    AnalogsSpec, AnalogsType, ButtonsSpec, ButtonsType, TrackingSpec, TrackingType,
};
use vrplex_core::hmd::SEATED_HEIGHT_THRESHOLD;
use vrplex_core::math::{quat_from_euler_degrees, Quat, Vec3};
use vrplex_core::{Eye, HmdEntity, HmdInput, HmdKind, HmdRuntime, PoseSample, Timestamp};

use crate::callback::{CallbackSource, TrackerSlot};
use crate::error::{DeviceError, Result};
use crate::gamepad::{GamepadHandle, GAMEPAD_AXIS_COUNT, GAMEPAD_BUTTON_COUNT};
use crate::interface::{InterfaceId, InterfaceProvider};
use crate::runtime::RuntimeContext;

/// Default number of button channels of a network button box.
pub const NETWORK_BUTTON_CHANNELS: usize = 32;

/// Default number of analog channels of a network analog box.
pub const NETWORK_ANALOG_CHANNELS: usize = 8;

/// Fresh tracking data produced by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackingPoll {
    /// New sample, or `None` to keep the previous pose.
    pub sample: Option<PoseSample>,
    /// Whether the sample's velocities were measured by the backend. If not
    /// they are zero and left to the device to estimate.
    pub measured_velocity: bool,
}

impl TrackingPoll {
    fn sampled(
        position: Vec3,
        orientation: Quat,
        velocities: Option<(Vec3, Vec3)>,
        now: Timestamp,
    ) -> Self {
        let mut sample = PoseSample::at(position, orientation);
        sample.timestamp = Some(now);
        if let Some((velocity, angular_velocity)) = velocities {
            sample.velocity = velocity;
            sample.angular_velocity = angular_velocity;
        }
        Self {
            sample: Some(sample),
            measured_velocity: velocities.is_some(),
        }
    }
}

/// Source of the pose of a device.
pub enum TrackingBackend {
    /// Not tracked; the pose stays at the origin.
    None,
    /// Fixed pose from configuration.
    Static { position: Vec3, orientation: Quat },
    /// Reports pushed by a network tracker.
    Callback {
        slot: Arc<TrackerSlot>,
        last_velocity: u64,
    },
    /// Entity of an HMD runtime.
    Hmd {
        runtime: Arc<dyn HmdRuntime>,
        entity: HmdEntity,
        height_offset: HeightOffset,
    },
    /// Path-addressed tracker interface.
    Interface {
        provider: Arc<dyn InterfaceProvider>,
        id: InterfaceId,
    },
    /// Misconfigured; never produces data.
    Inert,
}

/// Lift applied to poses of seated runtimes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightOffset {
    None,
    /// Always add the offset.
    Always(f32),
    /// Add the offset when the reported height is below the seated threshold.
    WhenSeated(f32),
}

impl HeightOffset {
    fn apply(self, mut position: Vec3) -> Vec3 {
        match self {
            HeightOffset::None => {}
            HeightOffset::Always(h) => position.y += h,
            HeightOffset::WhenSeated(h) => {
                if position.y < SEATED_HEIGHT_THRESHOLD {
                    position.y += h;
                }
            }
        }
        position
    }
}

impl TrackingBackend {
    /// Bind the tracking channel. The returned pose is the initial pose.
    pub fn resolve(spec: &TrackingSpec, ctx: &RuntimeContext) -> Result<Self> {
        let arg = spec.parameters.trim();
        match spec.kind {
            TrackingType::None => Ok(Self::None),
            TrackingType::Static => parse_static_pose(arg),
            TrackingType::Vrpn => {
                let mut args = arg.split_whitespace();
                let name = args.next().ok_or_else(|| invalid("tracking", arg))?;
                let sensor = args
                    .next()
                    .map(|s| s.parse::<u32>().map_err(|_| invalid("tracking", arg)))
                    .transpose()?;
                let source = ctx.callbacks().source(name);
                Ok(Self::Callback {
                    slot: source.tracker_slot(sensor),
                    last_velocity: 0,
                })
            }
            TrackingType::Oculus => {
                let entity = match arg {
                    "head" => HmdEntity::Head,
                    "eye-left" => HmdEntity::Eye(Eye::Left),
                    "eye-right" => HmdEntity::Eye(Eye::Right),
                    "controller-left" => HmdEntity::Controller(0),
                    "controller-right" => HmdEntity::Controller(1),
                    _ => return Err(invalid("tracking", arg)),
                };
                let runtime = ctx.hmd_of_kind(HmdKind::Oculus)?;
                let height_offset = HeightOffset::Always(runtime.default_eye_height());
                Ok(Self::Hmd {
                    runtime,
                    entity,
                    height_offset,
                })
            }
            TrackingType::OpenVr => {
                let entity = match arg {
                    "head" => HmdEntity::Head,
                    "eye-left" => HmdEntity::Eye(Eye::Left),
                    "eye-right" => HmdEntity::Eye(Eye::Right),
                    "controller-0" => HmdEntity::Controller(0),
                    "controller-1" => HmdEntity::Controller(1),
                    _ => return Err(invalid("tracking", arg)),
                };
                Ok(Self::Hmd {
                    runtime: ctx.hmd_of_kind(HmdKind::OpenVr)?,
                    entity,
                    height_offset: HeightOffset::None,
                })
            }
            TrackingType::Osvr => {
                let eye = match arg {
                    "eye-center" => Some(Eye::Center),
                    "eye-left" => Some(Eye::Left),
                    "eye-right" => Some(Eye::Right),
                    _ => None,
                };
                if let Some(eye) = eye {
                    let runtime = ctx.hmd_of_kind(HmdKind::Osvr)?;
                    let height_offset = HeightOffset::WhenSeated(runtime.default_eye_height());
                    return Ok(Self::Hmd {
                        runtime,
                        entity: HmdEntity::Eye(eye),
                        height_offset,
                    });
                }
                let provider = ctx.interfaces()?;
                let id = provider
                    .resolve(arg)
                    .ok_or_else(|| DeviceError::UnknownInterface(arg.to_owned()))?;
                Ok(Self::Interface { provider, id })
            }
        }
    }

    /// Whether velocities are estimated for this binding when the backend does not measure them.
    pub fn is_tracked(&self) -> bool {
        !matches!(self, Self::None | Self::Static { .. })
    }

    /// Pose to start from before the first poll.
    pub fn initial_pose(&self) -> (Vec3, Quat) {
        match self {
            Self::Static {
                position,
                orientation,
            } => (*position, *orientation),
            _ => (Vec3::zeros(), Quat::identity()),
        }
    }

    /// Read the latest sample, stamped with `now`.
    pub fn poll(&mut self, now: Timestamp) -> TrackingPoll {
        match self {
            Self::None | Self::Inert | Self::Static { .. } => TrackingPoll::default(),
            Self::Callback {
                slot,
                last_velocity,
            } => {
                let Some(report) = slot.pose() else {
                    return TrackingPoll::default();
                };
                let velocities = slot
                    .velocity()
                    .filter(|v| v.sequence != *last_velocity)
                    .map(|v| {
                        *last_velocity = v.sequence;
                        (v.velocity, v.angular_velocity)
                    });
                TrackingPoll::sampled(report.position, report.orientation, velocities, now)
            }
            Self::Hmd {
                runtime,
                entity,
                height_offset,
            } => match runtime.entity_pose(*entity) {
                Some(p) => TrackingPoll::sampled(
                    height_offset.apply(p.position),
                    p.orientation,
                    p.velocities,
                    now,
                ),
                None => TrackingPoll::default(),
            },
            Self::Interface { provider, id } => match provider.pose(*id) {
                Some((position, orientation)) => {
                    TrackingPoll::sampled(position, orientation, None, now)
                }
                None => TrackingPoll::default(),
            },
        }
    }
}

impl std::fmt::Debug for TrackingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "TrackingBackend::None"),
            Self::Static { position, .. } => f
                .debug_struct("TrackingBackend::Static")
                .field("position", position)
                .finish_non_exhaustive(),
            Self::Callback { .. } => write!(f, "TrackingBackend::Callback"),
            Self::Hmd { entity, .. } => f
                .debug_struct("TrackingBackend::Hmd")
                .field("entity", entity)
                .finish_non_exhaustive(),
            Self::Interface { id, .. } => f
                .debug_struct("TrackingBackend::Interface")
                .field("id", id)
                .finish_non_exhaustive(),
            Self::Inert => write!(f, "TrackingBackend::Inert"),
        }
    }
}

/// Source of the button states of a device.
pub enum ButtonsBackend {
    None,
    /// Fixed states; they never change after construction.
    Static,
    Gamepad(Arc<GamepadHandle>),
    Callback {
        source: Arc<CallbackSource>,
        channels: Vec<usize>,
    },
    Hmd {
        runtime: Arc<dyn HmdRuntime>,
        input: HmdInput,
        /// Receives the runtime's states before they are committed.
        scratch: Vec<bool>,
    },
    Interface {
        provider: Arc<dyn InterfaceProvider>,
        ids: Vec<Option<InterfaceId>>,
    },
    Inert,
}

/// Number of buttons a button spec exposes, independent of which process polls it.
pub fn button_count(spec: &ButtonsSpec) -> usize {
    let arg = spec.parameters.trim();
    match spec.kind {
        ButtonsType::None => 0,
        ButtonsType::Static | ButtonsType::Osvr => arg.split_whitespace().count(),
        ButtonsType::Gamepad => GAMEPAD_BUTTON_COUNT,
        ButtonsType::Vrpn => match arg.split_whitespace().count() {
            0 | 1 => NETWORK_BUTTON_CHANNELS,
            n => n - 1,
        },
        ButtonsType::Oculus => match arg {
            "xbox" => 12,
            "controller-left" | "controller-right" => 8,
            _ => 0,
        },
        ButtonsType::OpenVr => match arg {
            "controller-0" | "controller-1" => 6,
            _ => 0,
        },
    }
}

/// Initial button states from a static spec; other specs start released.
pub fn initial_buttons(spec: &ButtonsSpec) -> Vec<bool> {
    match spec.kind {
        ButtonsType::Static => spec
            .parameters
            .split_whitespace()
            .map(|v| v.parse::<i64>().map(|n| n != 0).unwrap_or(false))
            .collect(),
        _ => vec![false; button_count(spec)],
    }
}

impl ButtonsBackend {
    pub fn resolve(spec: &ButtonsSpec, ctx: &RuntimeContext) -> Result<Self> {
        let arg = spec.parameters.trim();
        match spec.kind {
            ButtonsType::None => Ok(Self::None),
            ButtonsType::Static => Ok(Self::Static),
            ButtonsType::Gamepad => {
                let pad = arg.parse::<i64>().map_err(|_| invalid("buttons", arg))?;
                Ok(Self::Gamepad(ctx.gamepads().open(pad)?))
            }
            ButtonsType::Vrpn => {
                let (source, channels) =
                    network_channels(ctx, arg, NETWORK_BUTTON_CHANNELS, "buttons")?;
                Ok(Self::Callback { source, channels })
            }
            ButtonsType::Oculus => {
                let input = match arg {
                    "xbox" => HmdInput::Remote,
                    "controller-left" => HmdInput::Controller(0),
                    "controller-right" => HmdInput::Controller(1),
                    _ => return Err(invalid("buttons", arg)),
                };
                Ok(Self::Hmd {
                    runtime: ctx.hmd_of_kind(HmdKind::Oculus)?,
                    input,
                    scratch: vec![false; button_count(spec)],
                })
            }
            ButtonsType::OpenVr => {
                let input = match arg {
                    "controller-0" => HmdInput::Controller(0),
                    "controller-1" => HmdInput::Controller(1),
                    _ => return Err(invalid("buttons", arg)),
                };
                Ok(Self::Hmd {
                    runtime: ctx.hmd_of_kind(HmdKind::OpenVr)?,
                    input,
                    scratch: vec![false; button_count(spec)],
                })
            }
            ButtonsType::Osvr => {
                let (provider, ids) = interface_paths(ctx, arg)?;
                Ok(Self::Interface { provider, ids })
            }
        }
    }

    /// The gamepad this channel reads, if any.
    pub fn gamepad(&self) -> Option<&Arc<GamepadHandle>> {
        match self {
            Self::Gamepad(handle) => Some(handle),
            _ => None,
        }
    }

    /// Update `buttons` in place; entries without fresh data keep their value.
    pub fn poll(&mut self, buttons: &mut [bool]) {
        match self {
            Self::None | Self::Static | Self::Inert => {}
            Self::Gamepad(pad) => {
                if let Some(state) = pad.state() {
                    for (dst, src) in buttons.iter_mut().zip(state.buttons) {
                        *dst = src;
                    }
                }
            }
            Self::Callback { source, channels } => {
                let states = source.buttons();
                for (dst, channel) in buttons.iter_mut().zip(channels.iter()) {
                    if let Some(state) = states.get(*channel) {
                        *dst = *state;
                    }
                }
            }
            Self::Hmd {
                runtime,
                input,
                scratch,
            } => {
                scratch.resize(buttons.len(), false);
                scratch.copy_from_slice(buttons);
                if runtime.buttons(*input, scratch) {
                    buttons.copy_from_slice(scratch);
                }
            }
            Self::Interface { provider, ids } => {
                for (dst, id) in buttons.iter_mut().zip(ids.iter()) {
                    if let Some(state) = id.and_then(|id| provider.button(id)) {
                        *dst = state;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ButtonsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Static => "Static",
            Self::Gamepad(_) => "Gamepad",
            Self::Callback { .. } => "Callback",
            Self::Hmd { .. } => "Hmd",
            Self::Interface { .. } => "Interface",
            Self::Inert => "Inert",
        };
        write!(f, "ButtonsBackend::{name}")
    }
}

/// Source of the analog states of a device.
pub enum AnalogsBackend {
    None,
    Static,
    Gamepad(Arc<GamepadHandle>),
    Callback {
        source: Arc<CallbackSource>,
        channels: Vec<usize>,
    },
    Hmd {
        runtime: Arc<dyn HmdRuntime>,
        input: HmdInput,
        scratch: Vec<f32>,
    },
    Interface {
        provider: Arc<dyn InterfaceProvider>,
        ids: Vec<Option<InterfaceId>>,
    },
    Inert,
}

/// Number of analogs an analog spec exposes, independent of which process polls it.
pub fn analog_count(spec: &AnalogsSpec) -> usize {
    let arg = spec.parameters.trim();
    match spec.kind {
        AnalogsType::None => 0,
        AnalogsType::Static | AnalogsType::Osvr => arg.split_whitespace().count(),
        AnalogsType::Gamepad => GAMEPAD_AXIS_COUNT,
        AnalogsType::Vrpn => match arg.split_whitespace().count() {
            0 | 1 => NETWORK_ANALOG_CHANNELS,
            n => n - 1,
        },
        AnalogsType::Oculus => match arg {
            "xbox" => 8,
            "controller-left" | "controller-right" => 4,
            _ => 0,
        },
        AnalogsType::OpenVr => match arg {
            "controller-0" | "controller-1" => 3,
            _ => 0,
        },
    }
}

/// Initial analog values from a static spec; other specs start at zero.
pub fn initial_analogs(spec: &AnalogsSpec) -> Vec<f32> {
    match spec.kind {
        AnalogsType::Static => spec
            .parameters
            .split_whitespace()
            .map(|v| v.parse::<f32>().unwrap_or(0.0))
            .collect(),
        _ => vec![0.0; analog_count(spec)],
    }
}

impl AnalogsBackend {
    pub fn resolve(spec: &AnalogsSpec, ctx: &RuntimeContext) -> Result<Self> {
        let arg = spec.parameters.trim();
        match spec.kind {
            AnalogsType::None => Ok(Self::None),
            AnalogsType::Static => Ok(Self::Static),
            AnalogsType::Gamepad => {
                let pad = arg.parse::<i64>().map_err(|_| invalid("analogs", arg))?;
                Ok(Self::Gamepad(ctx.gamepads().open(pad)?))
            }
            AnalogsType::Vrpn => {
                let (source, channels) =
                    network_channels(ctx, arg, NETWORK_ANALOG_CHANNELS, "analogs")?;
                Ok(Self::Callback { source, channels })
            }
            AnalogsType::Oculus => {
                let input = match arg {
                    "xbox" => HmdInput::Remote,
                    "controller-left" => HmdInput::Controller(0),
                    "controller-right" => HmdInput::Controller(1),
                    _ => return Err(invalid("analogs", arg)),
                };
                Ok(Self::Hmd {
                    runtime: ctx.hmd_of_kind(HmdKind::Oculus)?,
                    input,
                    scratch: vec![0.0; analog_count(spec)],
                })
            }
            AnalogsType::OpenVr => {
                let input = match arg {
                    "controller-0" => HmdInput::Controller(0),
                    "controller-1" => HmdInput::Controller(1),
                    _ => return Err(invalid("analogs", arg)),
                };
                Ok(Self::Hmd {
                    runtime: ctx.hmd_of_kind(HmdKind::OpenVr)?,
                    input,
                    scratch: vec![0.0; analog_count(spec)],
                })
            }
            AnalogsType::Osvr => {
                let (provider, ids) = interface_paths(ctx, arg)?;
                Ok(Self::Interface { provider, ids })
            }
        }
    }

    /// The gamepad this channel reads, if any.
    pub fn gamepad(&self) -> Option<&Arc<GamepadHandle>> {
        match self {
            Self::Gamepad(handle) => Some(handle),
            _ => None,
        }
    }

    /// Update `analogs` in place; entries without fresh data keep their value.
    pub fn poll(&mut self, analogs: &mut [f32]) {
        match self {
            Self::None | Self::Static | Self::Inert => {}
            Self::Gamepad(pad) => {
                if let Some(state) = pad.state() {
                    for (dst, src) in analogs.iter_mut().zip(state.axes) {
                        *dst = src;
                    }
                }
            }
            Self::Callback { source, channels } => {
                let values = source.analogs();
                for (dst, channel) in analogs.iter_mut().zip(channels.iter()) {
                    if let Some(value) = values.get(*channel) {
                        *dst = *value;
                    }
                }
            }
            Self::Hmd {
                runtime,
                input,
                scratch,
            } => {
                scratch.resize(analogs.len(), 0.0);
                scratch.copy_from_slice(analogs);
                if runtime.analogs(*input, scratch) {
                    analogs.copy_from_slice(scratch);
                }
            }
            Self::Interface { provider, ids } => {
                for (dst, id) in analogs.iter_mut().zip(ids.iter()) {
                    if let Some(value) = id.and_then(|id| provider.analog(id)) {
                        *dst = value;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for AnalogsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Static => "Static",
            Self::Gamepad(_) => "Gamepad",
            Self::Callback { .. } => "Callback",
            Self::Hmd { .. } => "Hmd",
            Self::Interface { .. } => "Interface",
            Self::Inert => "Inert",
        };
        write!(f, "AnalogsBackend::{name}")
    }
}

fn invalid(channel: &'static str, parameter: &str) -> DeviceError {
    DeviceError::InvalidParameter {
        channel,
        parameter: parameter.to_owned(),
    }
}

/// `x y z` or `x y z yaw pitch roll` (degrees).
fn parse_static_pose(arg: &str) -> Result<TrackingBackend> {
    let values = arg
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| invalid("tracking", arg))?;
    let (position, orientation) = match values.as_slice() {
        [x, y, z] => (Vec3::new(*x, *y, *z), Quat::identity()),
        [x, y, z, yaw, pitch, roll] => (
            Vec3::new(*x, *y, *z),
            quat_from_euler_degrees(*yaw, *pitch, *roll),
        ),
        _ => return Err(invalid("tracking", arg)),
    };
    Ok(TrackingBackend::Static {
        position,
        orientation,
    })
}

/// `name [channel ...]`; without explicit channels the first `default_count` are used.
fn network_channels(
    ctx: &RuntimeContext,
    arg: &str,
    default_count: usize,
    channel: &'static str,
) -> Result<(Arc<CallbackSource>, Vec<usize>)> {
    let mut args = arg.split_whitespace();
    let name = args.next().ok_or_else(|| invalid(channel, arg))?;
    let mut channels = args
        .map(|c| c.parse::<usize>().map_err(|_| invalid(channel, arg)))
        .collect::<Result<Vec<_>>>()?;
    if channels.is_empty() {
        channels = (0..default_count).collect();
    }
    Ok((ctx.callbacks().source(name), channels))
}

/// One interface per whitespace-separated path. Unresolvable paths are
/// logged and left unbound so the remaining paths still work.
fn interface_paths(
    ctx: &RuntimeContext,
    arg: &str,
) -> Result<(Arc<dyn InterfaceProvider>, Vec<Option<InterfaceId>>)> {
    let provider = ctx.interfaces()?;
    let ids = arg
        .split_whitespace()
        .map(|path| {
            let id = provider.resolve(path);
            if id.is_none() {
                log::warn!("Interface path {} does not exist", path);
            }
            id
        })
        .collect();
    Ok((provider, ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vrplex_core::hmd::mock::MockHmd;
    use vrplex_core::EntityPose;

    fn buttons(kind: ButtonsType, parameters: &str) -> ButtonsSpec {
        ButtonsSpec {
            kind,
            parameters: parameters.to_owned(),
        }
    }

    fn analogs(kind: AnalogsType, parameters: &str) -> AnalogsSpec {
        AnalogsSpec {
            kind,
            parameters: parameters.to_owned(),
        }
    }

    #[rstest]
    #[case::none(ButtonsType::None, "", 0)]
    #[case::static_list(ButtonsType::Static, "1 0 1", 3)]
    #[case::gamepad(ButtonsType::Gamepad, "0", 18)]
    #[case::network_default(ButtonsType::Vrpn, "Buttons@host", 32)]
    #[case::network_channels(ButtonsType::Vrpn, "Buttons@host 4 7", 2)]
    #[case::remote(ButtonsType::Oculus, "xbox", 12)]
    #[case::touch(ButtonsType::Oculus, "controller-left", 8)]
    #[case::wand(ButtonsType::OpenVr, "controller-1", 6)]
    #[case::paths(ButtonsType::Osvr, "/a /b /c /d", 4)]
    fn button_counts(#[case] kind: ButtonsType, #[case] parameters: &str, #[case] n: usize) {
        assert_eq!(button_count(&buttons(kind, parameters)), n);
    }

    #[rstest]
    #[case::none(AnalogsType::None, "", 0)]
    #[case::static_list(AnalogsType::Static, "0.5 -0.2", 2)]
    #[case::gamepad(AnalogsType::Gamepad, "1", 4)]
    #[case::network_default(AnalogsType::Vrpn, "Analogs@host", 8)]
    #[case::network_channels(AnalogsType::Vrpn, "Analogs@host 2", 1)]
    #[case::remote(AnalogsType::Oculus, "xbox", 8)]
    #[case::touch(AnalogsType::Oculus, "controller-right", 4)]
    #[case::wand(AnalogsType::OpenVr, "controller-0", 3)]
    fn analog_counts(#[case] kind: AnalogsType, #[case] parameters: &str, #[case] n: usize) {
        assert_eq!(analog_count(&analogs(kind, parameters)), n);
    }

    #[test]
    fn static_values() {
        assert_eq!(
            initial_buttons(&buttons(ButtonsType::Static, "1 0 1")),
            vec![true, false, true]
        );
        assert_eq!(
            initial_analogs(&analogs(AnalogsType::Static, "0.5 -0.2")),
            vec![0.5, -0.2]
        );
    }

    #[rstest]
    #[case::two_values("1 2")]
    #[case::four_values("1 2 3 4")]
    #[case::not_a_number("1 2 x")]
    fn invalid_static_pose(#[case] arg: &str) {
        assert!(matches!(
            parse_static_pose(arg),
            Err(DeviceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn height_offsets() {
        let seated = Vec3::new(0.0, 0.4, 0.0);
        let standing = Vec3::new(0.0, 1.7, 0.0);
        assert_eq!(HeightOffset::None.apply(seated), seated);
        assert!((HeightOffset::Always(1.0).apply(standing).y - 2.7).abs() < 1e-6);
        assert!((HeightOffset::WhenSeated(1.0).apply(seated).y - 1.4).abs() < 1e-6);
        assert_eq!(HeightOffset::WhenSeated(1.0).apply(standing), standing);
    }

    fn openvr_ctx() -> (Arc<MockHmd>, RuntimeContext) {
        let hmd = Arc::new(MockHmd::new(HmdKind::OpenVr));
        let ctx = RuntimeContext::new(0).with_hmd(hmd.clone());
        (hmd, ctx)
    }

    #[test]
    fn runtime_samples_are_stamped() {
        let (hmd, ctx) = openvr_ctx();
        let spec = TrackingSpec {
            kind: TrackingType::OpenVr,
            parameters: "head".to_owned(),
        };
        let mut backend = TrackingBackend::resolve(&spec, &ctx).unwrap();
        assert_eq!(backend.poll(Timestamp(5)), TrackingPoll::default());

        let position = Vec3::new(0.0, 1.6, 0.0);
        hmd.set_pose(HmdEntity::Head, EntityPose::new(position, Quat::identity()));
        let poll = backend.poll(Timestamp(10));
        assert!(!poll.measured_velocity);
        let sample = poll.sample.unwrap();
        assert_eq!(sample.position, position);
        assert_eq!(sample.timestamp, Some(Timestamp(10)));
        assert_eq!(sample.velocity, Vec3::zeros());

        hmd.set_pose(
            HmdEntity::Head,
            EntityPose::new(position, Quat::identity()).with_velocities(Vec3::x(), Vec3::y()),
        );
        let poll = backend.poll(Timestamp(20));
        assert!(poll.measured_velocity);
        let sample = poll.sample.unwrap();
        assert_eq!(sample.velocity, Vec3::x());
        assert_eq!(sample.angular_velocity, Vec3::y());
    }

    #[test]
    fn runtime_inputs_reuse_their_buffer() {
        let (hmd, ctx) = openvr_ctx();
        let mut backend =
            ButtonsBackend::resolve(&buttons(ButtonsType::OpenVr, "controller-0"), &ctx).unwrap();
        let buffer = match &backend {
            ButtonsBackend::Hmd { scratch, .. } => scratch.as_ptr(),
            other => panic!("unexpected backend {other:?}"),
        };
        let mut states = vec![false; 6];
        backend.poll(&mut states);
        assert_eq!(states, vec![false; 6]);

        hmd.set_buttons(HmdInput::Controller(0), &[true, false, true]);
        for _ in 0..3 {
            backend.poll(&mut states);
        }
        assert_eq!(states, vec![true, false, true, false, false, false]);
        match &backend {
            ButtonsBackend::Hmd { scratch, .. } => assert_eq!(scratch.as_ptr(), buffer),
            other => panic!("unexpected backend {other:?}"),
        }

        let mut backend =
            AnalogsBackend::resolve(&analogs(AnalogsType::OpenVr, "controller-0"), &ctx).unwrap();
        let mut values = vec![0.0; 3];
        hmd.set_analogs(HmdInput::Controller(0), &[0.25]);
        backend.poll(&mut values);
        assert_eq!(values, vec![0.25, 0.0, 0.0]);
    }
}
