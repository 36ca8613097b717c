//! Session configuration.
//!
//! A configuration lists the tracked devices, the observers that turn device
//! poses into eye poses, and the processes with the windows each one drives.
//! It is loaded from TOML:
//!
//! ```toml
//! [[device]]
//! id = "head"
//! tracking = { type = "static", parameters = "0 1.76 0" }
//!
//! [[observer]]
//! id = "viewer"
//! head_device = "head"
//!
//! [[process]]
//! id = "main"
//!
//! [[process.window]]
//! id = "wall"
//! observer = "viewer"
//! output_mode = "stereo"
//! screen = { given_by = "corners", bottom_left = [-1, 0, -2], bottom_right = [1, 0, -2], top_left = [-1, 2, -2] }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::math::{quat_from_xyzw, Quat, Vec3};
use crate::output::OutputMode;

/// Default distance between the eyes in meters.
pub const DEFAULT_EYE_DISTANCE: f32 = 0.064;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceConfig>,
    #[serde(default, rename = "observer")]
    pub observers: Vec<ObserverConfig>,
    #[serde(default, rename = "process")]
    pub processes: Vec<ProcessConfig>,
}

/// Tracking source of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingType {
    #[default]
    None,
    Static,
    Vrpn,
    Oculus,
    #[serde(rename = "openvr")]
    OpenVr,
    Osvr,
}

/// Button source of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonsType {
    #[default]
    None,
    Static,
    Gamepad,
    Vrpn,
    Oculus,
    #[serde(rename = "openvr")]
    OpenVr,
    Osvr,
}

/// Analog source of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalogsType {
    #[default]
    None,
    Static,
    Gamepad,
    Vrpn,
    Oculus,
    #[serde(rename = "openvr")]
    OpenVr,
    Osvr,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingSpec {
    #[serde(rename = "type", default)]
    pub kind: TrackingType,
    #[serde(default)]
    pub parameters: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonsSpec {
    #[serde(rename = "type", default)]
    pub kind: ButtonsType,
    #[serde(default)]
    pub parameters: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalogsSpec {
    #[serde(rename = "type", default)]
    pub kind: AnalogsType,
    #[serde(default)]
    pub parameters: String,
}

/// One tracked input device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    /// Index of the process that polls this device.
    #[serde(default)]
    pub process: usize,
    #[serde(default)]
    pub tracking: TrackingSpec,
    #[serde(default)]
    pub buttons: ButtonsSpec,
    #[serde(default)]
    pub analogs: AnalogsSpec,
}

impl DeviceConfig {
    /// Device with no backends at all.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            process: 0,
            tracking: TrackingSpec::default(),
            buttons: ButtonsSpec::default(),
            analogs: AnalogsSpec::default(),
        }
    }

    pub fn with_tracking(mut self, kind: TrackingType, parameters: &str) -> Self {
        self.tracking = TrackingSpec {
            kind,
            parameters: parameters.to_owned(),
        };
        self
    }

    pub fn with_buttons(mut self, kind: ButtonsType, parameters: &str) -> Self {
        self.buttons = ButtonsSpec {
            kind,
            parameters: parameters.to_owned(),
        };
        self
    }

    pub fn with_analogs(mut self, kind: AnalogsType, parameters: &str) -> Self {
        self.analogs = AnalogsSpec {
            kind,
            parameters: parameters.to_owned(),
        };
        self
    }

    pub fn with_process(mut self, process: usize) -> Self {
        self.process = process;
        self
    }
}

/// A logical viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverConfig {
    pub id: String,
    /// Device whose pose is the center eye; eyes are offset by `eye_distance`.
    #[serde(default)]
    pub head_device: Option<String>,
    /// Devices tracking the left and right eye directly.
    #[serde(default)]
    pub eye_devices: Option<[String; 2]>,
    #[serde(default = "default_eye_distance")]
    pub eye_distance: f32,
    #[serde(default)]
    pub navigation_position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    #[serde(default = "identity_xyzw")]
    pub navigation_orientation: [f32; 4],
}

impl ObserverConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            head_device: None,
            eye_devices: None,
            eye_distance: DEFAULT_EYE_DISTANCE,
            navigation_position: [0.0; 3],
            navigation_orientation: identity_xyzw(),
        }
    }

    pub fn navigation_position(&self) -> Vec3 {
        Vec3::from(self.navigation_position)
    }

    pub fn navigation_orientation(&self) -> Quat {
        let [x, y, z, w] = self.navigation_orientation;
        quat_from_xyzw(x, y, z, w)
    }
}

/// How the physical screen area of a window is described.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "given_by", rename_all = "kebab-case")]
pub enum ScreenPlacement {
    /// Centered at a point; extent comes from the physical size of the display.
    Center { center: [f32; 3] },
    /// Explicit wall corners.
    Corners {
        bottom_left: [f32; 3],
        bottom_right: [f32; 3],
        top_left: [f32; 3],
    },
}

impl Default for ScreenPlacement {
    fn default() -> Self {
        ScreenPlacement::Center {
            center: [0.0, 0.0, -1.0],
        }
    }
}

/// One output window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub id: String,
    pub observer: String,
    #[serde(default)]
    pub output_mode: OutputMode,
    #[serde(default = "default_resolution_factor")]
    pub resolution_factor: f32,
    /// `"path arg1 arg2 ..."` of an output plugin replacing the built-in output pass.
    #[serde(default)]
    pub output_plugin: Option<String>,
    #[serde(default)]
    pub initial_screen: Option<usize>,
    #[serde(default)]
    pub initial_fullscreen: bool,
    /// Position relative to the screen origin.
    #[serde(default)]
    pub initial_position: Option<[i32; 2]>,
    #[serde(default = "default_window_size")]
    pub initial_size: [u32; 2],
    #[serde(default)]
    pub screen: ScreenPlacement,
    #[serde(default)]
    pub screen_is_fixed_to_observer: bool,
}

impl WindowConfig {
    pub fn new(id: impl Into<String>, observer: impl Into<String>, output_mode: OutputMode) -> Self {
        Self {
            id: id.into(),
            observer: observer.into(),
            output_mode,
            resolution_factor: default_resolution_factor(),
            output_plugin: None,
            initial_screen: None,
            initial_fullscreen: false,
            initial_position: None,
            initial_size: default_window_size(),
            screen: ScreenPlacement::default(),
            screen_is_fixed_to_observer: false,
        }
    }
}

/// One process and the windows it drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub id: String,
    #[serde(default, rename = "window")]
    pub windows: Vec<WindowConfig>,
}

fn default_eye_distance() -> f32 {
    DEFAULT_EYE_DISTANCE
}

fn identity_xyzw() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_resolution_factor() -> f32 {
    1.0
}

fn default_window_size() -> [u32; 2] {
    [800, 600]
}

impl Config {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!(
            "Loaded configuration {}: {} devices, {} observers, {} processes",
            path.display(),
            config.devices.len(),
            config.observers.len(),
            config.processes.len()
        );
        Ok(config)
    }

    /// Check cross references and value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.processes.is_empty() {
            return Err(ConfigError::NoProcess);
        }
        unique_ids("device", self.devices.iter().map(|d| d.id.as_str()))?;
        unique_ids("observer", self.observers.iter().map(|o| o.id.as_str()))?;
        unique_ids("process", self.processes.iter().map(|p| p.id.as_str()))?;
        unique_ids(
            "window",
            self.processes
                .iter()
                .flat_map(|p| p.windows.iter().map(|w| w.id.as_str())),
        )?;

        for device in &self.devices {
            if device.process >= self.processes.len() {
                return Err(ConfigError::InvalidProcess {
                    device: device.id.clone(),
                    process: device.process,
                    count: self.processes.len(),
                });
            }
        }
        for observer in &self.observers {
            let referenced = observer
                .head_device
                .iter()
                .chain(observer.eye_devices.iter().flatten());
            for device in referenced {
                if self.device_index(device).is_none() {
                    return Err(ConfigError::UnknownDevice {
                        observer: observer.id.clone(),
                        device: device.clone(),
                    });
                }
            }
        }
        for window in self.processes.iter().flat_map(|p| &p.windows) {
            if self.observer_index(&window.observer).is_none() {
                return Err(ConfigError::UnknownObserver {
                    window: window.id.clone(),
                    observer: window.observer.clone(),
                });
            }
            if window.resolution_factor.is_nan() || window.resolution_factor <= 0.0 {
                return Err(ConfigError::InvalidResolutionFactor {
                    window: window.id.clone(),
                    factor: window.resolution_factor,
                });
            }
        }
        Ok(())
    }

    pub fn device_index(&self, id: &str) -> Option<usize> {
        self.devices.iter().position(|d| d.id == id)
    }

    pub fn observer_index(&self, id: &str) -> Option<usize> {
        self.observers.iter().position(|o| o.id == id)
    }

    pub fn process_index(&self, id: &str) -> Option<usize> {
        self.processes.iter().position(|p| p.id == id)
    }
}

fn unique_ids<'a>(kind: &'static str, ids: impl Iterator<Item = &'a str>) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                kind,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [[device]]
        id = "head"
        tracking = { type = "static", parameters = "0 1.76 0" }

        [[device]]
        id = "pad"
        buttons = { type = "gamepad", parameters = "0" }
        analogs = { type = "gamepad", parameters = "0" }

        [[observer]]
        id = "viewer"
        head_device = "head"

        [[process]]
        id = "main"

        [[process.window]]
        id = "wall"
        observer = "viewer"
        output_mode = "red-cyan"
        resolution_factor = 0.5
        screen = { given_by = "corners", bottom_left = [-1, 0, -2], bottom_right = [1, 0, -2], top_left = [-1, 2, -2] }
    "#;

    #[test]
    fn parses_sample() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].tracking.kind, TrackingType::Static);
        assert_eq!(config.devices[1].buttons.kind, ButtonsType::Gamepad);
        assert_eq!(config.devices[1].tracking.kind, TrackingType::None);
        let window = &config.processes[0].windows[0];
        assert_eq!(window.output_mode, OutputMode::RedCyan);
        assert_eq!(window.resolution_factor, 0.5);
        assert_eq!(window.initial_size, [800, 600]);
        assert!(matches!(window.screen, ScreenPlacement::Corners { .. }));
        assert_eq!(config.observers[0].eye_distance, DEFAULT_EYE_DISTANCE);
        assert_eq!(config.observers[0].navigation_orientation(), Quat::identity());
    }

    #[test]
    fn rejects_unknown_observer() {
        let text = SAMPLE.replace("observer = \"viewer\"", "observer = \"nobody\"");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownObserver { .. }));
    }

    #[test]
    fn rejects_duplicate_device() {
        let text = SAMPLE.replace("id = \"pad\"", "id = \"head\"");
        let err = Config::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId { kind: "device", .. }));
    }

    #[test]
    fn rejects_device_on_missing_process() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.devices[0].process = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProcess { process: 3, .. })
        ));
    }

    #[test]
    fn rejects_non_positive_resolution_factor() {
        let text = SAMPLE.replace("resolution_factor = 0.5", "resolution_factor = 0.0");
        assert!(matches!(
            Config::from_toml_str(&text),
            Err(ConfigError::InvalidResolutionFactor { .. })
        ));
    }

    #[test]
    fn empty_config_has_no_process() {
        assert!(matches!(Config::from_toml_str(""), Err(ConfigError::NoProcess)));
    }
}
