//! Observers: logical viewers placed by tracking and navigation.

use vrplex_core::config::{Config, ObserverConfig};
use vrplex_core::hmd::DEFAULT_EYE_HEIGHT;
use vrplex_core::math::{mat4_from_pose, Mat4, Quat, Vec3};
use vrplex_core::Eye;

use crate::device::TrackedDevice;

/// Per-eye tracking and navigation of a viewer.
///
/// Tracking is the physical pose of the eyes in the tracking space;
/// navigation is the pose of the tracking space in the virtual world.
pub trait Observer {
    fn tracking_position(&self, eye: Eye) -> Vec3;

    fn tracking_orientation(&self, eye: Eye) -> Quat;

    fn navigation_position(&self) -> Vec3;

    fn navigation_orientation(&self) -> Quat;

    /// Pose of the center eye as a matrix.
    fn tracking_matrix(&self) -> Mat4 {
        mat4_from_pose(
            &self.tracking_position(Eye::Center),
            &self.tracking_orientation(Eye::Center),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EyeSource {
    /// Fixed standing head at the origin.
    Default,
    /// Center eye from one device, eyes offset along its x axis.
    Head(usize),
    /// Left and right eye devices.
    Eyes(usize, usize),
}

/// Observer driven by configured tracked devices.
#[derive(Debug, Clone)]
pub struct TrackedObserver {
    id: String,
    source: EyeSource,
    eye_distance: f32,
    positions: [Vec3; 3],
    orientations: [Quat; 3],
    navigation_position: Vec3,
    navigation_orientation: Quat,
}

fn slot(eye: Eye) -> usize {
    match eye {
        Eye::Center => 0,
        Eye::Left => 1,
        Eye::Right => 2,
    }
}

impl TrackedObserver {
    /// Build an observer; device references are resolved against `config`.
    ///
    /// References to unknown devices fall back to the default head.
    pub fn new(observer: &ObserverConfig, config: &Config) -> Self {
        let source = match (&observer.eye_devices, &observer.head_device) {
            (Some([left, right]), _) => match (config.device_index(left), config.device_index(right)) {
                (Some(l), Some(r)) => EyeSource::Eyes(l, r),
                _ => EyeSource::Default,
            },
            (None, Some(head)) => config
                .device_index(head)
                .map_or(EyeSource::Default, EyeSource::Head),
            (None, None) => EyeSource::Default,
        };
        let mut this = Self {
            id: observer.id.clone(),
            source,
            eye_distance: observer.eye_distance,
            positions: [Vec3::zeros(); 3],
            orientations: [Quat::identity(); 3],
            navigation_position: observer.navigation_position(),
            navigation_orientation: observer.navigation_orientation(),
        };
        this.place_head(Vec3::new(0.0, DEFAULT_EYE_HEIGHT, 0.0), Quat::identity());
        this
    }

    /// Observer that is not bound to any device.
    pub fn standalone(id: impl Into<String>) -> Self {
        Self::new(&ObserverConfig::new(id), &Config::default())
    }

    /// Build every configured observer in configuration order.
    pub fn from_config(config: &Config) -> Vec<Self> {
        config.observers.iter().map(|o| Self::new(o, config)).collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Recompute eye poses from the current device states.
    pub fn update(&mut self, devices: &[TrackedDevice]) {
        match self.source {
            EyeSource::Default => {}
            EyeSource::Head(head) => {
                if let Some(device) = devices.get(head) {
                    self.place_head(device.position(), device.orientation());
                }
            }
            EyeSource::Eyes(left, right) => {
                if let (Some(l), Some(r)) = (devices.get(left), devices.get(right)) {
                    self.positions = [
                        (l.position() + r.position()) * 0.5,
                        l.position(),
                        r.position(),
                    ];
                    self.orientations = [
                        l.orientation().slerp(&r.orientation(), 0.5),
                        l.orientation(),
                        r.orientation(),
                    ];
                }
            }
        }
    }

    /// Place the center eye and derive the side eyes from it.
    pub fn place_head(&mut self, position: Vec3, orientation: Quat) {
        let half = orientation * Vec3::new(self.eye_distance * 0.5, 0.0, 0.0);
        self.positions = [position, position - half, position + half];
        self.orientations = [orientation; 3];
    }

    pub fn set_navigation(&mut self, position: Vec3, orientation: Quat) {
        self.navigation_position = position;
        self.navigation_orientation = orientation;
    }
}

impl Observer for TrackedObserver {
    fn tracking_position(&self, eye: Eye) -> Vec3 {
        self.positions[slot(eye)]
    }

    fn tracking_orientation(&self, eye: Eye) -> Quat {
        self.orientations[slot(eye)]
    }

    fn navigation_position(&self) -> Vec3 {
        self.navigation_position
    }

    fn navigation_orientation(&self) -> Quat {
        self.navigation_orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vrplex_core::config::{DeviceConfig, TrackingType};

    use crate::runtime::RuntimeContext;

    #[test]
    fn default_head_is_standing() {
        let observer = TrackedObserver::standalone("viewer");
        let center = observer.tracking_position(Eye::Center);
        assert_eq!(center, Vec3::new(0.0, DEFAULT_EYE_HEIGHT, 0.0));
        let left = observer.tracking_position(Eye::Left);
        let right = observer.tracking_position(Eye::Right);
        assert!(((right - left).norm() - 0.064).abs() < 1e-6);
        assert!(left.x < right.x);
    }

    #[test]
    fn follows_head_device() {
        let mut config = Config::default();
        config.devices.push(
            DeviceConfig::new("head").with_tracking(TrackingType::Static, "1 1.5 0 90 0 0"),
        );
        let mut observer_config = ObserverConfig::new("viewer");
        observer_config.head_device = Some("head".to_owned());
        config.observers.push(observer_config);

        let ctx = RuntimeContext::new(0);
        let devices = TrackedDevice::from_config(&config, &ctx);
        let mut observer = TrackedObserver::from_config(&config).remove(0);
        observer.update(&devices);

        assert_eq!(observer.tracking_position(Eye::Center), Vec3::new(1.0, 1.5, 0.0));
        // Turned left by 90 degrees: the eye axis now runs along z.
        let left = observer.tracking_position(Eye::Left);
        assert!((left - Vec3::new(1.0, 1.5, 0.032)).norm() < 1e-5);
    }

    #[test]
    fn navigation_is_kept() {
        let mut observer = TrackedObserver::standalone("viewer");
        let turn = Quat::from_axis_angle(&Vec3::y_axis(), 1.0);
        observer.set_navigation(Vec3::new(5.0, 0.0, 0.0), turn);
        assert_eq!(observer.navigation_position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(observer.navigation_orientation(), turn);
    }
}
