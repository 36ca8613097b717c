//! Snapshot slots for push-based device sources.
//!
//! Network trackers deliver reports on their own thread. The receiving side
//! publishes each report into a per-source slot; a device bound to that
//! source reads the latest snapshot once per frame in `update()`. Reads are
//! lock-free loads of an [`ArcSwap`]; writers replace the whole snapshot.
//!
//! # Example
//!
//! ```ignore
//! let source = ctx.callbacks().source("Tracker0@localhost");
//! // on the network thread:
//! source.publish_pose(0, position, orientation);
//! source.publish_button(3, true);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use parking_lot::RwLock;
use vrplex_core::math::{Quat, Vec3};

/// Latest pose published for a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseReport {
    pub position: Vec3,
    pub orientation: Quat,
}

/// Latest velocity published for a sensor.
///
/// `sequence` increases with every publication so a reader can tell a fresh
/// report from one it already consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityReport {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub sequence: u64,
}

/// Pose and velocity slots of one sensor (or of "any sensor").
#[derive(Debug, Default)]
pub struct TrackerSlot {
    pose: ArcSwapOption<PoseReport>,
    velocity: ArcSwapOption<VelocityReport>,
}

impl TrackerSlot {
    pub fn pose(&self) -> Option<PoseReport> {
        self.pose.load_full().map(|r| *r)
    }

    pub fn velocity(&self) -> Option<VelocityReport> {
        self.velocity.load_full().map(|r| *r)
    }
}

/// One named push source (a remote tracker, button box or analog box).
#[derive(Debug)]
pub struct CallbackSource {
    name: String,
    any_sensor: Arc<TrackerSlot>,
    sensors: RwLock<HashMap<u32, Arc<TrackerSlot>>>,
    buttons: ArcSwap<Vec<bool>>,
    analogs: ArcSwap<Vec<f32>>,
    velocity_sequence: AtomicU64,
}

impl CallbackSource {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            any_sensor: Arc::new(TrackerSlot::default()),
            sensors: RwLock::new(HashMap::new()),
            buttons: ArcSwap::from_pointee(Vec::new()),
            analogs: ArcSwap::from_pointee(Vec::new()),
            velocity_sequence: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot for one sensor, or for reports of any sensor when `sensor` is `None`.
    pub fn tracker_slot(&self, sensor: Option<u32>) -> Arc<TrackerSlot> {
        match sensor {
            None => Arc::clone(&self.any_sensor),
            Some(s) => {
                if let Some(slot) = self.sensors.read().get(&s) {
                    return Arc::clone(slot);
                }
                Arc::clone(self.sensors.write().entry(s).or_default())
            }
        }
    }

    fn sensor_slots(&self, sensor: u32) -> [Arc<TrackerSlot>; 2] {
        [self.tracker_slot(Some(sensor)), Arc::clone(&self.any_sensor)]
    }

    pub fn publish_pose(&self, sensor: u32, position: Vec3, orientation: Quat) {
        let report = Arc::new(PoseReport {
            position,
            orientation,
        });
        for slot in self.sensor_slots(sensor) {
            slot.pose.store(Some(Arc::clone(&report)));
        }
    }

    pub fn publish_velocity(&self, sensor: u32, velocity: Vec3, angular_velocity: Vec3) {
        let sequence = self.velocity_sequence.fetch_add(1, Ordering::AcqRel) + 1;
        let report = Arc::new(VelocityReport {
            velocity,
            angular_velocity,
            sequence,
        });
        for slot in self.sensor_slots(sensor) {
            slot.velocity.store(Some(Arc::clone(&report)));
        }
    }

    /// Set one button channel, growing the channel table as needed.
    pub fn publish_button(&self, channel: usize, pressed: bool) {
        self.buttons.rcu(|current| {
            let mut next = Vec::clone(current);
            if next.len() <= channel {
                next.resize(channel + 1, false);
            }
            next[channel] = pressed;
            next
        });
    }

    /// Replace all analog channels.
    pub fn publish_analogs(&self, channels: &[f32]) {
        self.analogs.store(Arc::new(channels.to_vec()));
    }

    pub fn buttons(&self) -> Arc<Vec<bool>> {
        self.buttons.load_full()
    }

    pub fn analogs(&self) -> Arc<Vec<f32>> {
        self.analogs.load_full()
    }
}

/// Registry of named push sources.
#[derive(Debug, Default)]
pub struct CallbackHub {
    sources: RwLock<HashMap<String, Arc<CallbackSource>>>,
}

impl CallbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source with the given name, created on first use.
    pub fn source(&self, name: &str) -> Arc<CallbackSource> {
        if let Some(source) = self.sources.read().get(name) {
            return Arc::clone(source);
        }
        let mut sources = self.sources.write();
        let source = sources.entry(name.to_owned()).or_insert_with(|| {
            log::debug!("Callback source {} registered", name);
            Arc::new(CallbackSource::new(name))
        });
        Arc::clone(source)
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_source() {
        let hub = CallbackHub::new();
        let a = hub.source("Tracker0@localhost");
        let b = hub.source("Tracker0@localhost");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn pose_reaches_sensor_and_any_slot() {
        let hub = CallbackHub::new();
        let source = hub.source("t");
        let sensor1 = source.tracker_slot(Some(1));
        let sensor2 = source.tracker_slot(Some(2));
        let any = source.tracker_slot(None);
        source.publish_pose(1, Vec3::new(1.0, 2.0, 3.0), Quat::identity());
        assert_eq!(sensor1.pose().map(|p| p.position), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(any.pose().map(|p| p.position), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert!(sensor2.pose().is_none());
    }

    #[test]
    fn velocity_sequence_increases() {
        let source = CallbackHub::new().source("t");
        let slot = source.tracker_slot(None);
        source.publish_velocity(0, Vec3::x(), Vec3::zeros());
        let first = slot.velocity().map(|v| v.sequence);
        source.publish_velocity(0, Vec3::y(), Vec3::zeros());
        let second = slot.velocity().map(|v| v.sequence);
        assert!(second > first);
    }

    #[test]
    fn buttons_grow_on_demand() {
        let source = CallbackHub::new().source("b");
        source.publish_button(3, true);
        assert_eq!(*source.buttons(), vec![false, false, false, true]);
        source.publish_button(0, true);
        assert_eq!(*source.buttons(), vec![true, false, false, true]);
    }

    #[test]
    fn publish_from_another_thread() {
        let source = CallbackHub::new().source("remote");
        let slot = source.tracker_slot(Some(0));
        let writer = Arc::clone(&source);
        std::thread::spawn(move || {
            writer.publish_pose(0, Vec3::new(0.0, 1.5, 0.0), Quat::identity());
            writer.publish_analogs(&[0.25, -0.5]);
        })
        .join()
        .unwrap();
        assert_eq!(slot.pose().map(|p| p.position.y), Some(1.5));
        assert_eq!(*source.analogs(), vec![0.25, -0.5]);
    }
}
