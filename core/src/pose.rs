//! Pose samples and the monotonic clock that timestamps them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};

/// Monotonic timestamp in nanoseconds.
///
/// "Unset" is expressed as `Option<Timestamp>::None` rather than a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Timestamp from a nanosecond count.
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Nanoseconds since the clock origin.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`, or `None` if time did not advance.
    pub fn seconds_since(self, earlier: Timestamp) -> Option<f64> {
        let delta = self.0.checked_sub(earlier.0)?;
        if delta == 0 {
            return None;
        }
        Some(delta as f64 / 1e9)
    }
}

/// One tracking sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub position: Vec3,
    pub orientation: Quat,
    /// Units per second.
    pub velocity: Vec3,
    /// Radians per second, axis scaled by angle.
    pub angular_velocity: Vec3,
    pub timestamp: Option<Timestamp>,
}

impl Default for PoseSample {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            timestamp: None,
        }
    }
}

impl PoseSample {
    /// Sample at a fixed pose with zero velocities and no timestamp.
    pub fn at(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
            ..Self::default()
        }
    }
}

/// Source of monotonic timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed monotonic clock, starting at zero on construction.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_nanos() as u64)
    }
}

/// Manually advanced clock for deterministic sessions and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            nanos: AtomicU64::new(start.0),
        }
    }

    pub fn set(&self, t: Timestamp) {
        self.nanos.store(t.0, Ordering::Release);
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.nanos.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_between_timestamps() {
        let a = Timestamp::from_nanos(1_000_000_000);
        let b = Timestamp::from_nanos(1_500_000_000);
        assert_eq!(b.seconds_since(a), Some(0.5));
        assert_eq!(a.seconds_since(b), None);
        assert_eq!(a.seconds_since(a), None);
    }

    #[test]
    fn default_sample_is_identity() {
        let s = PoseSample::default();
        assert_eq!(s.position, Vec3::zeros());
        assert_eq!(s.orientation, Quat::identity());
        assert!(s.timestamp.is_none());
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Timestamp(10));
        clock.advance(Duration::from_nanos(5));
        assert_eq!(clock.now(), Timestamp(15));
        clock.set(Timestamp(3));
        assert_eq!(clock.now(), Timestamp(3));
    }

    #[test]
    fn monotonic_clock_does_not_go_back() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
