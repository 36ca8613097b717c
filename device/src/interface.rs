//! Path-addressed input interfaces.
//!
//! Some tracking middleware exposes every sensor, button and axis under a
//! path such as `/me/hands/left` or `/controller/left/1`. A device resolves
//! its paths once at construction; unresolvable paths are reported and the
//! affected channel stays at its default value.

use std::collections::HashMap;

use parking_lot::RwLock;
use vrplex_core::math::{Quat, Vec3};

/// Resolved interface handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(pub u32);

/// Client of a path-addressed tracking service.
///
/// State queries return `None` when the service has no report yet.
pub trait InterfaceProvider: Send + Sync {
    fn resolve(&self, path: &str) -> Option<InterfaceId>;

    fn pose(&self, id: InterfaceId) -> Option<(Vec3, Quat)>;

    fn button(&self, id: InterfaceId) -> Option<bool>;

    fn analog(&self, id: InterfaceId) -> Option<f32>;
}

#[derive(Debug, Clone, Copy, Default)]
struct InterfaceState {
    pose: Option<(Vec3, Quat)>,
    button: Option<bool>,
    analog: Option<f32>,
}

/// In-memory interface tree for tests and headless sessions.
#[derive(Debug, Default)]
pub struct DummyInterfaces {
    paths: RwLock<HashMap<String, InterfaceId>>,
    states: RwLock<HashMap<InterfaceId, InterfaceState>>,
}

impl DummyInterfaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a path; returns its id.
    pub fn add(&self, path: &str) -> InterfaceId {
        let mut paths = self.paths.write();
        let next = InterfaceId(paths.len() as u32 + 1);
        *paths.entry(path.to_owned()).or_insert(next)
    }

    pub fn set_pose(&self, id: InterfaceId, position: Vec3, orientation: Quat) {
        self.states.write().entry(id).or_default().pose = Some((position, orientation));
    }

    pub fn set_button(&self, id: InterfaceId, pressed: bool) {
        self.states.write().entry(id).or_default().button = Some(pressed);
    }

    pub fn set_analog(&self, id: InterfaceId, value: f32) {
        self.states.write().entry(id).or_default().analog = Some(value);
    }
}

impl InterfaceProvider for DummyInterfaces {
    fn resolve(&self, path: &str) -> Option<InterfaceId> {
        self.paths.read().get(path).copied()
    }

    fn pose(&self, id: InterfaceId) -> Option<(Vec3, Quat)> {
        self.states.read().get(&id).and_then(|s| s.pose)
    }

    fn button(&self, id: InterfaceId) -> Option<bool> {
        self.states.read().get(&id).and_then(|s| s.button)
    }

    fn analog(&self, id: InterfaceId) -> Option<f32> {
        self.states.read().get(&id).and_then(|s| s.analog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_declared_paths_only() {
        let tree = DummyInterfaces::new();
        let id = tree.add("/me/head");
        assert_eq!(tree.add("/me/head"), id);
        assert_eq!(tree.resolve("/me/head"), Some(id));
        assert_eq!(tree.resolve("/me/feet"), None);
    }

    #[test]
    fn state_is_absent_until_reported() {
        let tree = DummyInterfaces::new();
        let id = tree.add("/controller/left/1");
        assert_eq!(tree.button(id), None);
        tree.set_button(id, true);
        assert_eq!(tree.button(id), Some(true));
        assert_eq!(tree.analog(id), None);
    }
}
