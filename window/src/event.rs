//! Input events packaged with the render context they happened in.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vrplex_core::input::{KeyCode, Modifiers, MouseButton};

use crate::context::RenderContext;

/// Input from a window, in window pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    KeyPress { key: KeyCode, modifiers: Modifiers },
    KeyRelease { key: KeyCode, modifiers: Modifiers },
    MouseMove { position: [f32; 2], modifiers: Modifiers },
    MousePress { button: MouseButton, position: [f32; 2], modifiers: Modifiers },
    MouseRelease { button: MouseButton, position: [f32; 2], modifiers: Modifiers },
    MouseDoubleClick { button: MouseButton, position: [f32; 2], modifiers: Modifiers },
    Wheel { delta: [f32; 2], position: [f32; 2], modifiers: Modifiers },
}

/// An input event with the context of the window it was delivered to.
///
/// The context lets the application map pointer positions back into the
/// scene as it was shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub window: usize,
    pub kind: EventKind,
    pub context: RenderContext,
}

/// First-in first-out event queue shared by all windows of a process.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Arc<Mutex<VecDeque<Event>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<Event> {
        self.events.lock().pop_front()
    }

    /// Take all queued events in arrival order.
    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
