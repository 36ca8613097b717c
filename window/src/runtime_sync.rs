//! Frame hand-off to a presentation thread owned by an HMD runtime.
//!
//! Some runtimes present from their own thread and call back into the
//! application once per display refresh. There is no render thread of ours
//! to hand-shake with; instead a single state word moves through
//! idle (0), submitted (1) and presented (2) by compare-and-set.

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

const IDLE: u8 = 0;
const SUBMITTED: u8 = 1;
const PRESENTED: u8 = 2;

/// Single-slot frame exchange between the main thread and a runtime thread.
///
/// # Example
///
/// ```ignore
/// // main thread
/// sync.submit(frame);
/// sync.wait_presented();
///
/// // runtime thread, once per refresh
/// sync.present(|frame| draw(frame));
/// ```
#[derive(Debug)]
pub struct FrameSync<T> {
    state: AtomicU8,
    frame: Mutex<Option<T>>,
}

impl<T> Default for FrameSync<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameSync<T> {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(IDLE),
            frame: Mutex::new(None),
        }
    }

    /// Hand a frame to the runtime.
    ///
    /// Waits until the previous frame was collected with
    /// [`wait_presented`](Self::wait_presented).
    pub fn submit(&self, frame: T) {
        while self.state.load(Ordering::Acquire) != IDLE {
            thread::yield_now();
        }
        *self.frame.lock() = Some(frame);
        while self
            .state
            .compare_exchange_weak(IDLE, SUBMITTED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            thread::yield_now();
        }
    }

    /// Runtime side: present the submitted frame, if any.
    ///
    /// Returns whether a frame was presented. Each submitted frame is
    /// presented at most once; later calls return `false` until the next
    /// submit.
    pub fn present(&self, f: impl FnOnce(&T)) -> bool {
        if self.state.load(Ordering::Acquire) != SUBMITTED {
            return false;
        }
        if let Some(frame) = self.frame.lock().as_ref() {
            f(frame);
        }
        self.state.store(PRESENTED, Ordering::Release);
        true
    }

    /// Wait until the runtime presented the last submitted frame.
    pub fn wait_presented(&self) {
        while self
            .state
            .compare_exchange_weak(PRESENTED, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            thread::sleep(Duration::from_micros(1));
        }
    }

    /// Whether a submitted frame waits for the runtime.
    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == SUBMITTED
    }
}
