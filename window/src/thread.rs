//! Render thread of a window and its two-phase handshake with the main thread.
//!
//! The main thread owns two locks between frames: the frame lock, which
//! guards the data the render phase reads, and the swap lock. Releasing a
//! lock lets the worker run exactly one phase; the worker raises the
//! matching finished flag after unlocking.
//!
//! Per frame the main thread calls, in this order:
//!
//! 1. [`WindowRenderThread::frame_mut`] to publish the frame data
//! 2. [`WindowRenderThread::render_to_screen`], which blocks until the
//!    render phase is done
//! 3. [`WindowRenderThread::async_swap_buffers`], which returns at once
//! 4. [`WindowRenderThread::wait_for_swap_buffers`], which blocks until the
//!    swap phase is done
//!
//! Between steps 3 and 4 the main thread is free to drive other windows, so
//! several windows present in parallel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

/// Work done on a window's render thread.
pub trait RenderWorker<F>: Send + 'static {
    /// Called once on the render thread before the first frame.
    fn begin(&mut self) {}

    /// Render phase of one frame.
    fn render(&mut self, frame: &F);

    /// Swap phase of the frame rendered last.
    fn swap(&mut self);

    /// Called once on the render thread after the last frame.
    fn end(&mut self) {}
}

#[derive(Debug, Default)]
struct Flags {
    rendering_finished: AtomicBool,
    swap_finished: AtomicBool,
    exit: AtomicBool,
}

/// Dedicated thread executing the render and swap phases of one window.
pub struct WindowRenderThread<F: Send + 'static> {
    name: String,
    flags: Arc<Flags>,
    frame: Arc<Mutex<F>>,
    swap: Arc<Mutex<()>>,
    frame_guard: Option<ArcMutexGuard<RawMutex, F>>,
    swap_guard: Option<ArcMutexGuard<RawMutex, ()>>,
    handle: Option<JoinHandle<()>>,
}

impl<F: Send + 'static> WindowRenderThread<F> {
    /// Start the thread. The caller holds both locks on return.
    pub fn spawn<W>(name: impl Into<String>, frame: F, worker: W) -> std::io::Result<Self>
    where
        W: RenderWorker<F>,
    {
        let name = name.into();
        let frame = Arc::new(Mutex::new(frame));
        let swap = Arc::new(Mutex::new(()));
        let frame_guard = frame.lock_arc();
        let swap_guard = swap.lock_arc();
        let flags = Arc::new(Flags::default());

        let handle = thread::Builder::new().name(name.clone()).spawn({
            let flags = flags.clone();
            let frame = frame.clone();
            let swap = swap.clone();
            move || run(worker, &frame, &swap, &flags)
        })?;
        log::debug!("Render thread {} started", name);

        Ok(Self {
            name,
            flags,
            frame,
            swap,
            frame_guard: Some(frame_guard),
            swap_guard: Some(swap_guard),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame data for the next render phase. `None` after shutdown.
    pub fn frame_mut(&mut self) -> Option<&mut F> {
        self.frame_guard.as_deref_mut()
    }

    /// Run the render phase and wait for it to finish.
    pub fn render_to_screen(&mut self) {
        let Some(guard) = self.frame_guard.take() else {
            return;
        };
        self.flags.rendering_finished.store(false, Ordering::Release);
        drop(guard);
        while !self.flags.rendering_finished.load(Ordering::Acquire) {
            if self.worker_gone() {
                break;
            }
            thread::yield_now();
        }
        self.frame_guard = Some(self.frame.lock_arc());
    }

    /// Start the swap phase without waiting for it.
    pub fn async_swap_buffers(&mut self) {
        if let Some(guard) = self.swap_guard.take() {
            self.flags.swap_finished.store(false, Ordering::Release);
            drop(guard);
        }
    }

    /// Wait for the swap phase started by [`async_swap_buffers`](Self::async_swap_buffers).
    pub fn wait_for_swap_buffers(&mut self) {
        if self.swap_guard.is_some() || self.handle.is_none() {
            return;
        }
        while !self.flags.swap_finished.load(Ordering::Acquire) {
            if self.worker_gone() {
                break;
            }
            thread::sleep(Duration::from_micros(1));
        }
        self.swap_guard = Some(self.swap.lock_arc());
    }

    /// Stop the thread. The pending phase, if any, is not executed.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.flags.exit.store(true, Ordering::Release);
        self.frame_guard = None;
        self.swap_guard = None;
        if handle.join().is_err() {
            log::error!("Render thread {} panicked", self.name);
        } else {
            log::debug!("Render thread {} stopped", self.name);
        }
    }

    fn worker_gone(&self) -> bool {
        let gone = self.handle.as_ref().map_or(true, JoinHandle::is_finished);
        if gone {
            log::error!("Render thread {} is gone", self.name);
        }
        gone
    }
}

impl<F: Send + 'static> Drop for WindowRenderThread<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<F, W: RenderWorker<F>>(mut worker: W, frame: &Mutex<F>, swap: &Mutex<()>, flags: &Flags) {
    worker.begin();
    loop {
        {
            let frame = frame.lock();
            if !flags.exit.load(Ordering::Acquire) {
                worker.render(&frame);
            }
        }
        flags.rendering_finished.store(true, Ordering::Release);
        if flags.exit.load(Ordering::Acquire) {
            break;
        }

        {
            let _swap = swap.lock();
            if !flags.exit.load(Ordering::Acquire) {
                worker.swap();
            }
        }
        flags.swap_finished.store(true, Ordering::Release);
        if flags.exit.load(Ordering::Acquire) {
            break;
        }
    }
    worker.end();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, entry: String) {
            self.0.lock().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    struct Recorder {
        log: Log,
        last: u32,
    }

    impl RenderWorker<u32> for Recorder {
        fn begin(&mut self) {
            self.log.push("begin".into());
        }

        fn render(&mut self, frame: &u32) {
            self.last = *frame;
            self.log.push(format!("render {frame}"));
        }

        fn swap(&mut self) {
            self.log.push(format!("swap {}", self.last));
        }

        fn end(&mut self) {
            self.log.push("end".into());
        }
    }

    fn spawn(log: &Log) -> WindowRenderThread<u32> {
        let worker = Recorder {
            log: log.clone(),
            last: 0,
        };
        WindowRenderThread::spawn("vrplex-test", 0, worker).unwrap()
    }

    #[test]
    fn frames_alternate_render_and_swap() {
        let log = Log::default();
        let mut thread = spawn(&log);
        for frame in 1..=4 {
            *thread.frame_mut().unwrap() = frame;
            thread.render_to_screen();
            thread.async_swap_buffers();
            thread.wait_for_swap_buffers();
        }
        thread.shutdown();

        let mut expected = vec!["begin".to_owned()];
        for frame in 1..=4 {
            expected.push(format!("render {frame}"));
            expected.push(format!("swap {frame}"));
        }
        expected.push("end".into());
        assert_eq!(log.entries(), expected);
    }

    #[test]
    fn render_phase_is_done_on_return() {
        let log = Log::default();
        let mut thread = spawn(&log);
        *thread.frame_mut().unwrap() = 7;
        thread.render_to_screen();
        assert_eq!(log.entries().last().map(String::as_str), Some("render 7"));
    }

    #[test]
    fn exit_skips_pending_phase() {
        let log = Log::default();
        let mut thread = spawn(&log);
        thread.render_to_screen();
        // The swap phase was never released.
        drop(thread);
        assert_eq!(log.entries(), vec!["begin", "render 0", "end"]);
    }

    #[test]
    fn shutdown_before_first_frame() {
        let log = Log::default();
        let mut thread = spawn(&log);
        thread.shutdown();
        thread.shutdown();
        assert!(thread.frame_mut().is_none());
        assert_eq!(log.entries(), vec!["begin", "end"]);
    }
}
