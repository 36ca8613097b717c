use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vrplex_core::config::{ScreenPlacement, WindowConfig};
use vrplex_core::hmd::mock::MockHmd;
use vrplex_core::math::{Vec3, quat_from_euler_degrees};
use vrplex_core::{HmdKind, HmdRuntime, OutputMode, Rect, ScreenInfo};
use vrplex_device::TrackedObserver;
use vrplex_window::screen_wall::{screen_wall, wall_frustum};
use vrplex_window::{DummyTextureBackend, HeadlessWindowSystem, RenderContextBuilder, Window, WindowEnv};

fn screen() -> ScreenInfo {
    ScreenInfo::new(Rect::new(0, 0, 1920, 1080), [0.52, 0.29])
}

fn observer() -> TrackedObserver {
    let mut observer = TrackedObserver::standalone("viewer");
    observer.set_navigation(
        Vec3::new(2.0, 0.0, -3.0),
        quat_from_euler_degrees(30.0, 0.0, 0.0),
    );
    observer
}

// ---------------------------------------------------------------------------
// Screen wall
// ---------------------------------------------------------------------------

fn bench_screen_wall(c: &mut Criterion) {
    let placement = ScreenPlacement::default();
    let window = Rect::new(200, 100, 1280, 720);
    let screen = screen();
    let eye = Vec3::new(0.03, 1.76, 0.0);
    c.bench_function("screen_wall_and_frustum", |b| {
        b.iter(|| {
            let wall = screen_wall(black_box(&placement), &window, &screen, None);
            black_box(wall_frustum(&wall, &eye, 0.1, 100.0));
        });
    });
}

// ---------------------------------------------------------------------------
// Render context
// ---------------------------------------------------------------------------

fn bench_compute_desktop(c: &mut Criterion) {
    let config = WindowConfig::new("main", "viewer", OutputMode::RedCyan);
    let mut builder =
        RenderContextBuilder::new(0, 0, &config, Arc::new(DummyTextureBackend::new()), None)
            .unwrap();
    let observer = observer();
    let window = Rect::new(0, 0, 1280, 720);
    let screen = screen();
    c.bench_function("render_context_compute_anaglyph", |b| {
        b.iter(|| {
            black_box(builder.compute(&observer, window, &screen, 0.1, 100.0).unwrap());
        });
    });
}

fn bench_compute_hmd(c: &mut Criterion) {
    let config = WindowConfig::new("hmd", "viewer", OutputMode::Oculus);
    let hmd: Arc<dyn HmdRuntime> = Arc::new(MockHmd::new(HmdKind::Oculus));
    let mut builder =
        RenderContextBuilder::new(0, 0, &config, Arc::new(DummyTextureBackend::new()), Some(hmd))
            .unwrap();
    let observer = observer();
    let window = Rect::new(0, 0, 1280, 720);
    let screen = screen();
    c.bench_function("render_context_compute_swap_chains", |b| {
        b.iter(|| {
            black_box(builder.compute(&observer, window, &screen, 0.1, 100.0).unwrap());
        });
    });
}

// ---------------------------------------------------------------------------
// Render thread handshake
// ---------------------------------------------------------------------------

fn bench_window_frame(c: &mut Criterion) {
    let env = WindowEnv::new(
        Arc::new(HeadlessWindowSystem::new()),
        Arc::new(DummyTextureBackend::new()),
    );
    let config = WindowConfig::new("main", "viewer", OutputMode::Center);
    let mut window = Window::new(0, 0, &config, &env, None).unwrap();
    let observer = observer();
    c.bench_function("window_frame_headless", |b| {
        b.iter(|| {
            window.compute_render_context(&observer, 0.1, 100.0).unwrap();
            window.render_to_screen();
            window.async_swap_buffers();
            window.wait_for_swap_buffers();
        });
    });
}

criterion_group!(screen_benches, bench_screen_wall);
criterion_group!(context_benches, bench_compute_desktop, bench_compute_hmd);
criterion_group!(thread_benches, bench_window_frame);
criterion_main!(screen_benches, context_benches, thread_benches);
