//! # Headless Session
//!
//! Runs one process of a configuration for a number of frames with a
//! simulated window system, texture backend and HMD runtime.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use vrplex_core::Config;
use vrplex_demos::{default_config, Session};

/// vrplex headless session arguments.
#[derive(Parser, Debug)]
#[command(
    name = "headless_session",
    about = "Run a vrplex configuration without a display",
    long_about = "Runs devices, observers and the windows of one process for a number of \
                  frames.\n\nWithout --config a single desktop window is used."
)]
struct Args {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Process to run, by id or index.
    #[arg(long, default_value = "0")]
    process: String,

    /// Number of frames to run.
    #[arg(long, default_value = "120")]
    frames: u64,

    /// Near clipping plane in meters.
    #[arg(long, default_value = "0.05")]
    near: f32,

    /// Far clipping plane in meters.
    #[arg(long, default_value = "100.0")]
    far: f32,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    vrplex_core::init();
    vrplex_device::init();
    vrplex_window::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> vrplex_demos::SessionResult<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };
    let process = config
        .process_index(&args.process)
        .or_else(|| args.process.parse().ok())
        .ok_or_else(|| format!("unknown process {}", args.process))?;

    let mut session = Session::new(config, process)?;
    let mut state_bytes = 0;
    for _ in 0..args.frames {
        let stats = session.frame(args.near, args.far)?;
        state_bytes += stats.state_bytes;
        if stats.frame % 60 == 0 {
            log::info!("Frame {} ({} windows)", stats.frame, stats.windows);
        }
    }
    for window in session.windows() {
        let ctx = window.render_context();
        log::info!(
            "Window {}: {} view(s), texture {:?}",
            window.id(),
            ctx.view_count(),
            ctx.texture_size(0)
        );
    }
    log::info!(
        "{} frames done, {} bytes of device state",
        args.frames,
        state_bytes
    );
    session.shutdown();
    Ok(())
}
