// ============================================================================
// main.rs — Dot Matrix
// Entry point. Parses the command line, initializes logging and starts either
// the windowed event loop or a headless run.
// ============================================================================

use std::path::PathBuf;

use clap::Parser;
use winit::event_loop::{ControlFlow, EventLoop};

use dot_matrix::app::App;
use dot_matrix::config::{AppConfig, SimulationParams, Variant};
use dot_matrix::headless::{run_headless, HeadlessConfig};
use dot_matrix::shaders::{EmbeddedShaders, ShaderDirectory, ShaderSources};

#[derive(Parser, Debug)]
#[command(name = "dot-matrix", version, about = "Wave/spring particle field with pointer repulsion")]
struct Cli {
    /// Step the physics on the host instead of in a compute pass
    #[arg(long)]
    cpu: bool,

    /// JSON file overriding any simulation parameter
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load physics.wgsl and draw.wgsl from this directory
    #[arg(long, value_name = "DIR")]
    shader_dir: Option<PathBuf>,

    /// Run this many ticks without a window, then print a summary
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,

    /// Headless viewport width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Headless viewport height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,
}

fn main() -> dot_matrix::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let params = match &cli.config {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };

    if let Some(frames) = cli.headless {
        if cli.cpu {
            log::warn!("--cpu is ignored in headless mode");
        }
        let sources = match &cli.shader_dir {
            Some(dir) => ShaderSources::fetch(&ShaderDirectory(dir.clone()))?,
            None => ShaderSources::fetch(&EmbeddedShaders)?,
        };
        let config = HeadlessConfig {
            frames,
            width: cli.width,
            height: cli.height,
            ..Default::default()
        };
        let report = run_headless(&config, params, &sources)?;
        println!(
            "{} particles after {} ticks: mean displacement {:.3}px, max {:.3}px, max speed {:.3}px/tick, non-finite {}",
            report.particle_count,
            report.frames,
            report.mean_displacement,
            report.max_displacement,
            report.max_speed,
            report.non_finite,
        );
        return Ok(());
    }

    let config = AppConfig {
        variant: if cli.cpu { Variant::Cpu } else { Variant::Gpu },
        params,
        shader_dir: cli.shader_dir,
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
