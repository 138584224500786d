// ============================================================================
// headless.rs — Dot Matrix
// Headless runner: ticks the GPU simulation against a virtual viewport
// without a window, then reads back and summarizes the last generation.
// ============================================================================

use std::time::{Duration, Instant};

use crate::config::SimulationParams;
use crate::driver::{FrameDriver, POINTER_SENTINEL};
use crate::error::Result;
use crate::gpu;
use crate::pipeline::Programs;
use crate::shaders::ShaderSources;
use crate::simulation::Simulation;
use crate::world::GenerationSnapshot;

/// Format the draw program links against; no pass renders with it here.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[derive(Clone, Debug)]
pub struct HeadlessConfig {
    pub frames: u32,
    pub width: u32,
    pub height: u32,
    /// Fixed pointer for the whole run.
    pub mouse: [f32; 2],
    /// Simulated seconds per tick.
    pub tick_seconds: f32,
    pub progress_interval: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            width: 1280,
            height: 720,
            mouse: POINTER_SENTINEL,
            tick_seconds: 1.0 / 60.0,
            progress_interval: 300,
        }
    }
}

/// Summary of the generation written by the last tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessReport {
    pub particle_count: u32,
    pub frames: u32,
    pub mean_displacement: f32,
    pub max_displacement: f32,
    pub max_speed: f32,
    pub non_finite: usize,
}

impl HeadlessReport {
    fn from_snapshot(frames: u32, base: &[[f32; 2]], snap: &GenerationSnapshot) -> Self {
        let mut report = Self {
            particle_count: snap.positions.len() as u32,
            frames,
            ..Default::default()
        };
        let mut sum = 0.0f64;
        for ((p, v), b) in snap.positions.iter().zip(&snap.velocities).zip(base) {
            if !(p[0].is_finite() && p[1].is_finite() && v[0].is_finite() && v[1].is_finite()) {
                report.non_finite += 1;
                continue;
            }
            let displacement = ((p[0] - b[0]).powi(2) + (p[1] - b[1]).powi(2)).sqrt();
            sum += displacement as f64;
            report.max_displacement = report.max_displacement.max(displacement);
            report.max_speed = report.max_speed.max((v[0] * v[0] + v[1] * v[1]).sqrt());
        }
        let finite = snap.positions.len() - report.non_finite;
        if finite > 0 {
            report.mean_displacement = (sum / finite as f64) as f32;
        }
        report
    }
}

pub fn run_headless(
    config: &HeadlessConfig,
    params: SimulationParams,
    sources: &ShaderSources,
) -> Result<HeadlessReport> {
    let instance = gpu::create_instance();
    let (_adapter, device, queue) = pollster::block_on(gpu::request_device(&instance, None))?;
    let programs = Programs::new(&device, sources, OFFSCREEN_FORMAT)?;
    let sim = Simulation::new(&device, &queue, &programs, params, config.width, config.height);

    // Home positions equal generation 0 before the first tick.
    let base = sim.readback(&device, &queue, 0)?.positions;

    log::info!(
        "Headless run started: {} frames, {} particles on {}x{}",
        config.frames,
        sim.particle_count(),
        config.width,
        config.height
    );

    let mut driver = FrameDriver::new();
    driver.start();
    driver.pointer_moved(config.mouse[0], config.mouse[1]);

    let started = Instant::now();
    let mut last_report = Instant::now();
    let mut last_written = 0;

    for frame in 0..config.frames {
        let Some(tick) = driver.tick_at(frame as f32 * config.tick_seconds) else {
            break;
        };
        sim.step(&device, &queue, &programs, &tick);
        last_written = tick.write;
        driver.finish_tick();

        if config.progress_interval > 0 && (frame + 1) % config.progress_interval == 0 {
            device.poll(wgpu::Maintain::Wait);
            let window = last_report.elapsed().max(Duration::from_micros(1));
            log::info!(
                "Headless progress: {}/{} | {:.0} ticks/s",
                frame + 1,
                config.frames,
                config.progress_interval as f64 / window.as_secs_f64(),
            );
            last_report = Instant::now();
        }
    }

    let snapshot = sim.readback(&device, &queue, last_written)?;
    let report = HeadlessReport::from_snapshot(driver.frame() as u32, &base, &snapshot);

    log::info!(
        "Headless run finished in {:.2}s: {} particles, mean displacement {:.3}, max {:.3}, max speed {:.3}, non-finite {}",
        started.elapsed().as_secs_f64(),
        report.particle_count,
        report.mean_displacement,
        report.max_displacement,
        report.max_speed,
        report.non_finite,
    );

    Ok(report)
}
