// ============================================================================
// app.rs — Dot Matrix
// Application state and winit event-loop handler. Drives one physics pass
// and one draw pass per display refresh.
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes},
};

use crate::config::{AppConfig, Variant};
use crate::cpu::CpuField;
use crate::driver::FrameDriver;
use crate::error::Result;
use crate::gpu;
use crate::physics::DrawUniforms;
use crate::pipeline::Programs;
use crate::renderer::Renderer;
use crate::shaders::{EmbeddedShaders, ShaderDirectory, ShaderSources};
use crate::simulation::Simulation;

// ======================== Application ========================

pub struct App {
    config: AppConfig,
    state: Option<AppState>,
    driver: FrameDriver,
}

/// Where particle positions come from each tick.
enum Backend {
    Gpu(Simulation),
    Cpu(CpuField),
}

struct AppState {
    // GPU
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,

    // Pipeline
    programs: Programs,
    backend: Backend,
    renderer: Renderer,

    // Window
    window: Arc<Window>,
    /// Current surface size in pixels; may be zero while minimized.
    width: u32,
    height: u32,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: None,
            driver: FrameDriver::new(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match init_state(event_loop, &self.config) {
            Ok(state) => {
                log::info!(
                    "Dot Matrix initialized: {:?} variant, {}x{}, {} particles",
                    self.config.variant,
                    state.width,
                    state.height,
                    state.particle_count()
                );
                state.window.request_redraw();
                self.state = Some(state);
                self.driver.start();
            }
            Err(err) => {
                log::error!("Startup failed, nothing will render: {}", err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.is_cancelled() {
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.driver.cancel_token().cancel();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed()
                    && event.logical_key == Key::Named(NamedKey::Escape)
                {
                    self.driver.cancel_token().cancel();
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.driver.pointer_moved(position.x as f32, position.y as f32);
            }

            WindowEvent::CursorLeft { .. } => {
                self.driver.pointer_left();
            }

            WindowEvent::Resized(new_size) => {
                state.resize(new_size.width, new_size.height);
                self.driver.reset_generations();
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                redraw(state, &mut self.driver);
            }

            _ => {}
        }
    }
}

// ======================== Initialization ========================

fn init_state(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<AppState> {
    let sources = match &config.shader_dir {
        Some(dir) => ShaderSources::fetch(&ShaderDirectory(dir.clone()))?,
        None => ShaderSources::fetch(&EmbeddedShaders)?,
    };

    let window_attrs = WindowAttributes::default()
        .with_title("Dot Matrix")
        .with_transparent(true)
        .with_inner_size(winit::dpi::LogicalSize::new(1280u32, 800u32));
    let window = Arc::new(event_loop.create_window(window_attrs)?);

    let instance = gpu::create_instance();
    let surface = instance.create_surface(window.clone())?;
    let (adapter, device, queue) = pollster::block_on(gpu::request_device(&instance, Some(&surface)))?;

    let surface_config = gpu::surface_config(&adapter, &surface, &window);
    let size = window.inner_size();
    if size.width > 0 && size.height > 0 {
        surface.configure(&device, &surface_config);
    }

    let programs = Programs::new(&device, &sources, surface_config.format)?;
    let params = config.params.clone();
    let backend = match config.variant {
        Variant::Gpu => Backend::Gpu(Simulation::new(
            &device,
            &queue,
            &programs,
            params,
            size.width,
            size.height,
        )),
        Variant::Cpu => Backend::Cpu(CpuField::new(&device, params, size.width, size.height)),
    };
    let renderer = Renderer::new(&device, &programs);

    Ok(AppState {
        device,
        queue,
        surface,
        surface_config,
        programs,
        backend,
        renderer,
        window,
        width: size.width,
        height: size.height,
    })
}

impl AppState {
    fn particle_count(&self) -> u32 {
        match &self.backend {
            Backend::Gpu(sim) => sim.particle_count(),
            Backend::Cpu(cpu) => cpu.particle_count(),
        }
    }

    /// Reconfigure the surface and refill every particle buffer for the new
    /// size. Completes before the next tick is encoded.
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if width > 0 && height > 0 {
            self.surface_config.width = width;
            self.surface_config.height = height;
            self.surface.configure(&self.device, &self.surface_config);
        }

        match &mut self.backend {
            Backend::Gpu(sim) => {
                let outcome = sim.resize(&self.device, &self.queue, &self.programs, width, height);
                log::info!(
                    "Resized to {}x{}: {} particles ({:?})",
                    width,
                    height,
                    sim.particle_count(),
                    outcome
                );
            }
            Backend::Cpu(cpu) => {
                cpu.resize(&self.device, width, height);
                log::info!("Resized to {}x{}: {} particles", width, height, cpu.particle_count());
            }
        }
    }
}

// ======================== Frame Rendering ========================

fn redraw(state: &mut AppState, driver: &mut FrameDriver) {
    let Some(tick) = driver.begin_tick(Instant::now()) else {
        return;
    };
    // Minimized: nothing to draw into and no particles to move.
    if state.width == 0 || state.height == 0 {
        return;
    }

    let output = match state.surface.get_current_texture() {
        Ok(t) => t,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            log::warn!("Surface lost or outdated; reconfiguring");
            state.surface.configure(&state.device, &state.surface_config);
            state.window.request_redraw();
            return;
        }
        Err(e) => {
            log::error!("Surface error: {:?}", e);
            state.window.request_redraw();
            return;
        }
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    // ---- Physics pass (GPU) or host update (CPU) ----
    let params = match &mut state.backend {
        Backend::Gpu(sim) => {
            sim.step(&state.device, &state.queue, &state.programs, &tick);
            sim.params()
        }
        Backend::Cpu(cpu) => {
            cpu.update(&state.queue, tick.mouse);
            cpu.params()
        }
    };
    state
        .renderer
        .upload(&state.queue, &DrawUniforms::new(params, state.width, state.height));

    // ---- Draw pass: display the generation just written ----
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("draw_encoder"),
        });
    match &state.backend {
        Backend::Gpu(sim) => state.renderer.encode(
            &mut encoder,
            &view,
            &state.programs,
            sim.display(tick.write),
            sim.particle_count(),
        ),
        Backend::Cpu(cpu) => state.renderer.encode(
            &mut encoder,
            &view,
            &state.programs,
            cpu.display(),
            cpu.particle_count(),
        ),
    }
    state.queue.submit(std::iter::once(encoder.finish()));

    state.window.pre_present_notify();
    output.present();

    driver.finish_tick();
    state.window.request_redraw();
}
