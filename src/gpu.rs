// ============================================================================
// gpu.rs — Dot Matrix
// Adapter and device acquisition, with or without a presentation surface.
// ============================================================================

use winit::window::Window;

use crate::error::{Error, Result};
use crate::pipeline::PHYSICS_STORAGE_BUFFERS;

pub fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Request an adapter able to run compute passes, then its device.
pub async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(Error::NoAdapter)?;

    let info = adapter.get_info();
    log::info!("GPU: {} ({:?})", info.name, info.backend);

    let downlevel = adapter.get_downlevel_capabilities();
    if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
        return Err(Error::Unsupported(format!(
            "{} has no compute shader support",
            info.name
        )));
    }

    let required_limits = required_limits(&info.name, adapter.limits())?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("dot_matrix_device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: Default::default(),
            },
            None,
        )
        .await?;

    Ok((adapter, device, queue))
}

/// Lowest limits the physics and draw programs run under, raised to the
/// adapter's texture resolution. `Unsupported` when the adapter cannot bind
/// every generation buffer to the physics stage at once.
pub fn required_limits(adapter_name: &str, available: wgpu::Limits) -> Result<wgpu::Limits> {
    if available.max_storage_buffers_per_shader_stage < PHYSICS_STORAGE_BUFFERS {
        return Err(Error::Unsupported(format!(
            "{} binds {} storage buffers per stage, physics needs {}",
            adapter_name, available.max_storage_buffers_per_shader_stage, PHYSICS_STORAGE_BUFFERS
        )));
    }
    Ok(wgpu::Limits {
        max_storage_buffers_per_shader_stage: PHYSICS_STORAGE_BUFFERS,
        ..wgpu::Limits::downlevel_defaults()
    }
    .using_resolution(available))
}

/// Surface configuration for the window's current size. Prefers a linear
/// format so point colours are written unconverted, and `Fifo` so ticks are
/// paced by the display refresh.
pub fn surface_config(
    adapter: &wgpu::Adapter,
    surface: &wgpu::Surface<'_>,
    window: &Window,
) -> wgpu::SurfaceConfiguration {
    let size = window.inner_size();
    let caps = surface.get_capabilities(adapter);
    let format = caps
        .formats
        .iter()
        .find(|f| !f.is_srgb())
        .copied()
        .unwrap_or(caps.formats[0]);

    let alpha_mode = if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        caps.alpha_modes[0]
    };

    log::info!("Surface: {:?}, present mode Fifo, alpha {:?}", format, alpha_mode);

    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}
