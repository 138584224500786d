// ============================================================================
// pipeline.rs — Dot Matrix
// Program manager: compiles the physics and draw programs, links them into
// pipelines, and owns the bind-group layouts every slot is built against.
// ============================================================================

use crate::error::{Error, Result};
use crate::shaders::ShaderSources;

// ======================== Binding Slots ========================

pub const PHYSICS_PARAMS_GROUP: u32 = 0;
pub const PHYSICS_READ_GROUP: u32 = 1;
pub const PHYSICS_CAPTURE_GROUP: u32 = 2;

/// Read-side inputs of the physics program, in binding order.
pub const READ_INPUTS: [&str; 3] = ["base_position", "position", "velocity"];
/// Captured outputs of the physics program, in binding order.
pub const CAPTURE_OUTPUTS: [&str; 2] = ["new_position", "new_velocity"];

/// Storage buffers bound to the physics stage at once.
pub const PHYSICS_STORAGE_BUFFERS: u32 = (READ_INPUTS.len() + CAPTURE_OUTPUTS.len()) as u32;

pub const DRAW_PARAMS_GROUP: u32 = 0;
pub const DRAW_POSITION_LOCATION: u32 = 0;
/// Vertices per particle quad.
pub const DRAW_QUAD_VERTICES: u32 = 6;

pub const WORKGROUP_SIZE: u32 = 64;

/// Bytes per particle in every generation buffer: two tightly packed f32.
pub const VEC2_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![DRAW_POSITION_LOCATION => Float32x2];

// ======================== Programs ========================

/// Bind-group layouts shared by the programs and the generation slots.
pub struct BindingLayouts {
    pub physics_params: wgpu::BindGroupLayout,
    pub physics_read: wgpu::BindGroupLayout,
    pub physics_capture: wgpu::BindGroupLayout,
    pub draw_params: wgpu::BindGroupLayout,
}

pub struct Programs {
    pub physics: wgpu::ComputePipeline,
    pub draw: wgpu::RenderPipeline,
    pub layouts: BindingLayouts,
}

impl Programs {
    /// Compile and link both programs. A failure in either is fatal: no
    /// partial pipeline is returned.
    pub fn new(
        device: &wgpu::Device,
        sources: &ShaderSources,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        let layouts = BindingLayouts::new(device);

        let physics_shader = compile(device, "physics", &sources.physics)?;
        let draw_shader = compile(device, "draw", &sources.draw)?;

        let physics = link(device, "physics", || {
            create_physics_pipeline(device, &layouts, &physics_shader)
        })?;
        let draw = link(device, "draw", || {
            create_draw_pipeline(device, &layouts, &draw_shader, surface_format)
        })?;

        log::debug!(
            "Programs linked: physics reads {:?}, captures {:?}",
            READ_INPUTS,
            CAPTURE_OUTPUTS
        );

        Ok(Self {
            physics,
            draw,
            layouts,
        })
    }
}

impl BindingLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let physics_params = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("physics_params_bgl"),
            entries: &[bgl_uniform(0, wgpu::ShaderStages::COMPUTE)],
        });

        let read_entries: Vec<_> = (0..READ_INPUTS.len() as u32).map(bgl_storage_ro).collect();
        let physics_read = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("physics_read_bgl"),
            entries: &read_entries,
        });

        let capture_entries: Vec<_> = (0..CAPTURE_OUTPUTS.len() as u32).map(bgl_storage_rw).collect();
        let physics_capture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("physics_capture_bgl"),
            entries: &capture_entries,
        });

        let draw_params = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_params_bgl"),
            entries: &[bgl_uniform(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });

        Self {
            physics_params,
            physics_read,
            physics_capture,
            draw_params,
        }
    }
}

// ======================== Pipeline Creation ========================

fn create_physics_pipeline(
    device: &wgpu::Device,
    layouts: &BindingLayouts,
    module: &wgpu::ShaderModule,
) -> wgpu::ComputePipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("physics_pipeline_layout"),
        bind_group_layouts: &[
            &layouts.physics_params,
            &layouts.physics_read,
            &layouts.physics_capture,
        ],
        push_constant_ranges: &[],
    });
    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("physics_pipeline"),
        layout: Some(&layout),
        module,
        entry_point: Some("cs_main"),
        compilation_options: Default::default(),
        cache: None,
    })
}

fn create_draw_pipeline(
    device: &wgpu::Device,
    layouts: &BindingLayouts,
    module: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("draw_pipeline_layout"),
        bind_group_layouts: &[&layouts.draw_params],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("draw_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[position_buffer_layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// One generation's positions, stepped once per particle quad.
pub fn position_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: VEC2_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &POSITION_ATTRIBUTES,
    }
}

// ======================== Compile & Link ========================

fn compile(device: &wgpu::Device, program: &'static str, source: &str) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(program),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            log::error!("Error compiling {} shader: {}", program, err);
            Err(Error::ShaderCompile {
                program,
                message: err.to_string(),
            })
        }
        None => Ok(module),
    }
}

fn link<T>(device: &wgpu::Device, program: &'static str, create: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = create();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => {
            log::error!("Error linking {} program: {}", program, err);
            Err(Error::ProgramLink {
                program,
                message: err.to_string(),
            })
        }
        None => Ok(pipeline),
    }
}

// ======================== Helpers ========================

fn bgl_uniform(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bgl_storage_ro(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bgl_storage_rw(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn bg_buffer(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}
