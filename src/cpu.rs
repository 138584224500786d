// ============================================================================
// cpu.rs — Dot Matrix
// CPU variant: the same particle physics stepped on the host, with positions
// re-uploaded to a single vertex buffer every frame.
// ============================================================================

use crate::config::SimulationParams;
use crate::field::ParticleField;
use crate::physics::step_particle;
use crate::pipeline::VEC2_STRIDE;

pub struct CpuField {
    params: SimulationParams,
    field: ParticleField,
    /// Wave clock, in ticks.
    frame: u64,
    vertex_buffer: wgpu::Buffer,
    capacity: u32,
}

impl CpuField {
    pub fn new(device: &wgpu::Device, params: SimulationParams, width: u32, height: u32) -> Self {
        let field = ParticleField::for_viewport(width, height, &params);
        let capacity = field.count().max(1);
        Self {
            params,
            field,
            frame: 0,
            vertex_buffer: create_vertex_buffer(device, capacity),
            capacity,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.field = ParticleField::for_viewport(width, height, &self.params);
        if self.field.count() > self.capacity {
            self.vertex_buffer.destroy();
            self.capacity = self.field.count();
            self.vertex_buffer = create_vertex_buffer(device, self.capacity);
        }
    }

    /// Advance every particle one tick and stage the new positions.
    pub fn update(&mut self, queue: &wgpu::Queue, mouse: [f32; 2]) {
        self.frame += 1;
        advance_field(&mut self.field, self.frame as f32, mouse, &self.params);
        if !self.field.is_empty() {
            queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.field.flat_positions()),
            );
        }
    }

    pub fn display(&self) -> wgpu::BufferSlice<'_> {
        self.vertex_buffer.slice(..)
    }

    pub fn particle_count(&self) -> u32 {
        self.field.count()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }
}

/// One host-side tick over the whole field, in grid order.
pub fn advance_field(
    field: &mut ParticleField,
    clock: f32,
    mouse: [f32; 2],
    params: &SimulationParams,
) {
    for ((position, velocity), base) in field
        .positions
        .iter_mut()
        .zip(field.velocities.iter_mut())
        .zip(field.base_positions.iter())
    {
        (*position, *velocity) = step_particle(*position, *velocity, *base, clock, mouse, params);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("cpu_positions"),
        size: capacity as u64 * VEC2_STRIDE,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
