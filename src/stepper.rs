// ============================================================================
// stepper.rs — Dot Matrix
// Simulation stepper: encodes one physics pass per tick, reading one
// generation and capturing the next.
// ============================================================================

use wgpu::util::DeviceExt;

use crate::physics::PhysicsUniforms;
use crate::pipeline::{
    Programs, PHYSICS_CAPTURE_GROUP, PHYSICS_PARAMS_GROUP, PHYSICS_READ_GROUP, WORKGROUP_SIZE,
};
use crate::slots::GenerationSlot;

pub struct Stepper {
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
}

impl Stepper {
    pub fn new(device: &wgpu::Device, programs: &Programs) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("physics_params"),
            contents: bytemuck::bytes_of(&PhysicsUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("physics_params_bg"),
            layout: &programs.layouts.physics_params,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });
        Self {
            params_buffer,
            params_bind_group,
        }
    }

    /// Stage this tick's uniforms; they take effect at the next submission.
    pub fn upload(&self, queue: &wgpu::Queue, uniforms: &PhysicsUniforms) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Record the physics pass for `slot`. One invocation per particle; a
    /// compute pass never rasterizes, so nothing reaches the surface.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        programs: &Programs,
        slot: &GenerationSlot,
        particle_count: u32,
    ) {
        if particle_count == 0 {
            return;
        }
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("physics_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&programs.physics);
        pass.set_bind_group(PHYSICS_PARAMS_GROUP, &self.params_bind_group, &[]);
        pass.set_bind_group(PHYSICS_READ_GROUP, &slot.read_bindings, &[]);
        pass.set_bind_group(PHYSICS_CAPTURE_GROUP, &slot.capture_targets, &[]);
        pass.dispatch_workgroups(particle_count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }
}
