// ============================================================================
// renderer.rs — Dot Matrix
// Draw pass: clears the surface and draws one quad per particle from a
// generation's position buffer.
// ============================================================================

use wgpu::util::DeviceExt;

use crate::physics::DrawUniforms;
use crate::pipeline::{Programs, DRAW_PARAMS_GROUP, DRAW_QUAD_VERTICES};

pub struct Renderer {
    params_buffer: wgpu::Buffer,
    params_bind_group: wgpu::BindGroup,
}

impl Renderer {
    pub fn new(device: &wgpu::Device, programs: &Programs) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("draw_params"),
            contents: bytemuck::bytes_of(&DrawUniforms::default()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_params_bg"),
            layout: &programs.layouts.draw_params,
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

    pub fn upload(&self, queue: &wgpu::Queue, uniforms: &DrawUniforms) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Clear to transparent black, then draw `particle_count` points in
    /// buffer order. No depth test: later particles overdraw earlier ones.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        programs: &Programs,
        positions: wgpu::BufferSlice<'_>,
        particle_count: u32,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("draw_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if particle_count == 0 {
            return;
        }
        pass.set_pipeline(&programs.draw);
        pass.set_bind_group(DRAW_PARAMS_GROUP, &self.params_bind_group, &[]);
        pass.set_vertex_buffer(0, positions);
        pass.draw(0..DRAW_QUAD_VERTICES, 0..particle_count);
    }
}
