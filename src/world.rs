// ============================================================================
// world.rs — Dot Matrix
// BufferPool: exclusive owner of the device-side particle storage. Two
// generations of position/velocity buffers plus the shared home positions.
// ============================================================================

use crate::error::{Error, Result};
use crate::field::ParticleField;
use crate::pipeline::VEC2_STRIDE;

/// Number of buffered generations.
pub const GENERATIONS: usize = 2;

/// What a reallocation did to the buffer handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reallocation {
    /// Same handles, new contents. Existing bindings stay valid.
    InPlace,
    /// Old buffers were released and replaced; every binding must be rebuilt.
    Recreated,
}

/// One generation read back to the host.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationSnapshot {
    pub positions: Vec<[f32; 2]>,
    pub velocities: Vec<[f32; 2]>,
}

pub struct BufferPool {
    /// Position buffers, one per generation. Also the draw pass's vertex source.
    pub positions: [wgpu::Buffer; GENERATIONS],
    pub velocities: [wgpu::Buffer; GENERATIONS],
    /// Home positions. Written only here, never by the physics pass.
    pub base_positions: wgpu::Buffer,
    particle_count: u32,
    capacity: u32,
}

impl BufferPool {
    /// Allocate storage for `field` and upload it into both generations.
    pub fn allocate(device: &wgpu::Device, queue: &wgpu::Queue, field: &ParticleField) -> Self {
        // Zero-sized storage bindings are invalid, so keep room for one particle.
        let capacity = field.count().max(1);
        let (positions, velocities, base_positions) = create_buffers(device, capacity);
        let mut pool = Self {
            positions,
            velocities,
            base_positions,
            particle_count: 0,
            capacity,
        };
        pool.write_field(queue, field);
        pool
    }

    /// Replace every buffer's contents with `field`.
    ///
    /// Fits in the current capacity: written in place under the same handles.
    /// Otherwise the old buffers are destroyed before new ones are created.
    /// Shrinking keeps the larger buffers; only the first `particle_count`
    /// entries of each are live, so every generation still holds exactly two
    /// floats per particle.
    /// All writes are staged on `queue`, so they land before the next
    /// submission and no tick observes a half-resized pool.
    pub fn reallocate(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: &ParticleField,
    ) -> Reallocation {
        let outcome = if field.count() <= self.capacity {
            Reallocation::InPlace
        } else {
            self.release();
            let capacity = field.count();
            let (positions, velocities, base_positions) = create_buffers(device, capacity);
            self.positions = positions;
            self.velocities = velocities;
            self.base_positions = base_positions;
            self.capacity = capacity;
            Reallocation::Recreated
        };
        self.write_field(queue, field);
        outcome
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    /// Particles that fit without recreating buffers.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    fn write_field(&mut self, queue: &wgpu::Queue, field: &ParticleField) {
        self.particle_count = field.count();
        if field.is_empty() {
            return;
        }
        let positions = bytemuck::cast_slice(field.flat_positions());
        let velocities = bytemuck::cast_slice(field.flat_velocities());
        for generation in 0..GENERATIONS {
            queue.write_buffer(&self.positions[generation], 0, positions);
            queue.write_buffer(&self.velocities[generation], 0, velocities);
        }
        queue.write_buffer(
            &self.base_positions,
            0,
            bytemuck::cast_slice(field.flat_base_positions()),
        );
    }

    fn release(&self) {
        for buffer in self.positions.iter().chain(self.velocities.iter()) {
            buffer.destroy();
        }
        self.base_positions.destroy();
    }

    /// Copy one generation back to the host. Blocks until the device is idle.
    pub fn readback(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        generation: usize,
    ) -> Result<GenerationSnapshot> {
        let n = self.particle_count as usize;
        if n == 0 {
            return Ok(GenerationSnapshot::default());
        }
        let size = n as u64 * VEC2_STRIDE;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("generation_readback"),
            size: size * 2,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.positions[generation], 0, &staging, 0, size);
        encoder.copy_buffer_to_buffer(&self.velocities[generation], 0, &staging, size, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);

        rx.recv().map_err(|_| Error::DeviceResource {
            resource: "generation_readback",
            message: String::from("map callback was dropped"),
        })??;

        let snapshot = {
            let data = slice.get_mapped_range();
            let pairs: &[[f32; 2]] = bytemuck::cast_slice(&data);
            GenerationSnapshot {
                positions: pairs[..n].to_vec(),
                velocities: pairs[n..].to_vec(),
            }
        };
        staging.unmap();
        Ok(snapshot)
    }
}

fn create_buffers(
    device: &wgpu::Device,
    capacity: u32,
) -> ([wgpu::Buffer; GENERATIONS], [wgpu::Buffer; GENERATIONS], wgpu::Buffer) {
    let size = capacity as u64 * VEC2_STRIDE;
    let storage = wgpu::BufferUsages::STORAGE
        | wgpu::BufferUsages::COPY_SRC
        | wgpu::BufferUsages::COPY_DST;

    let create = |label: &str, usage: wgpu::BufferUsages| -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    };

    let positions = [
        create("position_0", storage | wgpu::BufferUsages::VERTEX),
        create("position_1", storage | wgpu::BufferUsages::VERTEX),
    ];
    let velocities = [create("velocity_0", storage), create("velocity_1", storage)];
    let base_positions = create("base_position", storage);

    (positions, velocities, base_positions)
}
