// ============================================================================
// simulation.rs — Dot Matrix
// GPU-resident simulation: buffer pool, both generation slots and the
// stepper, kept consistent with each other across resizes.
// ============================================================================

use crate::config::SimulationParams;
use crate::driver::Tick;
use crate::error::Result;
use crate::field::ParticleField;
use crate::physics::PhysicsUniforms;
use crate::pipeline::Programs;
use crate::slots::{draw_binding, GenerationSlots};
use crate::stepper::Stepper;
use crate::world::{BufferPool, GenerationSnapshot, Reallocation};

pub struct Simulation {
    params: SimulationParams,
    pool: BufferPool,
    slots: GenerationSlots,
    stepper: Stepper,
}

impl Simulation {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        programs: &Programs,
        params: SimulationParams,
        width: u32,
        height: u32,
    ) -> Self {
        let field = ParticleField::for_viewport(width, height, &params);
        let pool = BufferPool::allocate(device, queue, &field);
        let slots = GenerationSlots::new(device, &programs.layouts, &pool);
        let stepper = Stepper::new(device, programs);
        Self {
            params,
            pool,
            slots,
            stepper,
        }
    }

    /// Regenerate the home grid and both generations for a new viewport.
    /// Slots are rebuilt before returning whenever the buffers were replaced.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        programs: &Programs,
        width: u32,
        height: u32,
    ) -> Reallocation {
        let field = ParticleField::for_viewport(width, height, &self.params);
        let outcome = self.pool.reallocate(device, queue, &field);
        if outcome == Reallocation::Recreated {
            self.slots = GenerationSlots::new(device, &programs.layouts, &self.pool);
            log::debug!("Generation slots rebuilt for capacity {}", self.pool.capacity());
        }
        outcome
    }

    /// Run the physics pass for `tick` as its own submission.
    pub fn step(&self, device: &wgpu::Device, queue: &wgpu::Queue, programs: &Programs, tick: &Tick) {
        let slot = self.slots.get(tick.read);
        debug_assert_eq!(slot.wiring.write, tick.write);

        let count = self.pool.particle_count();
        self.stepper.upload(
            queue,
            &PhysicsUniforms::new(&self.params, tick.time, tick.mouse, count),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("physics_encoder"),
        });
        self.stepper.encode(&mut encoder, programs, slot, count);
        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Position buffer of `generation`, for the draw pass.
    pub fn display(&self, generation: usize) -> wgpu::BufferSlice<'_> {
        draw_binding(&self.pool, generation)
    }

    pub fn particle_count(&self) -> u32 {
        self.pool.particle_count()
    }

    pub fn capacity(&self) -> u32 {
        self.pool.capacity()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn readback(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        generation: usize,
    ) -> Result<GenerationSnapshot> {
        self.pool.readback(device, queue, generation)
    }
}
