// ============================================================================
// slots.rs — Dot Matrix
// Generation slots: each pairs the bindings that read one generation with
// the capture targets that write the other.
// ============================================================================

use crate::pipeline::{bg_buffer, BindingLayouts};
use crate::world::{BufferPool, GENERATIONS};

/// Which generation a slot reads and which it writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotWiring {
    pub read: usize,
    pub write: usize,
}

/// Slot `i` reads generation `i` and captures into the other one.
pub const WIRING: [SlotWiring; GENERATIONS] = [
    SlotWiring { read: 0, write: 1 },
    SlotWiring { read: 1, write: 0 },
];

pub struct GenerationSlot {
    pub wiring: SlotWiring,
    /// `base_position`, `position`, `velocity` of the read generation.
    pub read_bindings: wgpu::BindGroup,
    /// `new_position`, `new_velocity` of the write generation.
    pub capture_targets: wgpu::BindGroup,
}

/// Both slots, indexed by frame parity. Holds non-owning bindings into the
/// pool; rebuild whenever the pool recreates its buffers.
pub struct GenerationSlots {
    slots: [GenerationSlot; GENERATIONS],
}

impl GenerationSlots {
    pub fn new(device: &wgpu::Device, layouts: &BindingLayouts, pool: &BufferPool) -> Self {
        Self {
            slots: WIRING.map(|wiring| build_slot(device, layouts, pool, wiring)),
        }
    }

    pub fn get(&self, index: usize) -> &GenerationSlot {
        &self.slots[index]
    }
}

fn build_slot(
    device: &wgpu::Device,
    layouts: &BindingLayouts,
    pool: &BufferPool,
    wiring: SlotWiring,
) -> GenerationSlot {
    debug_assert_ne!(wiring.read, wiring.write, "slot would overwrite its own input");

    let read_bindings = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("physics_read_{}", wiring.read)),
        layout: &layouts.physics_read,
        entries: &[
            bg_buffer(0, &pool.base_positions),
            bg_buffer(1, &pool.positions[wiring.read]),
            bg_buffer(2, &pool.velocities[wiring.read]),
        ],
    });

    let capture_targets = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("physics_capture_{}", wiring.write)),
        layout: &layouts.physics_capture,
        entries: &[
            bg_buffer(0, &pool.positions[wiring.write]),
            bg_buffer(1, &pool.velocities[wiring.write]),
        ],
    });

    GenerationSlot {
        wiring,
        read_bindings,
        capture_targets,
    }
}

/// Vertex source for drawing one generation: its position buffer alone.
pub fn draw_binding(pool: &BufferPool, generation: usize) -> wgpu::BufferSlice<'_> {
    pool.positions[generation].slice(..)
}
