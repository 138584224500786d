// ============================================================================
// field.rs — Dot Matrix
// Particle field initialization: jittered rectangular grid of home positions.
// ============================================================================

use rand::Rng;

use crate::config::SimulationParams;

/// Host-side particle state for one viewport size.
///
/// `positions`, `velocities` and `base_positions` are indexed 1:1; the grid
/// order (row-major, top row first) is also the draw order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticleField {
    pub width: f32,
    pub height: f32,
    pub positions: Vec<[f32; 2]>,
    pub velocities: Vec<[f32; 2]>,
    pub base_positions: Vec<[f32; 2]>,
}

impl ParticleField {
    /// Lay out one particle per `spacing`-sized cell over `[0,width) × [0,height)`.
    ///
    /// Each coordinate is `min(cell_origin + U(0, spacing/8), dimension)`.
    /// Home positions are the jittered points themselves. Cells start only
    /// while the origin is strictly inside the viewport, so an exact multiple
    /// of `spacing` gets no extra row or column on its far edge.
    /// Non-positive dimensions or spacing give an empty field.
    pub fn generate<R: Rng + ?Sized>(width: f32, height: f32, spacing: f32, rng: &mut R) -> Self {
        let rows = grid_steps(height, spacing);
        let cols = grid_steps(width, spacing);
        let count = rows * cols;

        let mut positions = Vec::with_capacity(count);
        for row in 0..rows {
            let y = row as f32 * spacing;
            for col in 0..cols {
                let x = col as f32 * spacing;
                let px = (x + rng.gen::<f32>() * spacing / 8.0).min(width);
                let py = (y + rng.gen::<f32>() * spacing / 8.0).min(height);
                positions.push([px, py]);
            }
        }

        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            velocities: vec![[0.0; 2]; positions.len()],
            base_positions: positions.clone(),
            positions,
        }
    }

    /// Fresh field for a surface of `width` × `height` pixels.
    pub fn for_viewport(width: u32, height: u32, params: &SimulationParams) -> Self {
        Self::generate(
            width as f32,
            height as f32,
            params.spacing,
            &mut rand::thread_rng(),
        )
    }

    pub fn count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions as the flat `x, y, x, y, ...` sequence uploaded to the device.
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn flat_velocities(&self) -> &[f32] {
        bytemuck::cast_slice(&self.velocities)
    }

    pub fn flat_base_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.base_positions)
    }
}

/// Number of origins `0, s, 2s, ...` strictly below `extent`.
pub fn grid_steps(extent: f32, spacing: f32) -> usize {
    if extent <= 0.0 || spacing <= 0.0 {
        return 0;
    }
    (0usize..)
        .take_while(|&i| (i as f32 * spacing) < extent)
        .count()
}
