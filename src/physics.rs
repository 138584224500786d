// ============================================================================
// physics.rs — Dot Matrix
// Uniform blocks shared with the WGSL programs, plus the host-side reference
// step used by the CPU variant. Both must agree with shaders/physics.wgsl.
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::config::SimulationParams;

/// The wave clock advances in nominal 60 Hz ticks, so device time in seconds
/// and the CPU variant's frame counter drive the same motion.
pub const WAVE_TICKS_PER_SECOND: f32 = 60.0;

/// Cross-axis phase coupling of the home-position wave.
pub const WAVE_PHASE_SCALE: f32 = 0.35;

// ======================== Uniform Structs ========================

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PhysicsUniforms {
    pub mouse: [f32; 2],
    /// Seconds since the driver started.
    pub time: f32,
    pub particle_count: u32,
    pub repel_radius: f32,
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
    pub spring_factor: f32,
    pub damping: f32,
    pub repel_strength: f32,
    pub _pad: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<PhysicsUniforms>() == 48);

impl PhysicsUniforms {
    pub fn new(params: &SimulationParams, time: f32, mouse: [f32; 2], particle_count: u32) -> Self {
        Self {
            mouse,
            time,
            particle_count,
            repel_radius: params.repel_radius,
            wave_amplitude: params.wave_amplitude,
            wave_frequency: params.wave_frequency,
            spring_factor: params.spring_factor,
            damping: params.damping,
            repel_strength: params.repel_strength,
            _pad: [0.0; 2],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub color: [f32; 4],
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub _pad: f32,
}

const _: () = assert!(std::mem::size_of::<DrawUniforms>() == 32);

impl DrawUniforms {
    pub fn new(params: &SimulationParams, width: u32, height: u32) -> Self {
        Self {
            color: params.color_rgba(),
            resolution: [width as f32, height as f32],
            point_size: params.point_size,
            _pad: 0.0,
        }
    }
}

// ======================== Reference Step ========================

/// Wave-displaced home position. X is phased by the home Y coordinate and
/// Y by the home X coordinate, which gives the diagonal wave.
pub fn wave_home(base: [f32; 2], clock: f32, params: &SimulationParams) -> [f32; 2] {
    let phase = clock * params.wave_frequency;
    [
        base[0] + (phase + base[1] * WAVE_PHASE_SCALE).sin() * params.wave_amplitude,
        base[1] + (phase + base[0] * WAVE_PHASE_SCALE).sin() * params.wave_amplitude,
    ]
}

/// Pointer repulsion on a particle at `position`. Zero outside the radius
/// and when the pointer sits exactly on the particle.
pub fn repel_force(position: [f32; 2], mouse: [f32; 2], params: &SimulationParams) -> [f32; 2] {
    let dx = position[0] - mouse[0];
    let dy = position[1] - mouse[1];
    let dist = (dx * dx + dy * dy).sqrt();
    if dist >= params.repel_radius || dist <= 0.0 {
        return [0.0, 0.0];
    }
    let force = (params.repel_radius - dist) / params.repel_radius * params.repel_strength;
    [dx / dist * force, dy / dist * force]
}

/// Advance one particle by one tick: spring toward the wave home, add
/// repulsion, damp, then integrate.
pub fn step_particle(
    position: [f32; 2],
    velocity: [f32; 2],
    base: [f32; 2],
    clock: f32,
    mouse: [f32; 2],
    params: &SimulationParams,
) -> ([f32; 2], [f32; 2]) {
    let home = wave_home(base, clock, params);
    let repel = repel_force(position, mouse, params);

    let mut v = velocity;
    for axis in 0..2 {
        let spring = (home[axis] - position[axis]) * params.spring_factor;
        v[axis] = (v[axis] + spring + repel[axis]) * params.damping;
    }
    ([position[0] + v[0], position[1] + v[1]], v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::POINTER_SENTINEL;

    fn still_params() -> SimulationParams {
        SimulationParams {
            wave_amplitude: 0.0,
            ..Default::default()
        }
    }

    fn magnitude(v: [f32; 2]) -> f32 {
        (v[0] * v[0] + v[1] * v[1]).sqrt()
    }

    #[test]
    fn wave_is_cross_coupled() {
        let params = SimulationParams::default();
        let base = [10.0, 200.0];
        let home = wave_home(base, 0.0, &params);
        let expected_x = 10.0 + (200.0f32 * 0.35).sin() * 7.5;
        let expected_y = 200.0 + (10.0f32 * 0.35).sin() * 7.5;
        assert!((home[0] - expected_x).abs() < 1e-4);
        assert!((home[1] - expected_y).abs() < 1e-4);
    }

    #[test]
    fn repulsion_magnitude_scales_linearly_inside_radius() {
        let params = SimulationParams::default();
        let mouse = [500.0, 500.0];
        for d in [1.0f32, 37.5, 75.0, 149.0] {
            let force = repel_force([500.0 + d, 500.0], mouse, &params);
            let expected = (150.0 - d) / 150.0 * 3.0;
            assert!((magnitude(force) - expected).abs() < 1e-5);
            assert!(force[0] > 0.0, "force points away from the pointer");
            assert_eq!(force[1], 0.0);
        }
    }

    #[test]
    fn repulsion_vanishes_at_radius_and_is_finite_at_pointer() {
        let params = SimulationParams::default();
        assert_eq!(repel_force([150.0, 0.0], [0.0, 0.0], &params), [0.0, 0.0]);
        assert_eq!(repel_force([0.0, 0.0], [0.0, 0.0], &params), [0.0, 0.0]);

        let (p, v) = step_particle([3.0, 4.0], [0.0, 0.0], [3.0, 4.0], 0.0, [3.0, 4.0], &params);
        assert!(p.iter().chain(v.iter()).all(|c| c.is_finite()));
    }

    #[test]
    fn sentinel_pointer_exerts_no_force_on_surface() {
        let params = SimulationParams::default();
        assert_eq!(repel_force([0.0, 0.0], POINTER_SENTINEL, &params), [0.0, 0.0]);
        assert_eq!(repel_force([5.0, 5.0], POINTER_SENTINEL, &params), [0.0, 0.0]);
    }

    #[test]
    fn damped_spring_settles_on_home() {
        let params = still_params();
        let base = [120.0, 80.0];
        let mut position = [150.0, 40.0];
        let mut velocity = [4.0, -2.0];
        for tick in 0..200 {
            (position, velocity) =
                step_particle(position, velocity, base, tick as f32, POINTER_SENTINEL, &params);
        }
        assert!(magnitude(velocity) < 1e-4);
        assert!((position[0] - base[0]).abs() < 1e-3);
        assert!((position[1] - base[1]).abs() < 1e-3);
    }

    #[test]
    fn forces_apply_before_damping_and_integration() {
        let params = still_params();
        let (p, v) = step_particle([10.0, 0.0], [2.0, 0.0], [0.0, 0.0], 0.0, POINTER_SENTINEL, &params);
        // (2 + (0 - 10) * 0.1) * 0.5 = 0.5
        assert!((v[0] - 0.5).abs() < 1e-6);
        assert!((p[0] - 10.5).abs() < 1e-6);
    }

    #[test]
    fn uniforms_carry_params() {
        let params = SimulationParams::default();
        let u = PhysicsUniforms::new(&params, 1.5, [3.0, 4.0], 42);
        assert_eq!(u.mouse, [3.0, 4.0]);
        assert_eq!(u.time, 1.5);
        assert_eq!(u.particle_count, 42);
        assert_eq!(u.damping, 0.5);

        let d = DrawUniforms::new(&params, 800, 600);
        assert_eq!(d.resolution, [800.0, 600.0]);
        assert_eq!(d.point_size, 1.0);
    }
}
