// ============================================================================
// driver.rs — Dot Matrix
// Frame driver state: pointer, generation parity and the tick schedule.
// Owned by the event-loop handler and passed by reference to each tick.
// ============================================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::world::GENERATIONS;

/// Pointer position meaning "no repulsion"; farther than any repel radius
/// from every on-surface particle.
pub const POINTER_SENTINEL: [f32; 2] = [-200.0, -200.0];

/// Pointer coordinates in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            x: POINTER_SENTINEL[0],
            y: POINTER_SENTINEL[1],
        }
    }
}

impl PointerState {
    pub fn xy(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Uninitialized,
    Running,
}

/// Shared stop flag for the tick loop.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Inputs for one stepper + renderer cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Generation the physics pass reads, and the slot index used.
    pub read: usize,
    /// Generation the physics pass writes and the draw pass then displays.
    pub write: usize,
    /// Seconds since the driver started.
    pub time: f32,
    pub mouse: [f32; 2],
}

pub struct FrameDriver {
    state: DriverState,
    pointer: PointerState,
    frame: u64,
    started: Instant,
    cancel: CancelToken,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            state: DriverState::Uninitialized,
            pointer: PointerState::default(),
            frame: 0,
            started: Instant::now(),
            cancel: CancelToken::default(),
        }
    }

    /// Enter `Running`. The wave clock starts here.
    pub fn start(&mut self) {
        self.state = DriverState::Running;
        self.started = Instant::now();
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Plan the next tick, or `None` if not running or cancelled.
    pub fn begin_tick(&self, now: Instant) -> Option<Tick> {
        self.tick_at(now.saturating_duration_since(self.started).as_secs_f32())
    }

    /// Plan the next tick at an explicit clock value in seconds.
    pub fn tick_at(&self, time: f32) -> Option<Tick> {
        if self.state != DriverState::Running || self.cancel.is_cancelled() {
            return None;
        }
        let parity = (self.frame % GENERATIONS as u64) as usize;
        Some(Tick {
            read: parity,
            write: (parity + 1) % GENERATIONS,
            time,
            mouse: self.pointer.xy(),
        })
    }

    pub fn finish_tick(&mut self) {
        self.frame += 1;
    }

    /// Restart generation parity after the buffers were refilled.
    pub fn reset_generations(&mut self) {
        self.frame = 0;
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        self.pointer.x = x;
        self.pointer.y = y;
    }

    pub fn pointer_left(&mut self) {
        self.pointer = PointerState::default();
    }
}
