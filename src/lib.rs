// ============================================================================
// lib.rs — Dot Matrix
// GPU-resident particle field: every point springs toward a wave-displaced
// home position and is pushed away by the pointer.
// ============================================================================

pub mod app;
pub mod config;
pub mod cpu;
pub mod driver;
pub mod error;
pub mod field;
pub mod gpu;
pub mod headless;
pub mod physics;
pub mod pipeline;
pub mod renderer;
pub mod shaders;
pub mod simulation;
pub mod slots;
pub mod stepper;
pub mod world;

pub use error::{Error, Result};
