// ============================================================================
// config.rs — Dot Matrix
// Simulation parameters and startup configuration.
// ============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Process-wide simulation constants. Built once at startup and never
/// mutated; any subset may be overridden from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Grid step between home positions, in surface pixels.
    pub spacing: f32,
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
    pub spring_factor: f32,
    pub damping: f32,
    pub repel_strength: f32,
    /// Pointer influence radius, in surface pixels.
    pub repel_radius: f32,
    pub point_size: f32,
    /// Packed `0xRRGGBBAA`.
    pub point_color: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            spacing: 35.0,
            wave_amplitude: 7.5,
            wave_frequency: 0.01,
            spring_factor: 0.1,
            damping: 0.5,
            repel_strength: 3.0,
            repel_radius: 150.0,
            point_size: 1.0,
            point_color: 0x6666_66ff,
        }
    }
}

impl SimulationParams {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a JSON override file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Point colour with each channel normalized to `[0, 1]`.
    pub fn color_rgba(&self) -> [f32; 4] {
        let c = self.point_color;
        [
            ((c >> 24) & 0xff) as f32 / 255.0,
            ((c >> 16) & 0xff) as f32 / 255.0,
            ((c >> 8) & 0xff) as f32 / 255.0,
            (c & 0xff) as f32 / 255.0,
        ]
    }
}

/// Which particle update runs on each tick. Chosen once at process start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    /// Physics runs on the device with ping-pong generations.
    #[default]
    Gpu,
    /// Physics runs on the host; positions are re-uploaded every frame.
    Cpu,
}

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub variant: Variant,
    pub params: SimulationParams,
    /// Read shaders from this directory instead of the embedded copies.
    pub shader_dir: Option<PathBuf>,
}
