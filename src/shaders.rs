// ============================================================================
// shaders.rs — Dot Matrix
// Shader text sources. Program text is opaque here; it is only fetched by
// name and handed to the device for compilation.
// ============================================================================

use std::path::PathBuf;

use crate::error::{Error, Result};

pub const PHYSICS_SHADER: &str = "physics.wgsl";
pub const DRAW_SHADER: &str = "draw.wgsl";

/// A fetch-like provider of shader text by file name.
pub trait ShaderSource {
    fn fetch(&self, name: &str) -> Result<String>;
}

/// Shader text compiled into the binary.
pub struct EmbeddedShaders;

impl ShaderSource for EmbeddedShaders {
    fn fetch(&self, name: &str) -> Result<String> {
        let text = match name {
            PHYSICS_SHADER => include_str!("shaders/physics.wgsl"),
            DRAW_SHADER => include_str!("shaders/draw.wgsl"),
            _ => {
                return Err(Error::ShaderLoad {
                    name: PathBuf::from(name),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no embedded shader with this name",
                    ),
                })
            }
        };
        Ok(text.to_owned())
    }
}

/// Shader text read from a directory at startup.
pub struct ShaderDirectory(pub PathBuf);

impl ShaderSource for ShaderDirectory {
    fn fetch(&self, name: &str) -> Result<String> {
        let path = self.0.join(name);
        std::fs::read_to_string(&path).map_err(|source| Error::ShaderLoad { name: path, source })
    }
}

/// Text of both programs, all fetched before the pipeline starts.
#[derive(Clone, Debug)]
pub struct ShaderSources {
    pub physics: String,
    pub draw: String,
}

impl ShaderSources {
    pub fn fetch(source: &dyn ShaderSource) -> Result<Self> {
        Ok(Self {
            physics: source.fetch(PHYSICS_SHADER)?,
            draw: source.fetch(DRAW_SHADER)?,
        })
    }
}
