// ============================================================================
// error.rs — Dot Matrix
// Crate-wide error type. Every failure here is fatal for the pipeline; the
// only recovery path at runtime is a resize-triggered reset.
// ============================================================================

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("GPU adapter is unsupported: {0}")]
    Unsupported(String),

    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create drawing surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop failure: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("{program} shader failed to compile: {message}")]
    ShaderCompile {
        program: &'static str,
        message: String,
    },

    #[error("{program} program failed to link: {message}")]
    ProgramLink {
        program: &'static str,
        message: String,
    },

    #[error("failed to create device resource `{resource}`: {message}")]
    DeviceResource {
        resource: &'static str,
        message: String,
    },

    #[error("buffer readback failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("failed to load shader {name:?}: {source}")]
    ShaderLoad {
        name: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter file: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
