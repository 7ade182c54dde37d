//! Error types for the scene session and its GPU backend

use thiserror::Error;

/// Errors surfaced by [`SceneSession`](crate::session::SceneSession) and the render backend
#[derive(Debug, Error)]
pub enum SceneError {
    /// The window could not be turned into a presentable surface
    #[error("failed to create render surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    /// No GPU adapter is compatible with the surface
    #[error("no compatible GPU adapter: {0}")]
    AdapterUnavailable(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to hand out a device
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// A shader material could not be prepared for rendering.
    ///
    /// Raised once at startup: missing uniforms, shader compilation or
    /// pipeline validation failures all land here.
    #[error("material '{material}' initialization failed: {reason}")]
    MaterialInit { material: String, reason: String },

    /// The platform cannot start an immersive AR session
    #[error("immersive AR session unavailable: {0}")]
    ImmersiveUnavailable(String),

    /// A single frame could not be produced
    #[error("frame skipped: {0}")]
    Frame(String),
}

impl SceneError {
    pub fn material_init(material: &str, reason: impl Into<String>) -> Self {
        Self::MaterialInit {
            material: material.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type SceneResult<T> = Result<T, SceneError>;
