//! # Scene Module
//!
//! CPU-side description of what gets drawn: an optional axes helper and the
//! meshes, each with its geometry, [`ShaderMaterial`](crate::gfx::resources::material::ShaderMaterial)
//! and world position. The renderer uploads this once at startup and reads the
//! material uniforms every frame.

pub mod scene;
pub mod vertex;

// Re-export main types
pub use scene::{AxesHelper, Mesh, Scene};
pub use vertex::{LineVertex, Vertex3D};
