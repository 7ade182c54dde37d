//! # Graphics Module
//!
//! Everything between the session state and the GPU.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Perspective camera, orbit controls and
//!   the winit input adapter
//! - **Rendering Pipeline** ([`rendering`]) - Surface, pipelines and per-frame draw
//! - **Scene Management** ([`scene`]) - Axes helper and meshes with their materials
//! - **Resource Management** ([`resources`]) - Shader materials, textures and bindings
//! - **Geometry** ([`geometry`]) - Procedural sphere and axes
//! - **Noise / Shading** ([`noise`], [`shading`]) - CPU references of the
//!   displacement and fragment programs
//!
//! ## Usage
//!
//! ```no_run
//! use pulse_sphere::gfx::{scene::Scene, surface::Viewport};
//! use pulse_sphere::config::SessionConfig;
//!
//! let config = SessionConfig::default();
//! let viewport = Viewport::new(800, 600, 1.0);
//! let scene = Scene::displaced_sphere(&config, [viewport.width as f32, viewport.height as f32]);
//! assert!(scene.validate().is_ok());
//! ```

pub mod camera;
pub mod clock;
pub mod geometry;
pub mod noise;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shading;
pub mod surface;
pub mod ui;

// Re-export commonly used types
pub use camera::{OrbitControls, PerspectiveCamera};
pub use rendering::render_engine::RenderEngine;
