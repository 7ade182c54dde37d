// src/lib.rs
//! pulse-sphere
//!
//! A wireframe sphere displaced by animated periodic Perlin noise, orbitable
//! with the mouse, rendered with wgpu into a winit window.
//!
//! [`SceneSession`] holds the scene state and drives a [`FrameRenderer`];
//! [`PulseApp`] hosts it in a window.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod performance;
pub mod session;
pub mod wgpu_utils;
pub mod xr;

// Re-export main types for convenience
pub use app::PulseApp;
pub use config::SessionConfig;
pub use error::{SceneError, SceneResult};
pub use session::{FrameRenderer, SceneSession};
