pub mod camera_controller;
pub mod camera_utils;
pub mod orbit_controls;
pub mod perspective_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{Camera, CameraUniform};
pub use orbit_controls::{OrbitControls, PointerInput};
pub use perspective_camera::PerspectiveCamera;
