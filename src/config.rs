//! Session configuration
//!
//! Every tunable of the demo lives in [`SessionConfig`]. The defaults reproduce
//! the reference scene: a 75 degree camera at z = 5 looking at a radius 5
//! wireframe sphere placed at z = -10.

use cgmath::Vector3;

/// Camera projection and placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vector3::new(0.0, 0.0, 5.0),
        }
    }
}

/// Parameters of the displacement effect.
///
/// The vertex stage evaluates
/// `amplitude * pnoise(position + time / time_divisor, vec3(period)) / displacement_divisor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseConfig {
    pub time_divisor: f32,
    pub period: f32,
    pub amplitude: f32,
    pub displacement_divisor: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            time_divisor: 3.5,
            period: 10.0,
            amplitude: 3.0,
            displacement_divisor: 5.0,
        }
    }
}

/// The displaced sphere mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereConfig {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
    pub position: Vector3<f32>,
    pub wireframe: bool,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 5.0,
            width_segments: 96,
            height_segments: 96,
            position: Vector3::new(0.0, 0.0, -10.0),
            wireframe: true,
        }
    }
}

/// Orbit control tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Top level configuration for a [`SceneSession`](crate::session::SceneSession)
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub camera: CameraConfig,
    pub noise: NoiseConfig,
    pub sphere: SphereConfig,
    pub controls: ControlsConfig,
    /// Upper bound applied to the reported device pixel ratio
    pub max_pixel_ratio: f64,
    /// Clear to a transparent background instead of opaque black
    pub alpha: bool,
    /// Length of the axes helper; `None` hides it
    pub axes_size: Option<f32>,
    /// Initial logical window size
    pub window_size: (u32, u32),
    pub window_title: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            noise: NoiseConfig::default(),
            sphere: SphereConfig::default(),
            controls: ControlsConfig::default(),
            max_pixel_ratio: 2.0,
            alpha: true,
            axes_size: Some(3.0),
            window_size: (1280, 720),
            window_title: "pulse-sphere".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn with_camera(mut self, camera: CameraConfig) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_sphere(mut self, sphere: SphereConfig) -> Self {
        self.sphere = sphere;
        self
    }

    pub fn with_controls(mut self, controls: ControlsConfig) -> Self {
        self.controls = controls;
        self
    }

    /// Enables orbit damping with the given factor
    pub fn with_damping(mut self, factor: f32) -> Self {
        self.controls.enable_damping = true;
        self.controls.damping_factor = factor;
        self
    }

    pub fn with_max_pixel_ratio(mut self, ratio: f64) -> Self {
        self.max_pixel_ratio = ratio;
        self
    }

    pub fn with_axes(mut self, size: Option<f32>) -> Self {
        self.axes_size = size;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_scene() {
        let config = SessionConfig::default();
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.camera.far, 1000.0);
        assert_eq!(config.camera.position.z, 5.0);
        assert_eq!(config.sphere.width_segments, 96);
        assert_eq!(config.sphere.position.z, -10.0);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert!(!config.controls.enable_damping);
    }

    #[test]
    fn test_with_damping_enables_it() {
        let config = SessionConfig::default().with_damping(0.1);
        assert!(config.controls.enable_damping);
        assert_eq!(config.controls.damping_factor, 0.1);
    }
}
