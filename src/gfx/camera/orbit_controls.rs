//! Orbit controls
//!
//! Orbits a [`PerspectiveCamera`] around a target point. Pointer input is
//! accumulated between frames and applied by [`OrbitControls::update`], once
//! per frame. With damping enabled the pending motion bleeds out over several
//! frames instead of being applied at once.

use std::f32::consts::PI;

use cgmath::*;

use super::perspective_camera::PerspectiveCamera;
use crate::config::ControlsConfig;

const EPS: f32 = 0.000_001;

/// One unit of pointer input, in window pixels or wheel steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Rotate { dx: f32, dy: f32 },
    Pan { dx: f32, dy: f32 },
    /// Positive steps move the camera towards the target
    Dolly { steps: f32 },
}

/// Spherical coordinates around the Y axis: `theta` is the azimuth from +Z,
/// `phi` the polar angle from +Y
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Height of the element receiving input, used to scale pixel deltas
    viewport_height: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig, viewport_height: u32) -> Self {
        Self {
            target: Point3::origin(),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            viewport_height: viewport_height.max(1) as f32,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zero(),
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Queues input for the next [`update`](Self::update)
    pub fn apply(&mut self, input: PointerInput, camera: &PerspectiveCamera) {
        match input {
            PointerInput::Rotate { dx, dy } => self.rotate(dx, dy),
            PointerInput::Pan { dx, dy } => self.pan(dx, dy, camera),
            PointerInput::Dolly { steps } => self.dolly(steps),
        }
    }

    /// A drag across the full viewport height turns the camera once around
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.theta_delta -= 2.0 * PI * dx * self.rotate_speed / self.viewport_height;
        self.phi_delta -= 2.0 * PI * dy * self.rotate_speed / self.viewport_height;
    }

    pub fn dolly(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(self.zoom_speed * steps);
    }

    /// Moves the target in the camera's view plane so the point under the
    /// cursor follows the pointer
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera) {
        let offset = camera.position - self.target;
        let visible_half_height = offset.magnitude() * (Rad::from(camera.fovy) / 2.0).tan();

        let view = camera.view_matrix();
        // Rows of the view rotation are the camera basis in world space
        let right = Vector3::new(view.x.x, view.y.x, view.z.x);
        let up = Vector3::new(view.x.y, view.y.y, view.z.y);

        let scale = 2.0 * visible_half_height * self.pan_speed / self.viewport_height;
        self.pan_offset += right * (-dx * scale) + up * (dy * scale);
    }

    pub fn has_pending_input(&self) -> bool {
        self.theta_delta.abs() > EPS
            || self.phi_delta.abs() > EPS
            || (self.scale - 1.0).abs() > EPS
            || self.pan_offset.magnitude2() > EPS * EPS
    }

    /// Applies queued input to the camera and re-aims it at the target.
    ///
    /// Returns `true` when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        let gain = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.theta_delta * gain;
        spherical.phi += self.phi_delta * gain;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * gain;

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.theta_delta *= decay;
            self.phi_delta *= decay;
            self.pan_offset *= decay;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;

        (camera.position - before).magnitude2() > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, ControlsConfig};

    fn setup(config: ControlsConfig) -> (OrbitControls, PerspectiveCamera) {
        let camera = PerspectiveCamera::new(&CameraConfig::default(), 800.0 / 600.0);
        (OrbitControls::new(&config, 600), camera)
    }

    fn azimuth(camera: &PerspectiveCamera) -> f32 {
        camera.position.x.atan2(camera.position.z)
    }

    #[test]
    fn test_idle_update_keeps_camera_still() {
        let (mut controls, mut camera) = setup(ControlsConfig::default());
        for _ in 0..10 {
            assert!(!controls.update(&mut camera));
        }
        assert!((camera.position - Point3::new(0.0, 0.0, 5.0)).magnitude() < 1e-5);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn test_rotation_applied_in_one_update_without_damping() {
        let (mut controls, mut camera) = setup(ControlsConfig::default());
        // A quarter of the viewport height is a quarter turn
        controls.rotate(-150.0, 0.0);
        assert!(controls.update(&mut camera));
        assert!((azimuth(&camera) - PI / 2.0).abs() < 1e-4);
        assert!(!controls.has_pending_input());

        assert!(!controls.update(&mut camera));
        assert!((azimuth(&camera) - PI / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_damping_spreads_rotation_over_frames() {
        let config = ControlsConfig {
            enable_damping: true,
            damping_factor: 0.05,
            ..ControlsConfig::default()
        };
        let (mut controls, mut camera) = setup(config);
        let target_angle = 0.5;
        controls.rotate(-target_angle * 600.0 / (2.0 * PI), 0.0);

        controls.update(&mut camera);
        assert!((azimuth(&camera) - target_angle * 0.05).abs() < 1e-4);
        assert!(controls.has_pending_input());

        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!((azimuth(&camera) - target_angle).abs() < 1e-3);
        assert!(!controls.has_pending_input());
    }

    #[test]
    fn test_polar_angle_never_flips_over_the_pole() {
        let (mut controls, mut camera) = setup(ControlsConfig::default());
        controls.rotate(0.0, 10_000.0);
        controls.update(&mut camera);
        let offset = camera.position - controls.target;
        assert!(offset.x.is_finite() && offset.z.is_finite());
        assert!(offset.y > 0.0);
        assert!((offset.magnitude() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_dolly_respects_distance_bounds() {
        let config = ControlsConfig {
            min_distance: 2.0,
            max_distance: 8.0,
            ..ControlsConfig::default()
        };
        let (mut controls, mut camera) = setup(config);

        controls.dolly(1.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 4.75).abs() < 1e-4);

        controls.dolly(200.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 2.0).abs() < 1e-4);

        controls.dolly(-200.0);
        controls.update(&mut camera);
        assert!((camera.position.z - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_pan_moves_camera_and_target_together() {
        let (mut controls, mut camera) = setup(ControlsConfig::default());
        controls.apply(PointerInput::Pan { dx: 100.0, dy: 0.0 }, &camera);
        controls.update(&mut camera);

        // Dragging right slides the scene right, so the view moves left
        assert!(controls.target.x < 0.0);
        assert!(controls.target.y.abs() < 1e-5);
        assert!((camera.position.x - controls.target.x).abs() < 1e-4);
        assert!((camera.position.z - 5.0).abs() < 1e-4);
    }
}
