use super::camera_utils::{Camera, CameraUniform};
use crate::config::CameraConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Perspective camera looking from `position` towards `target`, Y up
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
    pub uniform: CameraUniform,
}

impl Camera for PerspectiveCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            position: Point3::from_vec(config.position),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            fovy: Deg(config.fov_degrees),
            aspect,
            znear: config.near,
            zfar: config.far,
            projection: Matrix4::identity(),
            uniform: CameraUniform::default(),
        };
        camera.update_projection_matrix();
        camera.update_view_proj();
        camera
    }

    /// Sets the aspect ratio from a viewport size.
    ///
    /// Call [`update_projection_matrix`](Self::update_projection_matrix) afterwards.
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn look_at(&mut self, target: Point3<f32>) {
        self.target = target;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = self.position.to_homogeneous().into();
        self.uniform.view_proj = self.build_view_projection_matrix().into();
    }
}
