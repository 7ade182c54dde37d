//! Global and per-node uniform bindings
//!
//! Group 0 carries the camera, shared by every pipeline. Group 1 carries the
//! model matrix of the node being drawn.

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<CameraUniform>;

/// Copies the camera's latest matrices into the global uniform buffer
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, camera: CameraUniform) {
    ubo.update_content(queue, camera);
}

/// Bind group layout and bind group for the camera uniforms (group 0)
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, "Global Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Model matrix of one scene node
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn from_translation(position: Vector3<f32>) -> Self {
        Self {
            model: Matrix4::from_translation(position).into(),
        }
    }
}

impl Default for TransformUniform {
    fn default() -> Self {
        Self {
            model: Matrix4::identity().into(),
        }
    }
}

/// Layout shared by every node's transform bind group (group 1)
pub fn transform_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_vertex(binding_types::uniform())
        .create(device, "Transform Bind Group Layout")
}

/// Per-node transform buffer and its bind group
pub struct TransformBindings {
    ubo: UniformBuffer<TransformUniform>,
    bind_group: wgpu::BindGroup,
}

impl TransformBindings {
    pub fn new(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        transform: TransformUniform,
    ) -> Self {
        let ubo = UniformBuffer::new_with_data(device, &transform);
        let bind_group = BindGroupBuilder::new(layout)
            .resource(ubo.binding_resource())
            .create(device, "Transform Bind Group");
        Self { ubo, bind_group }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, transform: TransformUniform) {
        self.ubo.update_content(queue, transform);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_translation_lands_in_last_column() {
        let transform = TransformUniform::from_translation(Vector3::new(0.0, 0.0, -10.0));
        assert_eq!(transform.model[3], [0.0, 0.0, -10.0, 1.0]);
        assert_eq!(transform.model[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_uniform_sizes_match_shader_structs() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 64);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }
}
