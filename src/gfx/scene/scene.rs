use cgmath::Vector3;

use crate::{
    config::SessionConfig,
    error::SceneResult,
    gfx::{
        geometry::{generate_axes, generate_sphere, GeometryData, LineData},
        resources::{
            global_bindings::TransformUniform,
            material::{ShaderMaterial, UniformValue},
        },
    },
};

/// Three coloured line segments marking the world axes at the origin
#[derive(Debug, Clone)]
pub struct AxesHelper {
    pub size: f32,
    pub lines: LineData,
}

impl AxesHelper {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            lines: generate_axes(size),
        }
    }
}

/// Geometry drawn with a shader material at a fixed world position
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryData,
    pub material: ShaderMaterial,
    pub position: Vector3<f32>,
    pub visible: bool,
}

impl Mesh {
    pub fn new(name: &str, geometry: GeometryData, material: ShaderMaterial) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            position: Vector3::new(0.0, 0.0, 0.0),
            visible: true,
        }
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn transform(&self) -> TransformUniform {
        TransformUniform::from_translation(self.position)
    }
}

/// Scene graph root
#[derive(Debug, Clone, Default)]
pub struct Scene {
    axes: Option<AxesHelper>,
    meshes: Vec<Mesh>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// The axes helper plus the noise-displaced wireframe sphere
    pub fn displaced_sphere(config: &SessionConfig, resolution: [f32; 2]) -> Self {
        let mut scene = Self::new();

        if let Some(size) = config.axes_size {
            scene.add_axes(size);
        }

        let sphere = &config.sphere;
        let geometry = generate_sphere(sphere.radius, sphere.width_segments, sphere.height_segments);
        let material = ShaderMaterial::displacement(resolution, &config.noise)
            .with_wireframe(sphere.wireframe);
        scene.add_mesh(Mesh::new("Sphere", geometry, material).with_position(sphere.position));

        scene
    }

    pub fn add_axes(&mut self, size: f32) {
        self.axes = Some(AxesHelper::new(size));
    }

    /// Adds a mesh and returns its index
    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn axes(&self) -> Option<&AxesHelper> {
        self.axes.as_ref()
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn mesh_mut(&mut self, index: usize) -> Option<&mut Mesh> {
        self.meshes.get_mut(index)
    }

    /// Sets a uniform on every material whose program references it
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        for mesh in &mut self.meshes {
            if mesh.material.program.references(name) {
                mesh.material.set_uniform(name, value.clone());
            }
        }
    }

    /// Checks every material's uniform contract
    pub fn validate(&self) -> SceneResult<()> {
        self.meshes
            .iter()
            .try_for_each(|mesh| mesh.material.validate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::SceneError,
        gfx::resources::material::{uniforms, ShaderProgram},
    };

    fn test_scene() -> Scene {
        Scene::displaced_sphere(&SessionConfig::default(), [800.0, 600.0])
    }

    #[test]
    fn test_default_scene_contents() {
        let scene = test_scene();
        let axes = scene.axes().unwrap();
        assert_eq!(axes.size, 3.0);
        assert_eq!(axes.lines.len(), 6);

        assert_eq!(scene.meshes().len(), 1);
        let sphere = scene.mesh(0).unwrap();
        assert_eq!(sphere.position, Vector3::new(0.0, 0.0, -10.0));
        assert_eq!(sphere.geometry.vertex_count(), 97 * 97);
        assert!(sphere.material.wireframe);
        assert!(scene.validate().is_ok());
    }

    #[test]
    fn test_axes_can_be_disabled() {
        let config = SessionConfig::default().with_axes(None);
        let scene = Scene::displaced_sphere(&config, [1.0, 1.0]);
        assert!(scene.axes().is_none());
    }

    #[test]
    fn test_set_uniform_reaches_referencing_materials_only() {
        let mut scene = test_scene();
        let plain = ShaderMaterial::new(
            "Plain",
            ShaderProgram::new("plain", "fn fs_main() -> vec4<f32> { return vec4<f32>(1.0); }"),
        );
        let plain_index = scene.add_mesh(Mesh::new("Plain", GeometryData::new(), plain));

        scene.set_uniform(uniforms::TIME, UniformValue::Float(2.5));

        assert_eq!(scene.mesh(0).unwrap().material.float(uniforms::TIME), Some(2.5));
        assert_eq!(scene.mesh(plain_index).unwrap().material.float(uniforms::TIME), None);
    }

    #[test]
    fn test_validate_reports_missing_uniform() {
        let mut scene = Scene::new();
        let program = ShaderProgram::new("needs_time", "let t = u_time;");
        scene.add_mesh(Mesh::new(
            "Broken",
            GeometryData::new(),
            ShaderMaterial::new("Broken", program),
        ));

        assert!(matches!(
            scene.validate(),
            Err(SceneError::MaterialInit { .. })
        ));
    }
}
