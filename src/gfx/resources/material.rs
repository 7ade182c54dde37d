//! Shader materials
//!
//! A [`ShaderMaterial`] pairs opaque WGSL program text with a set of named
//! uniforms. Any identifier starting with `u_` in the program text is a
//! uniform reference, and each one must be set before the material is
//! handed to the GPU. A material may also declare the kind each uniform must
//! hold. [`ShaderMaterial::validate`] enforces both, once, at startup.

use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use crate::{
    config::NoiseConfig,
    error::{SceneError, SceneResult},
    gfx::resources::texture_resource::{TextureData, TextureResource},
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

pub type TextureHandle = Arc<TextureData>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec4,
    Texture,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// `None` leaves the slot unbound; it samples as transparent black
    Texture(Option<TextureHandle>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }
}

/// WGSL source with a `vs_main` and an `fs_main` entry point
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    pub label: String,
    pub source: Cow<'static, str>,
}

impl ShaderProgram {
    pub fn new(label: &str, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.to_owned(),
            source: source.into(),
        }
    }

    /// Names of all `u_*` identifiers in the program text, in first-use order
    pub fn referenced_uniforms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let code = self.source.lines().map(|line| match line.find("//") {
            Some(comment) => &line[..comment],
            None => line,
        });

        for line in code {
            for token in line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_')) {
                if token.starts_with("u_") && token.len() > 2 && !names.contains(&token) {
                    names.push(token);
                }
            }
        }
        names
    }

    pub fn references(&self, uniform: &str) -> bool {
        self.referenced_uniforms().contains(&uniform)
    }
}

/// Names used by the displacement program
pub mod uniforms {
    pub const TIME: &str = "u_time";
    pub const RESOLUTION: &str = "u_resolution";
    pub const NOISE: &str = "u_noise";
    pub const TEXTURE: &str = "u_texture";
}

pub const DISPLACE_SHADER: &str = include_str!("../rendering/displace.wgsl");

/// Uniform kinds the displacement program's bindings are laid out for
pub const DISPLACE_CONTRACT: &[(&str, UniformKind)] = &[
    (uniforms::RESOLUTION, UniformKind::Vec2),
    (uniforms::TIME, UniformKind::Float),
    (uniforms::NOISE, UniformKind::Vec4),
    (uniforms::TEXTURE, UniformKind::Texture),
];

#[derive(Debug, Clone)]
pub struct ShaderMaterial {
    pub name: String,
    pub program: ShaderProgram,
    pub wireframe: bool,
    contract: &'static [(&'static str, UniformKind)],
    uniforms: BTreeMap<String, UniformValue>,
}

impl ShaderMaterial {
    pub fn new(name: &str, program: ShaderProgram) -> Self {
        Self {
            name: name.to_owned(),
            program,
            wireframe: false,
            contract: &[],
            uniforms: BTreeMap::new(),
        }
    }

    /// The animated displacement material with its full uniform set
    pub fn displacement(resolution: [f32; 2], noise: &NoiseConfig) -> Self {
        Self::new(
            "displaced_sphere",
            ShaderProgram::new("displace", DISPLACE_SHADER),
        )
        .with_contract(DISPLACE_CONTRACT)
        .with_uniform(uniforms::RESOLUTION, UniformValue::Vec2(resolution))
        .with_uniform(uniforms::TIME, UniformValue::Float(0.0))
        .with_uniform(
            uniforms::NOISE,
            UniformValue::Vec4([
                noise.time_divisor,
                noise.period,
                noise.amplitude,
                noise.displacement_divisor,
            ]),
        )
        .with_uniform(uniforms::TEXTURE, UniformValue::Texture(None))
    }

    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.set_uniform(name, value);
        self
    }

    /// Declares the kind each named uniform must hold
    pub fn with_contract(mut self, contract: &'static [(&'static str, UniformKind)]) -> Self {
        self.contract = contract;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.insert(name.to_owned(), value);
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vec2(&self, name: &str) -> Option<[f32; 2]> {
        match self.uniforms.get(name) {
            Some(UniformValue::Vec2(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn vec4(&self, name: &str) -> Option<[f32; 4]> {
        match self.uniforms.get(name) {
            Some(UniformValue::Vec4(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn texture(&self, name: &str) -> Option<&TextureHandle> {
        match self.uniforms.get(name) {
            Some(UniformValue::Texture(Some(texture))) => Some(texture),
            _ => None,
        }
    }

    /// Checks that every uniform the program text references has a value
    /// and that every declared uniform holds its declared kind
    pub fn validate(&self) -> SceneResult<()> {
        let missing: Vec<&str> = self
            .program
            .referenced_uniforms()
            .into_iter()
            .filter(|name| !self.uniforms.contains_key(*name))
            .collect();

        if !missing.is_empty() {
            return Err(SceneError::material_init(
                &self.name,
                format!("uniforms referenced by the shader but not set: {}", missing.join(", ")),
            ));
        }

        self.contract
            .iter()
            .try_for_each(|(name, kind)| self.expect_kind(name, *kind))
    }

    /// Checks that `name` holds a value of the given kind
    pub fn expect_kind(&self, name: &str, kind: UniformKind) -> SceneResult<()> {
        match self.uniforms.get(name) {
            Some(value) if value.kind() == kind => Ok(()),
            Some(value) => Err(SceneError::material_init(
                &self.name,
                format!("uniform '{}' is {:?}, expected {:?}", name, value.kind(), kind),
            )),
            None => Err(SceneError::material_init(
                &self.name,
                format!("uniform '{}' is not set", name),
            )),
        }
    }
}

/// GPU layout of the displacement uniforms.
///
/// MUST match `DisplaceUniforms` in `displace.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DisplaceUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    /// Height of the render target in physical pixels, used to move
    /// fragment coordinates to a bottom-left origin
    pub buffer_height: f32,
    /// time divisor, period, amplitude, displacement divisor
    pub noise: [f32; 4],
}

impl DisplaceUniforms {
    /// Packs the material's current values. Kinds are checked by
    /// [`ShaderMaterial::validate`]; a value of another kind packs as zero.
    pub fn from_material(material: &ShaderMaterial, buffer_height: f32) -> Self {
        Self {
            resolution: material.vec2(uniforms::RESOLUTION).unwrap_or_default(),
            time: material.float(uniforms::TIME).unwrap_or_default(),
            buffer_height,
            noise: material.vec4(uniforms::NOISE).unwrap_or_default(),
        }
    }
}

type DisplaceUBO = UniformBuffer<DisplaceUniforms>;

/// GPU side of a displacement material: uniform buffer, bound texture and
/// the bind group tying them together (group 2)
pub struct MaterialBindings {
    ubo: DisplaceUBO,
    texture: TextureResource,
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl MaterialBindings {
    pub fn layout_builder() -> BindGroupLayoutBuilder {
        BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
    }

    /// Uploads the material's texture (or the transparent placeholder) and
    /// builds its bind group. Fails if the material breaks its contract.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material: &ShaderMaterial,
        buffer_height: f32,
    ) -> SceneResult<Self> {
        material.validate()?;

        let ubo = DisplaceUBO::new_with_data(
            device,
            &DisplaceUniforms::from_material(material, buffer_height),
        );

        let texture = match material.texture(uniforms::TEXTURE) {
            Some(data) => TextureResource::upload(
                device,
                queue,
                data,
                &format!("{} texture", material.name),
                wgpu::FilterMode::Linear,
            ),
            None => TextureResource::placeholder(device, queue),
        };

        let bind_group_layout = Self::layout_builder().create(device, "Material Bind Group Layout");
        let bind_group = BindGroupBuilder::new(&bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, "Material Bind Group");

        Ok(Self {
            ubo,
            texture,
            bind_group_layout,
            bind_group,
        })
    }

    /// Pushes the material's current uniform values to the GPU
    pub fn update(&mut self, queue: &wgpu::Queue, material: &ShaderMaterial, buffer_height: f32) {
        self.ubo
            .update_content(queue, DisplaceUniforms::from_material(material, buffer_height));
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn texture(&self) -> &TextureResource {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_material() -> ShaderMaterial {
        ShaderMaterial::displacement([800.0, 600.0], &NoiseConfig::default())
    }

    #[test]
    fn test_shader_references_contract_uniforms() {
        let program = ShaderProgram::new("displace", DISPLACE_SHADER);
        let mut referenced = program.referenced_uniforms();
        referenced.sort();
        assert_eq!(referenced, vec!["u_noise", "u_resolution", "u_texture", "u_time"]);
    }

    #[test]
    fn test_reference_material_validates() {
        assert!(reference_material().validate().is_ok());
    }

    #[test]
    fn test_missing_uniform_fails_validation() {
        let material = ShaderMaterial::new(
            "broken",
            ShaderProgram::new("broken", "fn vs_main() { let t = globals.u_time + u_speed; }"),
        )
        .with_uniform("u_time", UniformValue::Float(0.0));

        match material.validate() {
            Err(SceneError::MaterialInit { material, reason }) => {
                assert_eq!(material, "broken");
                assert!(reason.contains("u_speed"));
                assert!(!reason.contains("u_time"));
            }
            other => panic!("expected MaterialInit, got {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_not_references() {
        let program = ShaderProgram::new("p", "// u_unused is documented here\nlet a = u_used;");
        assert_eq!(program.referenced_uniforms(), vec!["u_used"]);
    }

    #[test]
    fn test_uniform_block_reflects_material() {
        let mut material = reference_material();
        material.set_uniform(uniforms::TIME, UniformValue::Float(2.5));
        let block = DisplaceUniforms::from_material(&material, 1200.0);
        assert_eq!(block.time, 2.5);
        assert_eq!(block.resolution, [800.0, 600.0]);
        assert_eq!(block.buffer_height, 1200.0);
        assert_eq!(block.noise, [3.5, 10.0, 3.0, 5.0]);
        assert_eq!(std::mem::size_of::<DisplaceUniforms>(), 32);
    }

    #[test]
    fn test_wrong_kind_fails_validation() {
        let mut material = reference_material();
        material.set_uniform(uniforms::TIME, UniformValue::Vec2([0.0, 0.0]));
        match material.validate() {
            Err(SceneError::MaterialInit { reason, .. }) => assert!(reason.contains("u_time")),
            other => panic!("expected MaterialInit, got {:?}", other),
        }
    }

    #[test]
    fn test_packing_never_fails_after_validation() {
        let mut material = reference_material();
        material.set_uniform(uniforms::TIME, UniformValue::Vec2([1.0, 1.0]));

        // A mistyped value packs as zero instead of stopping the frame loop
        let block = DisplaceUniforms::from_material(&material, 600.0);
        assert_eq!(block.time, 0.0);
        assert_eq!(block.resolution, [800.0, 600.0]);
    }

    #[test]
    fn test_material_layout_matches_program_bindings() {
        let builder = MaterialBindings::layout_builder();
        let entries = builder.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].visibility, wgpu::ShaderStages::VERTEX_FRAGMENT);
        assert!(matches!(entries[0].ty, wgpu::BindingType::Buffer { .. }));
        assert!(matches!(entries[1].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[2].ty, wgpu::BindingType::Sampler(_)));
    }
}
