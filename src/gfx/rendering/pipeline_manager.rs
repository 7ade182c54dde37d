//! Render pipeline management system for wgpu
//!
//! Shaders and pipelines are registered by name and built together at
//! startup. Validation errors from wgpu are captured with error scopes so a
//! broken program surfaces as a [`SceneError::MaterialInit`] instead of a
//! panic on the first frame.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::{
    error::{SceneError, SceneResult},
    gfx::scene::vertex::Vertex3D,
};

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_buffers: Vec<VertexBufferLayout<'static>>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            shader: "shader.wgsl".to_string(),
            bind_group_layouts: Vec::new(),
            vertex_buffers: vec![Vertex3D::desc()],
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(Face::Back),
            depth_format: None,
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    /// Creates a new config with a specific shader
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            shader: shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_buffers(mut self, buffers: Vec<VertexBufferLayout<'static>>) -> Self {
        self.vertex_buffers = buffers;
        self
    }

    /// Enables depth testing against a buffer of the given format
    pub fn with_depth_stencil(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    /// Single colour target of `format`, keeping the current blend state
    pub fn with_color_format(mut self, format: TextureFormat) -> Self {
        for target in self.color_targets.iter_mut().flatten() {
            target.format = format;
        }
        self
    }

    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }
}

/// Owns compiled shader modules and the pipelines built from them
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
    pending_pipelines: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
            pending_pipelines: Vec::new(),
        }
    }

    /// Registers a pipeline configuration without creating it.
    ///
    /// Pipelines are built by [`create_all_pipelines`](Self::create_all_pipelines).
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipeline_configs.insert(name.to_string(), config);
        self.pending_pipelines.push(name.to_string());
    }

    /// Compiles a WGSL shader module.
    ///
    /// `owner` names the material the program belongs to, for error reports.
    pub fn load_shader(&mut self, name: &str, source: &str, owner: &str) -> SceneResult<()> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(SceneError::material_init(
                owner,
                format!("shader '{}' failed to compile: {}", name, error),
            ));
        }

        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    pub fn get_pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Creates all pending pipelines, stopping at the first failure
    pub fn create_all_pipelines(&mut self) -> SceneResult<()> {
        let pending = std::mem::take(&mut self.pending_pipelines);

        for (index, name) in pending.iter().enumerate() {
            let Some(config) = self.pipeline_configs.get(name) else {
                continue;
            };
            match self.create_pipeline_from_config(name, config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name.clone(), pipeline);
                }
                Err(error) => {
                    self.pending_pipelines = pending[index..].to_vec();
                    return Err(error);
                }
            }
        }

        Ok(())
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> SceneResult<RenderPipeline> {
        let shader = self.shader_modules.get(&config.shader).ok_or_else(|| {
            SceneError::material_init(name, format!("shader '{}' not loaded", config.shader))
        })?;

        self.device.push_error_scope(ErrorFilter::Validation);

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &config.vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(SceneError::material_init(
                name,
                format!("pipeline creation failed: {}", error),
            )),
            None => Ok(pipeline),
        }
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        rendering::render_engine::LINES_SHADER,
        resources::material::{DisplaceUniforms, DISPLACE_SHADER},
        scene::vertex::LineVertex,
    };
    use wgpu::naga;

    fn parse_and_validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|err| panic!("{}", err.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|err| panic!("{:?}", err));
        module
    }

    fn entry_points(module: &naga::Module) -> Vec<&str> {
        module.entry_points.iter().map(|ep| ep.name.as_str()).collect()
    }

    #[test]
    fn test_displace_program_is_valid_wgsl() {
        let module = parse_and_validate(DISPLACE_SHADER);
        assert_eq!(entry_points(&module), vec!["vs_main", "fs_main"]);

        let pnoise = module
            .functions
            .iter()
            .map(|(_, function)| function)
            .find(|function| function.name.as_deref() == Some("pnoise"))
            .expect("displace program defines pnoise");
        assert_eq!(pnoise.arguments.len(), 2);
        assert!(pnoise.result.is_some());
    }

    #[test]
    fn test_lines_program_is_valid_wgsl() {
        let module = parse_and_validate(LINES_SHADER);
        assert_eq!(entry_points(&module), vec!["vs_main", "fs_main"]);
    }

    #[test]
    fn test_displace_uniform_block_matches_rust_layout() {
        let module = parse_and_validate(DISPLACE_SHADER);
        let block = module
            .types
            .iter()
            .map(|(_, ty)| ty)
            .find(|ty| ty.name.as_deref() == Some("DisplaceUniforms"))
            .expect("displace program declares DisplaceUniforms");
        let naga::TypeInner::Struct { members, span } = &block.inner else {
            panic!("DisplaceUniforms is not a struct");
        };

        assert_eq!(*span as usize, std::mem::size_of::<DisplaceUniforms>());
        let offsets: Vec<(&str, usize)> = members
            .iter()
            .map(|member| (member.name.as_deref().unwrap_or(""), member.offset as usize))
            .collect();
        assert_eq!(
            offsets,
            vec![
                ("u_resolution", std::mem::offset_of!(DisplaceUniforms, resolution)),
                ("u_time", std::mem::offset_of!(DisplaceUniforms, time)),
                ("buffer_height", std::mem::offset_of!(DisplaceUniforms, buffer_height)),
                ("u_noise", std::mem::offset_of!(DisplaceUniforms, noise)),
            ]
        );
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::default_with_shader("lines")
            .with_label("Axes")
            .with_primitive_topology(PrimitiveTopology::LineList)
            .with_cull_mode(None)
            .with_vertex_buffers(vec![LineVertex::desc()])
            .with_depth_stencil(TextureFormat::Depth32Float)
            .with_color_format(TextureFormat::Rgba8Unorm);

        assert_eq!(config.shader, "lines");
        assert_eq!(config.label, "Axes");
        assert_eq!(config.primitive_topology, PrimitiveTopology::LineList);
        assert_eq!(config.cull_mode, None);
        assert_eq!(config.vertex_buffers[0].array_stride, 24);
        assert_eq!(config.depth_format, Some(TextureFormat::Depth32Float));
        assert_eq!(
            config.color_targets[0].as_ref().map(|t| t.format),
            Some(TextureFormat::Rgba8Unorm)
        );
    }

    #[test]
    fn test_default_config_draws_mesh_vertices() {
        let config = PipelineConfig::default();
        assert_eq!(config.vertex_buffers.len(), 1);
        assert_eq!(
            config.vertex_buffers[0].array_stride,
            std::mem::size_of::<Vertex3D>() as u64
        );
    }
}
