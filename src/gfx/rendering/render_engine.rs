//! WGPU-based rendering engine
//!
//! Owns the surface, device and queue, uploads the [`Scene`] once at startup
//! and draws it every frame: axes helper first, then the meshes with their
//! shader materials, then an optional UI overlay on top.

use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::util::DeviceExt;

use crate::{
    error::{SceneError, SceneResult},
    gfx::{
        camera::camera_utils::CameraUniform,
        resources::{
            global_bindings::{
                transform_layout, update_global_ubo, GlobalBindings, GlobalUBO, TransformBindings,
                TransformUniform,
            },
            material::MaterialBindings,
            texture_resource::DepthBuffer,
        },
        scene::{
            scene::{Mesh, Scene},
            vertex::LineVertex,
        },
        surface::RenderSurface,
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};

pub(crate) const LINES_SHADER: &str = include_str!("lines.wgsl");
const LINES_PIPELINE: &str = "Lines";

/// GPU copy of one scene mesh
struct GpuMesh {
    pipeline: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    transform: TransformBindings,
    material: MaterialBindings,
}

/// GPU copy of the axes helper
struct GpuLines {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    transform: TransformBindings,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    /// Largest texture side the device accepts
    max_texture_dimension: u32,
    depth_buffer: DepthBuffer,
    format: wgpu::TextureFormat,
    clear_color: wgpu::Color,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    transform_layout: BindGroupLayoutWithDesc,
    meshes: Vec<GpuMesh>,
    axes: Option<GpuLines>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`.
    ///
    /// The surface is sized to the drawing buffer of `render_surface`, scaled
    /// down to the adapter's texture limit when it is larger. An alpha-enabled
    /// render surface asks for a compositing alpha mode when the platform
    /// offers one.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        render_surface: &RenderSurface,
    ) -> SceneResult<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("Using GPU adapter: {}", adapter.get_info().name);

        let required_limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
        let max_texture_dimension = required_limits.max_texture_dimension_2d;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| SceneError::Frame("surface reports no texture formats".to_string()))?;

        let alpha_mode = if render_surface.alpha() {
            [
                wgpu::CompositeAlphaMode::PreMultiplied,
                wgpu::CompositeAlphaMode::PostMultiplied,
            ]
            .into_iter()
            .find(|mode| capabilities.alpha_modes.contains(mode))
        } else {
            None
        }
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let (width, height) = render_surface.drawing_buffer_size_within(max_texture_dimension);
        if (width, height) != render_surface.drawing_buffer_size() {
            warn!(
                "Drawing buffer {:?} exceeds the texture limit {}, rendering at {}x{}",
                render_surface.drawing_buffer_size(),
                max_texture_dimension,
                width,
                height
            );
        }
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        debug!("Surface configured: {}x{} {:?} {:?}", config.width, config.height, format, alpha_mode);

        let depth_buffer = DepthBuffer::new(&device, (config.width, config.height));

        let global_ubo = GlobalUBO::new_with_data(&device, &CameraUniform::default());
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let transform_layout = transform_layout(&device);
        let pipeline_manager = PipelineManager::new(device.clone());

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            max_texture_dimension,
            depth_buffer,
            format,
            clear_color: render_surface.clear_color(),
            pipeline_manager,
            global_ubo,
            global_bindings,
            transform_layout,
            meshes: Vec::new(),
            axes: None,
        })
    }

    /// Uploads geometry, compiles every material's program and builds the
    /// pipelines. Called once before the first frame.
    pub fn prepare_scene(&mut self, scene: &Scene) -> SceneResult<()> {
        if let Some(axes) = scene.axes() {
            self.pipeline_manager
                .load_shader(LINES_PIPELINE, LINES_SHADER, "axes")?;
            let config = self
                .base_pipeline_config(LINES_PIPELINE)
                .with_label("Axes Pipeline")
                .with_vertex_buffers(vec![LineVertex::desc()])
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_bind_group_layouts(vec![
                    self.global_bindings.bind_group_layout().clone(),
                    self.transform_layout.layout.clone(),
                ]);
            self.pipeline_manager.register_pipeline(LINES_PIPELINE, config);

            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Axes Vertex Buffer"),
                    contents: bytemuck::cast_slice(&axes.lines),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            self.axes = Some(GpuLines {
                vertex_buffer,
                vertex_count: axes.lines.len() as u32,
                transform: TransformBindings::new(
                    &self.device,
                    &self.transform_layout,
                    TransformUniform::default(),
                ),
            });
        }

        for mesh in scene.meshes() {
            let gpu_mesh = self.upload_mesh(mesh)?;
            self.meshes.push(gpu_mesh);
        }

        self.pipeline_manager.create_all_pipelines()?;
        info!(
            "Scene prepared: {} mesh(es), axes {}",
            self.meshes.len(),
            if self.axes.is_some() { "on" } else { "off" }
        );
        Ok(())
    }

    fn base_pipeline_config(&self, shader: &str) -> PipelineConfig {
        PipelineConfig::default_with_shader(shader)
            .with_cull_mode(None)
            .with_color_format(self.format)
            .with_depth_stencil(DepthBuffer::FORMAT)
    }

    fn upload_mesh(&mut self, mesh: &Mesh) -> SceneResult<GpuMesh> {
        let material = &mesh.material;
        let program = &material.program;

        self.pipeline_manager
            .load_shader(&program.label, &program.source, &material.name)?;
        let material_bindings =
            MaterialBindings::new(&self.device, &self.queue, material, self.config.height as f32)?;

        let (topology, indices) = if material.wireframe {
            (
                wgpu::PrimitiveTopology::LineList,
                mesh.geometry.wireframe_indices(),
            )
        } else {
            (
                wgpu::PrimitiveTopology::TriangleList,
                mesh.geometry.indices.clone(),
            )
        };

        if !self.pipeline_manager.has_pipeline(&material.name) {
            let config = self
                .base_pipeline_config(&program.label)
                .with_label(&format!("{} Pipeline", material.name))
                .with_primitive_topology(topology)
                .with_bind_group_layouts(vec![
                    self.global_bindings.bind_group_layout().clone(),
                    self.transform_layout.layout.clone(),
                    material_bindings.bind_group_layout().clone(),
                ]);
            self.pipeline_manager.register_pipeline(&material.name, config);
        }

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.geometry.to_vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        debug!(
            "Uploaded mesh '{}': {} vertices, {} indices",
            mesh.name,
            mesh.geometry.vertex_count(),
            indices.len()
        );

        Ok(GpuMesh {
            pipeline: material.name.clone(),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            transform: TransformBindings::new(&self.device, &self.transform_layout, mesh.transform()),
            material: material_bindings,
        })
    }

    /// Pushes camera, transforms and material uniforms to the GPU
    pub fn update(&mut self, scene: &Scene, camera_uniform: CameraUniform) {
        update_global_ubo(&mut self.global_ubo, &self.queue, camera_uniform);

        let buffer_height = self.config.height as f32;
        for (gpu_mesh, mesh) in self.meshes.iter_mut().zip(scene.meshes()) {
            gpu_mesh.transform.update(&self.queue, mesh.transform());
            gpu_mesh.material.update(&self.queue, &mesh.material, buffer_height);
        }
    }

    /// Renders one frame with an optional overlay drawn on top.
    ///
    /// Returns `Ok(false)` when the frame was skipped because the surface was
    /// lost, outdated or timed out; the surface is reconfigured so the next
    /// frame can proceed.
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>) -> SceneResult<bool>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(SceneError::Frame("out of GPU memory".to_string()));
            }
            Err(error @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                warn!("Surface {error}, reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                return Ok(false);
            }
            Err(error) => {
                warn!("Skipping frame: {error}");
                return Ok(false);
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_buffer.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let (Some(axes), Some(pipeline)) = (
                self.axes.as_ref(),
                self.pipeline_manager.get_pipeline(LINES_PIPELINE),
            ) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, axes.transform.bind_group(), &[]);
                render_pass.set_vertex_buffer(0, axes.vertex_buffer.slice(..));
                render_pass.draw(0..axes.vertex_count, 0..1);
            }

            for (gpu_mesh, mesh) in self.meshes.iter().zip(scene.meshes()) {
                if !mesh.visible {
                    continue;
                }
                let Some(pipeline) = self.pipeline_manager.get_pipeline(&gpu_mesh.pipeline) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, gpu_mesh.transform.bind_group(), &[]);
                render_pass.set_bind_group(2, gpu_mesh.material.bind_group(), &[]);
                render_pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(true)
    }

    /// Resizes the surface to the render surface's drawing buffer, within the
    /// texture limit, and recreates the depth buffer. Zero-sized buffers are
    /// ignored.
    pub fn resize(&mut self, render_surface: &RenderSurface) {
        let (width, height) = render_surface.drawing_buffer_size_within(self.max_texture_dimension);
        if width == 0 || height == 0 {
            return;
        }
        if width == self.config.width && height == self.config.height {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_buffer = DepthBuffer::new(&self.device, (width, height));
        debug!("Surface resized to {}x{}", width, height);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
