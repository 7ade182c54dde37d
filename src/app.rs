use anyhow::Context as _;
use log::{error, info};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::SessionConfig,
    error::SceneResult,
    gfx::{
        camera::camera_controller::CameraController,
        rendering::render_engine::RenderEngine,
        scene::Scene,
        surface::{RenderSurface, Viewport},
        ui::{draw_hud, UiManager},
    },
    session::{Frame, FrameOutcome, FrameRenderer, SceneSession},
};

/// [`FrameRenderer`] drawing into a winit window: the scene through the
/// render engine, the HUD through the ImGui overlay
pub struct WindowRenderer {
    window: Arc<Window>,
    engine: RenderEngine,
    ui: UiManager,
}

impl WindowRenderer {
    pub fn new(window: Arc<Window>, surface: &RenderSurface) -> SceneResult<Self> {
        let engine = pollster::block_on(RenderEngine::new(window.clone(), surface))?;
        let ui = UiManager::new(
            engine.device(),
            engine.queue(),
            engine.surface_format(),
            &window,
        );
        Ok(Self { window, engine, ui })
    }

    /// Passes a window event to the overlay; true if the overlay consumed it
    pub fn handle_ui_input(&mut self, window_id: WindowId, event: &WindowEvent) -> bool {
        self.ui.handle_input(&self.window, window_id, event)
    }

    pub fn ui_wants_input(&self) -> bool {
        self.ui.wants_input()
    }
}

impl FrameRenderer for WindowRenderer {
    fn prepare(&mut self, scene: &Scene, _surface: &RenderSurface) -> SceneResult<()> {
        self.engine.prepare_scene(scene)
    }

    fn resize(&mut self, surface: &RenderSurface) {
        self.engine.resize(surface);
    }

    fn render(&mut self, frame: &Frame<'_>) -> SceneResult<FrameOutcome> {
        self.engine.update(frame.scene, *frame.camera);

        let ui = &mut self.ui;
        let window = &self.window;
        let mut immersive_requested = false;
        let mut overlay_result = Ok(());

        let presented = self.engine.render_frame(
            frame.scene,
            Some(|device: &wgpu::Device, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView| {
                overlay_result = ui.draw(device, queue, encoder, window, view, |ui| {
                    immersive_requested = draw_hud(ui, frame.metrics, frame.immersive);
                });
            }),
        )?;
        overlay_result?;

        Ok(FrameOutcome {
            presented,
            immersive_requested,
        })
    }
}

pub struct PulseApp {
    event_loop: EventLoop<()>,
    app_state: AppState,
}

struct AppState {
    config: SessionConfig,
    window: Option<Arc<Window>>,
    session: Option<SceneSession<WindowRenderer>>,
    controller: CameraController,
    startup_error: Option<anyhow::Error>,
}

impl PulseApp {
    pub fn new(config: SessionConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        Ok(Self {
            event_loop,
            app_state: AppState {
                config,
                window: None,
                session: None,
                controller: CameraController::new(),
                startup_error: None,
            },
        })
    }

    /// Runs the event loop until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated abnormally")?;

        match self.app_state.startup_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (width, height) = self.config.window_size;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.window_title.clone())
                    .with_transparent(self.config.alpha)
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .context("failed to create window")?;
        let window = Arc::new(window);

        let viewport = viewport_of(&window);
        let surface = RenderSurface::new(viewport, self.config.max_pixel_ratio, self.config.alpha);
        let renderer = WindowRenderer::new(window.clone(), &surface)?;
        let session = SceneSession::initialize(renderer, viewport, &self.config)?;

        info!("Window ready: {}x{} logical", viewport.width, viewport.height);
        self.window = Some(window);
        self.session = Some(session);
        Ok(())
    }
}

/// Logical window size and scale factor
fn viewport_of(window: &Window) -> Viewport {
    let scale_factor = window.scale_factor();
    let size: LogicalSize<u32> = window.inner_size().to_logical(scale_factor);
    Viewport::new(size.width, size.height, scale_factor)
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            error!("Startup failed: {err:#}");
            self.startup_error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let (Some(window), Some(session)) = (self.window.as_ref(), self.session.as_mut()) else {
            return;
        };

        if session.renderer_mut().handle_ui_input(window_id, &event) {
            window.request_redraw();
            return;
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                let viewport = viewport_of(window);
                session.handle_resize(viewport.width, viewport.height, viewport.device_pixel_ratio);
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = session.advance_frame() {
                    error!("Rendering stopped: {err}");
                    event_loop.exit();
                }
            }
            other => {
                if let Some(input) = self.controller.process_window_event(&other) {
                    session.handle_pointer(input);
                }
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        // Don't drive the camera while the overlay has the pointer
        if session.renderer().ui_wants_input() {
            return;
        }

        if let Some(input) = self.controller.process_device_event(&event) {
            session.handle_pointer(input);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
