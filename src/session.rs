//! Scene session
//!
//! [`SceneSession`] owns everything that makes up the running demo: render
//! surface state, camera, orbit controls, the scene, the frame clock, the
//! frame-rate counter and the AR entry point. The GPU work is delegated to a
//! [`FrameRenderer`], so the session itself is plain state and can be driven
//! without a window.

use log::{debug, error, info, warn};

use crate::{
    config::SessionConfig,
    error::{SceneError, SceneResult},
    gfx::{
        camera::{
            camera_utils::CameraUniform,
            orbit_controls::{OrbitControls, PointerInput},
            perspective_camera::PerspectiveCamera,
        },
        clock::{Clock, SystemTime, TimeSource},
        resources::material::{uniforms, UniformValue},
        scene::Scene,
        surface::{RenderSurface, Viewport},
    },
    performance::{FpsCounter, FrameMetrics},
    xr::{ImmersiveEntry, UnsupportedImmersiveEntry},
};

/// Everything a renderer needs to draw one frame
pub struct Frame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a CameraUniform,
    pub surface: &'a RenderSurface,
    pub metrics: &'a FrameMetrics,
    pub immersive: &'a dyn ImmersiveEntry,
    /// Seconds since the session started
    pub elapsed: f32,
}

/// What happened to a frame handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    pub presented: bool,
    /// The AR entry button was clicked while drawing this frame
    pub immersive_requested: bool,
}

impl FrameOutcome {
    pub fn presented() -> Self {
        Self {
            presented: true,
            immersive_requested: false,
        }
    }

    pub fn skipped() -> Self {
        Self::default()
    }
}

/// GPU backend driven by a [`SceneSession`]
pub trait FrameRenderer {
    /// Uploads the scene and builds its GPU programs. Called once, before the
    /// first frame.
    fn prepare(&mut self, scene: &Scene, surface: &RenderSurface) -> SceneResult<()>;

    /// The render surface changed size or pixel ratio
    fn resize(&mut self, surface: &RenderSurface);

    /// Draws one frame without waiting for the GPU to finish it
    fn render(&mut self, frame: &Frame<'_>) -> SceneResult<FrameOutcome>;
}

pub struct SceneSession<R: FrameRenderer, T: TimeSource + Clone = SystemTime> {
    renderer: R,
    surface: RenderSurface,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    scene: Scene,
    clock: Clock<T>,
    fps: FpsCounter<T>,
    immersive: Box<dyn ImmersiveEntry>,
    elapsed: f32,
    frame_count: u64,
}

impl<R: FrameRenderer> SceneSession<R, SystemTime> {
    /// Builds the scene for `viewport` and hands it to `renderer`.
    ///
    /// Fails with [`SceneError::MaterialInit`] when a material's uniform
    /// contract is incomplete or its program does not compile.
    pub fn initialize(renderer: R, viewport: Viewport, config: &SessionConfig) -> SceneResult<Self> {
        Self::with_time_source(renderer, viewport, config, SystemTime::new())
    }
}

impl<R: FrameRenderer, T: TimeSource + Clone> SceneSession<R, T> {
    /// [`initialize`](SceneSession::initialize) with an explicit time source
    pub fn with_time_source(
        renderer: R,
        viewport: Viewport,
        config: &SessionConfig,
        time: T,
    ) -> SceneResult<Self> {
        let scene = Scene::displaced_sphere(config, [viewport.width as f32, viewport.height as f32]);
        Self::with_scene(renderer, viewport, config, scene, time)
    }

    /// Starts a session on a caller-built scene
    pub fn with_scene(
        mut renderer: R,
        viewport: Viewport,
        config: &SessionConfig,
        scene: Scene,
        time: T,
    ) -> SceneResult<Self> {
        let surface = RenderSurface::new(viewport, config.max_pixel_ratio, config.alpha);
        let aspect = if viewport.is_empty() {
            1.0
        } else {
            viewport.width as f32 / viewport.height as f32
        };
        let camera = PerspectiveCamera::new(&config.camera, aspect);
        let controls = OrbitControls::new(&config.controls, viewport.height);

        if let Err(err) = scene.validate().and_then(|_| renderer.prepare(&scene, &surface)) {
            error!("Scene initialization failed: {err}");
            return Err(err);
        }

        info!(
            "Scene session started: {}x{} @ {:.2}x",
            surface.width(),
            surface.height(),
            surface.pixel_ratio()
        );

        Ok(Self {
            renderer,
            surface,
            camera,
            controls,
            scene,
            clock: Clock::new(time.clone()),
            fps: FpsCounter::with_source(time),
            immersive: Box::new(UnsupportedImmersiveEntry),
            elapsed: 0.0,
            frame_count: 0,
        })
    }

    /// Replaces the default entry, which reports AR as unsupported
    pub fn with_immersive_entry(mut self, entry: Box<dyn ImmersiveEntry>) -> Self {
        self.immersive = entry;
        self
    }

    /// Advances the animation by one display frame and renders it.
    ///
    /// A frame the renderer cannot produce is skipped with a warning.
    pub fn advance_frame(&mut self) -> SceneResult<FrameOutcome> {
        self.elapsed = self.clock.elapsed_time();
        self.scene
            .set_uniform(uniforms::TIME, UniformValue::Float(self.elapsed));

        self.controls.update(&mut self.camera);
        self.camera.update_view_proj();
        self.fps.update();

        let frame = Frame {
            scene: &self.scene,
            camera: &self.camera.uniform,
            surface: &self.surface,
            metrics: self.fps.metrics(),
            immersive: self.immersive.as_ref(),
            elapsed: self.elapsed,
        };

        let outcome = match self.renderer.render(&frame) {
            Ok(outcome) => outcome,
            Err(SceneError::Frame(reason)) => {
                warn!("Frame {} skipped: {}", self.frame_count, reason);
                FrameOutcome::skipped()
            }
            Err(err) => return Err(err),
        };
        self.frame_count += 1;

        if outcome.immersive_requested {
            if let Err(err) = self.request_immersive() {
                warn!("{err}");
            }
        }

        Ok(outcome)
    }

    /// Applies a new logical window size and device pixel ratio.
    ///
    /// Only absolute values are stored, so repeating a resize changes
    /// nothing. A zero-sized window is ignored.
    pub fn handle_resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to {}x{}", width, height);
            return;
        }

        self.camera.resize_projection(width, height);
        self.camera.update_projection_matrix();

        self.surface.set_size(width, height);
        self.surface.set_pixel_ratio(device_pixel_ratio);
        self.controls.set_viewport_height(height);

        self.scene.set_uniform(
            uniforms::RESOLUTION,
            UniformValue::Vec2([width as f32, height as f32]),
        );

        self.renderer.resize(&self.surface);
        debug!(
            "Resized to {}x{} @ {:.2}x (drawing buffer {:?})",
            width,
            height,
            self.surface.pixel_ratio(),
            self.surface.drawing_buffer_size()
        );
    }

    /// Queues pointer input for the orbit controls
    pub fn handle_pointer(&mut self, input: PointerInput) {
        self.controls.apply(input, &self.camera);
    }

    /// Asks the platform for an immersive AR session
    pub fn request_immersive(&mut self) -> SceneResult<()> {
        self.immersive.request_session()?;
        info!("Immersive AR session started");
        Ok(())
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn immersive(&self) -> &dyn ImmersiveEntry {
        self.immersive.as_ref()
    }

    pub fn fps_metrics(&self) -> &FrameMetrics {
        self.fps.metrics()
    }

    /// Elapsed seconds written to the materials on the last frame
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::clock::ManualTime;

    #[derive(Default)]
    struct NullRenderer {
        resizes: usize,
        fail_next: Option<String>,
        click_ar: bool,
    }

    impl FrameRenderer for NullRenderer {
        fn prepare(&mut self, _scene: &Scene, _surface: &RenderSurface) -> SceneResult<()> {
            Ok(())
        }

        fn resize(&mut self, _surface: &RenderSurface) {
            self.resizes += 1;
        }

        fn render(&mut self, _frame: &Frame<'_>) -> SceneResult<FrameOutcome> {
            if let Some(reason) = self.fail_next.take() {
                return Err(SceneError::Frame(reason));
            }
            Ok(FrameOutcome {
                presented: true,
                immersive_requested: std::mem::take(&mut self.click_ar),
            })
        }
    }

    fn session() -> (SceneSession<NullRenderer, ManualTime>, ManualTime) {
        let time = ManualTime::new();
        let session = SceneSession::with_time_source(
            NullRenderer::default(),
            Viewport::new(800, 600, 1.0),
            &SessionConfig::default(),
            time.clone(),
        )
        .unwrap();
        (session, time)
    }

    #[test]
    fn test_zero_resize_is_ignored() {
        let (mut session, _) = session();
        session.handle_resize(0, 600, 1.0);
        assert_eq!(session.surface().width(), 800);
        assert_eq!(session.camera().aspect, 800.0 / 600.0);
        assert_eq!(session.renderer().resizes, 0);
    }

    #[test]
    fn test_resize_updates_resolution_uniform() {
        let (mut session, _) = session();
        session.handle_resize(1024, 512, 1.0);
        let material = &session.scene().mesh(0).unwrap().material;
        assert_eq!(material.vec2(uniforms::RESOLUTION), Some([1024.0, 512.0]));
    }

    #[test]
    fn test_failed_frame_is_skipped() {
        let (mut session, time) = session();
        session.renderer_mut().fail_next = Some("surface lost".to_string());

        time.advance_secs(0.25);
        let outcome = session.advance_frame().unwrap();
        assert!(!outcome.presented);

        time.advance_secs(0.25);
        assert!(session.advance_frame().unwrap().presented);
        assert_eq!(session.frame_count(), 2);
    }

    #[test]
    fn test_ar_click_does_not_stop_the_loop() {
        let (mut session, _) = session();
        session.renderer_mut().click_ar = true;

        let outcome = session.advance_frame().unwrap();
        assert!(outcome.immersive_requested);
        assert!(!session.immersive().is_supported());
        assert!(session.advance_frame().is_ok());
    }

    #[test]
    fn test_pointer_input_moves_camera_on_next_frame() {
        let (mut session, _) = session();
        let before = session.camera().position;

        session.handle_pointer(PointerInput::Rotate { dx: 60.0, dy: 0.0 });
        assert_eq!(session.camera().position, before);

        session.advance_frame().unwrap();
        assert_ne!(session.camera().position, before);
    }
}
