//! Continuous draw cycle.
//!
//! The loop renders through a [`RenderSurface`] and asks a [`FrameScheduler`]
//! for the next tick after every successful frame. Neither trait assumes a
//! particular graphics API, so the loop runs unchanged against in-memory
//! doubles.

use partview_core::RenderGraph;

use crate::camera::Camera;
use crate::config::DisplayConfig;
use crate::display_options::DisplayOptions;
use crate::viewport::ViewportSize;

/// Render surface errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Render context lost: {0}")]
    ContextLost(String),
    #[error("Render surface has been released")]
    Released,
    #[error("Render failed: {0}")]
    Other(String),
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Monotonic frame counter
    pub index: u64,
    /// Changes whenever geometry, materials or visibility of the scene change
    pub scene_revision: u64,
    pub viewport: ViewportSize,
    pub camera: &'a Camera,
    /// `None` while no model is loaded
    pub graph: Option<&'a RenderGraph>,
    pub display: &'a DisplayOptions,
    pub config: &'a DisplayConfig,
}

/// Drawing context the loop renders into.
pub trait RenderSurface: Send {
    /// Match the drawable size to the viewport.
    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError>;

    /// Draw one frame.
    fn render(&mut self, frame: &Frame) -> Result<(), SurfaceError>;

    /// Release the drawing context. Called once on teardown.
    fn release(&mut self);
}

/// Animation-frame primitive that drives the loop.
pub trait FrameScheduler: Send {
    /// Request another tick.
    fn schedule(&mut self);

    /// Cancel any pending tick.
    fn cancel(&mut self);
}

/// Render loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    Stopped,
    /// A surface error ended the session.
    Failed,
}

/// Owns the surface and scheduler and sequences ticks.
pub struct RenderLoop {
    state: LoopState,
    surface: Box<dyn RenderSurface>,
    scheduler: Box<dyn FrameScheduler>,
    frames_rendered: u64,
}

impl RenderLoop {
    pub fn new(surface: Box<dyn RenderSurface>, scheduler: Box<dyn FrameScheduler>) -> Self {
        Self {
            state: LoopState::Idle,
            surface,
            scheduler,
            frames_rendered: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Begin ticking. Only an idle loop can be started.
    pub fn start(&mut self) {
        if self.state != LoopState::Idle {
            tracing::warn!("Render loop cannot start from {:?}", self.state);
            return;
        }
        tracing::info!("Render loop started");
        self.state = LoopState::Running;
        self.scheduler.schedule();
    }

    /// Render one frame and schedule the next.
    ///
    /// Ticks outside the running state are ignored. A surface error is fatal:
    /// the loop moves to [`LoopState::Failed`] and stops scheduling.
    pub fn tick<'a>(&mut self, build: impl FnOnce(u64) -> Frame<'a>) -> Result<(), SurfaceError> {
        if self.state != LoopState::Running {
            return Ok(());
        }
        let frame = build(self.frames_rendered);
        match self.surface.render(&frame) {
            Ok(()) => {
                self.frames_rendered += 1;
                self.scheduler.schedule();
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Resize the surface without interrupting the loop.
    pub fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        if matches!(self.state, LoopState::Stopped | LoopState::Failed) {
            return Ok(());
        }
        self.surface.resize(size).inspect_err(|e| self.fail(e))
    }

    /// Cancel the scheduled tick and release the surface. Idempotent.
    pub fn stop(&mut self) {
        if self.state == LoopState::Stopped {
            return;
        }
        self.scheduler.cancel();
        if self.state != LoopState::Failed {
            self.surface.release();
        }
        tracing::info!("Render loop stopped after {} frames", self.frames_rendered);
        self.state = LoopState::Stopped;
    }

    fn fail(&mut self, error: &SurfaceError) {
        tracing::error!("Render loop failed: {}", error);
        self.scheduler.cancel();
        self.surface.release();
        self.state = LoopState::Failed;
    }
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.state)
            .field("frames_rendered", &self.frames_rendered)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::doubles;
    use super::*;
    use crate::config::{CameraConfig, DisplayConfig};

    struct Scene {
        camera: Camera,
        display: DisplayOptions,
        config: DisplayConfig,
    }

    impl Scene {
        fn new() -> Self {
            Self {
                camera: Camera::from_config(&CameraConfig::default(), 1.0),
                display: DisplayOptions::default(),
                config: DisplayConfig::default(),
            }
        }

        fn frame(&self, index: u64) -> Frame<'_> {
            Frame {
                index,
                scene_revision: 0,
                viewport: ViewportSize::new(640, 480),
                camera: &self.camera,
                graph: None,
                display: &self.display,
                config: &self.config,
            }
        }
    }

    #[test]
    fn test_tick_requires_start() {
        let (surface, scheduler, log) = doubles();
        let mut render_loop = RenderLoop::new(surface, scheduler);
        let scene = Scene::new();

        render_loop.tick(|i| scene.frame(i)).unwrap();
        assert!(log.lock().unwrap().rendered.is_empty());

        render_loop.start();
        render_loop.tick(|i| scene.frame(i)).unwrap();
        render_loop.tick(|i| scene.frame(i)).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.rendered, vec![0, 1]);
        // One request on start, one after each frame
        assert_eq!(log.scheduled, 3);
    }

    #[test]
    fn test_surface_error_is_fatal() {
        let (surface, scheduler, log) = doubles();
        let mut render_loop = RenderLoop::new(surface, scheduler);
        let scene = Scene::new();
        render_loop.start();

        log.lock().unwrap().fail_next = Some(SurfaceError::ContextLost("gpu reset".into()));
        let result = render_loop.tick(|i| scene.frame(i));
        assert_eq!(result, Err(SurfaceError::ContextLost("gpu reset".into())));
        assert_eq!(render_loop.state(), LoopState::Failed);

        // No retry
        render_loop.tick(|i| scene.frame(i)).unwrap();
        let log = log.lock().unwrap();
        assert!(log.rendered.is_empty());
        assert_eq!(log.scheduled, 1);
        assert_eq!(log.cancelled, 1);
    }

    #[test]
    fn test_stop_cancels_and_releases_once() {
        let (surface, scheduler, log) = doubles();
        let mut render_loop = RenderLoop::new(surface, scheduler);
        render_loop.start();
        render_loop.stop();
        render_loop.stop();

        assert_eq!(render_loop.state(), LoopState::Stopped);
        let log = log.lock().unwrap();
        assert_eq!(log.cancelled, 1);
        assert_eq!(log.released, 1);
    }

    #[test]
    fn test_resize_keeps_running() {
        let (surface, scheduler, log) = doubles();
        let mut render_loop = RenderLoop::new(surface, scheduler);
        render_loop.start();
        render_loop.resize(ViewportSize::new(320, 200)).unwrap();
        assert!(render_loop.is_running());
        assert_eq!(log.lock().unwrap().resized, vec![ViewportSize::new(320, 200)]);
    }
}
