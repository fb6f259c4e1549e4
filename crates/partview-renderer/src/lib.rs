//! partview viewer engine
//!
//! Camera, picking, selection highlight and the render loop, independent of
//! any windowing toolkit or graphics API.
//!
//! # Architecture
//!
//! - [`viewer::Viewer`] - Facade owning the loaded model and all view state
//! - [`camera::OrbitController`] - Orbit/pan/zoom controls and framing
//! - [`picking`] - Ray construction and nearest-hit intersection
//! - [`selection::Highlighter`] - Highlight material swap and restore
//! - [`render_loop::RenderLoop`] - Tick sequencing over a [`render_loop::RenderSurface`]
//!
//! # Example
//!
//! ```ignore
//! use partview_renderer::{RendererConfig, Viewer, ViewportSize};
//!
//! let mut viewer = Viewer::new(RendererConfig::default(), surface, scheduler);
//! viewer.start(ViewportSize::new(1280, 720))?;
//!
//! let ticket = viewer.begin_load(reference.clone());
//! viewer.complete_load(&ticket, partview_core::load_document(&source, &reference));
//!
//! // Once per animation frame
//! viewer.tick()?;
//! ```

pub mod camera;
pub mod config;
pub mod display_options;
pub mod picking;
pub mod render_loop;
pub mod selection;
pub mod viewer;
pub mod viewport;

pub use camera::{Camera, OrbitController};
pub use config::{CameraConfig, DisplayConfig, RendererConfig};
pub use display_options::DisplayOptions;
pub use picking::{PickHit, Ray, pointer_to_ndc};
pub use render_loop::{Frame, FrameScheduler, LoopState, RenderLoop, RenderSurface, SurfaceError};
pub use selection::{Highlighter, SelectionError, SelectionState};
pub use viewer::{LoadedModel, Viewer, ViewerError, ViewerStatus};
pub use viewport::{ViewportManager, ViewportSize};
