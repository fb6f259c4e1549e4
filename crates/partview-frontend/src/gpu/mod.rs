//! GPU rendering of the viewport
//!
//! The scene is drawn offscreen with a depth buffer and handed to egui as a
//! native texture.

mod batch;
mod resources;
mod surface;
mod uniforms;
mod vertex;

pub use surface::{GpuSurface, SharedViewportImage};
