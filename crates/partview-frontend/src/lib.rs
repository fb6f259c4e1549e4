//! partview desktop frontend
//!
//! egui application hosting the viewer: dockable hierarchy, viewport and
//! properties panels, background document loading and persistent settings.

pub mod config;
pub mod document_service;

mod app;
mod gpu;
mod load_worker;
mod panels;
mod scheduler;
mod state;

pub use app::{PartviewApp, StartupError};
