//! Display options for controlling visibility of viewport helpers.

use crate::config::DisplayConfig;

/// Display options for controlling visibility of viewport helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Whether the ground grid is visible.
    pub show_grid: bool,
    /// Whether the world axes are visible.
    pub show_axes: bool,
    /// Whether materials are drawn as wireframe.
    pub wireframe: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl DisplayOptions {
    /// Initial options from the renderer configuration. Wireframe always
    /// starts off.
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self {
            show_grid: config.show_grid,
            show_axes: config.show_axes,
            wireframe: false,
        }
    }
}
