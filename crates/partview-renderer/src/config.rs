//! Renderer configuration.

use serde::{Deserialize, Serialize};

/// Camera and orbit control settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Camera position restored by `reset`
    pub default_position: [f32; 3],
    /// Orbit target restored by `reset`
    pub default_target: [f32; 3],
    /// Radians of orbit per pixel of drag
    pub orbit_sensitivity: f32,
    /// World units of pan per pixel of drag, per unit of camera distance
    pub pan_sensitivity: f32,
    /// Fractional distance change per wheel step
    pub zoom_sensitivity: f32,
    /// Keep orbiting after the drag ends, slowing down each tick
    pub enable_damping: bool,
    /// Fraction of angular velocity removed each tick
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near_plane: 0.01,
            far_plane: 1000.0,
            default_position: [5.0, 5.0, 5.0],
            default_target: [0.0, 0.0, 0.0],
            orbit_sensitivity: 0.005,
            pan_sensitivity: 0.001,
            zoom_sensitivity: 0.1,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.01,
            max_distance: 500.0,
        }
    }
}

/// Ground grid settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Total edge length of the grid
    pub size: f32,
    pub divisions: u32,
    /// Color of the two center lines (`0xRRGGBB`)
    pub center_color: u32,
    /// Color of the other lines (`0xRRGGBB`)
    pub line_color: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 20.0,
            divisions: 20,
            center_color: 0x444466,
            line_color: 0x333355,
        }
    }
}

/// A directional light.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectionalLight {
    /// Light position; the light points from here to the origin
    pub position: [f32; 3],
    pub color: u32,
    pub intensity: f32,
}

/// Scene lighting used by the mesh shader.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightingConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f32,
    pub lights: Vec<DirectionalLight>,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.6,
            lights: vec![
                DirectionalLight {
                    position: [10.0, 20.0, 10.0],
                    color: 0xffffff,
                    intensity: 1.5,
                },
                DirectionalLight {
                    position: [-10.0, 0.0, -10.0],
                    color: 0x88aaff,
                    intensity: 0.4,
                },
            ],
        }
    }
}

/// Scene appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub background_color: u32,
    /// Distance where fog starts blending into the background
    pub fog_near: f32,
    /// Distance where geometry is fully fogged
    pub fog_far: f32,
    pub show_grid: bool,
    pub show_axes: bool,
    pub grid: GridConfig,
    pub lighting: LightingConfig,
    /// Base color of the selection highlight (`0xRRGGBB`)
    pub highlight_color: u32,
    /// Emissive color of the selection highlight (`0xRRGGBB`)
    pub highlight_emissive: u32,
    /// Largest model dimension after whole-model framing
    pub reference_size: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            background_color: 0x1a1a2e,
            fog_near: 50.0,
            fog_far: 200.0,
            show_grid: true,
            show_axes: false,
            grid: GridConfig::default(),
            lighting: LightingConfig::default(),
            highlight_color: 0xffaa00,
            highlight_emissive: 0x553300,
            reference_size: 5.0,
        }
    }
}

/// Complete renderer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RendererConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}
