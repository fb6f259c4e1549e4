//! Per-frame scene uniform shared by the mesh and line shaders

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use partview_core::material::hex_to_rgb;
use partview_renderer::Camera;
use partview_renderer::config::DisplayConfig;

/// Directional lights beyond this count are ignored
pub const MAX_LIGHTS: usize = 4;

/// Scene uniform (256 bytes), laid out like `Scene` in the shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz = camera position
    pub camera_position: [f32; 4],
    /// rgb = ambient color scaled by intensity
    pub ambient: [f32; 4],
    /// xyz = unit vector towards each light
    pub light_directions: [[f32; 4]; MAX_LIGHTS],
    /// rgb = light color scaled by intensity
    pub light_colors: [[f32; 4]; MAX_LIGHTS],
    /// x = fog near, y = fog far, z = light count
    pub params: [f32; 4],
    pub background: [f32; 4],
}

impl SceneUniform {
    pub fn new(camera: &Camera, config: &DisplayConfig) -> Self {
        let lighting = &config.lighting;
        let ambient = Vec3::from(hex_to_rgb(lighting.ambient_color)) * lighting.ambient_intensity;

        let mut light_directions = [[0.0; 4]; MAX_LIGHTS];
        let mut light_colors = [[0.0; 4]; MAX_LIGHTS];
        let mut count = 0;
        for light in lighting.lights.iter().take(MAX_LIGHTS) {
            let direction = Vec3::from(light.position).normalize_or_zero();
            let color = Vec3::from(hex_to_rgb(light.color)) * light.intensity;
            light_directions[count] = direction.extend(0.0).to_array();
            light_colors[count] = color.extend(0.0).to_array();
            count += 1;
        }

        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).to_array(),
            ambient: ambient.extend(0.0).to_array(),
            light_directions,
            light_colors,
            params: [config.fog_near, config.fog_far, count as f32, 0.0],
            background: Vec3::from(hex_to_rgb(config.background_color))
                .extend(1.0)
                .to_array(),
        }
    }
}
