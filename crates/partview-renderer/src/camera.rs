//! Perspective camera and orbit controls.

use glam::{Mat4, Vec2, Vec3};
use partview_core::{BoundingBox, RenderGraph};

use crate::config::CameraConfig;
use crate::picking::Ray;

/// Keeps the polar angle away from the poles
const POLAR_EPSILON: f32 = 1e-3;
/// Residual rotation below this is dropped
const VELOCITY_EPSILON: f32 = 1e-6;

/// Perspective camera looking at an orbit target.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            position: Vec3::from(config.default_position),
            target: Vec3::from(config.default_target),
            up: Vec3::Y,
            fov_y: config.fov_degrees.to_radians(),
            aspect,
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the camera to its target.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Unit vector from the camera towards its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Update the aspect ratio; non-positive values are ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    /// World-space ray through a point in normalized device coordinates
    /// (`[-1, 1]` on both axes, y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(near, far - near)
    }
}

/// Orbit/pan/zoom controls around a target point.
///
/// Input mutates the camera immediately, except orbit rotation which, with
/// damping enabled, is spread over subsequent [`OrbitController::update`]
/// calls. Any change marks the controller dirty until the next update.
#[derive(Debug, Clone)]
pub struct OrbitController {
    camera: Camera,
    config: CameraConfig,
    /// Pending (azimuth, polar) rotation in radians
    rotation_delta: Vec2,
    dirty: bool,
}

impl OrbitController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            camera: Camera::from_config(&config, 1.0),
            config,
            rotation_delta: Vec2::ZERO,
            dirty: true,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Apply camera configuration, keeping the current pose.
    pub fn apply_config(&mut self, config: CameraConfig) {
        self.camera.fov_y = config.fov_degrees.to_radians();
        self.camera.near = config.near_plane;
        self.camera.far = config.far_plane;
        self.config = config;
        self.dirty = true;
    }

    /// True if the camera changed since the last update.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True while damped rotation is still being applied.
    pub fn is_animating(&self) -> bool {
        self.rotation_delta != Vec2::ZERO
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
        self.dirty = true;
    }

    /// Rotate around the target by a pointer drag in pixels.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        let sensitivity = self.config.orbit_sensitivity;
        self.rotation_delta += Vec2::new(-delta_x * sensitivity, -delta_y * sensitivity);
        self.dirty = true;
    }

    /// Move target and camera together by a pointer drag in pixels.
    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = self.camera.forward();
        let right = forward.cross(self.camera.up).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        let scale = self.config.pan_sensitivity * self.camera.distance();

        let offset = -right * delta_x * scale + up * delta_y * scale;
        self.camera.position += offset;
        self.camera.target += offset;
        self.dirty = true;
    }

    /// Dolly towards (positive steps) or away from the target.
    pub fn zoom(&mut self, steps: f32) {
        let offset = self.camera.position - self.camera.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            return;
        }
        let factor = (1.0 + self.config.zoom_sensitivity).powf(-steps);
        let new_distance =
            (distance * factor).clamp(self.config.min_distance, self.config.max_distance);
        self.camera.position = self.camera.target + offset / distance * new_distance;
        self.dirty = true;
    }

    /// Advance damping and clear the dirty flag.
    ///
    /// Returns true if the camera changed since the previous update.
    pub fn update(&mut self) -> bool {
        let mut changed = std::mem::take(&mut self.dirty);

        if self.rotation_delta != Vec2::ZERO {
            let step = if self.config.enable_damping {
                self.rotation_delta * self.config.damping_factor
            } else {
                self.rotation_delta
            };
            self.rotate(step.x, step.y);

            if self.config.enable_damping {
                self.rotation_delta *= 1.0 - self.config.damping_factor;
            } else {
                self.rotation_delta = Vec2::ZERO;
            }
            if self.rotation_delta.length() < VELOCITY_EPSILON {
                self.rotation_delta = Vec2::ZERO;
            }
            changed = true;
        }
        changed
    }

    fn rotate(&mut self, azimuth: f32, polar: f32) {
        let offset = self.camera.position - self.camera.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let theta = offset.x.atan2(offset.z) + azimuth;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + polar)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        self.camera.position = self.camera.target + new_offset;
    }

    /// Place the camera explicitly.
    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.camera.position = position;
        self.camera.target = target;
        self.rotation_delta = Vec2::ZERO;
        self.dirty = true;
    }

    /// Restore the configured default position and target.
    pub fn reset(&mut self) {
        self.camera.position = Vec3::from(self.config.default_position);
        self.camera.target = Vec3::from(self.config.default_target);
        self.rotation_delta = Vec2::ZERO;
        self.dirty = true;
    }

    /// Look at a world-space box from its diagonal.
    ///
    /// Returns false and leaves the camera unchanged if the box is degenerate.
    pub fn frame(&mut self, bounds: &BoundingBox) -> bool {
        if bounds.is_degenerate() {
            return false;
        }
        let center = bounds.center();
        let distance = bounds.diagonal();
        self.camera.target = center;
        self.camera.position = center + Vec3::splat(distance);
        self.rotation_delta = Vec2::ZERO;
        self.dirty = true;
        true
    }

    /// Normalize a whole asset and look at it.
    ///
    /// Scales the graph root so the largest dimension becomes
    /// `reference_size`, recenters it at the origin and places the camera at
    /// `(1.5, 1, 1.5) * reference_size`. Returns the applied scale, or `None`
    /// (nothing changed) if the asset bounds are degenerate.
    pub fn frame_whole(&mut self, graph: &mut RenderGraph, reference_size: f32) -> Option<f32> {
        let root = graph.root();
        let bounds = graph.subtree_bounds(root);
        if bounds.is_degenerate() {
            return None;
        }

        let scale = reference_size / bounds.max_dimension();
        let center = bounds.center();
        let node = graph.node_mut(root)?;
        node.local =
            Mat4::from_translation(-center * scale) * Mat4::from_scale(Vec3::splat(scale)) * node.local;

        self.camera.target = Vec3::ZERO;
        self.camera.position = Vec3::new(1.5, 1.0, 1.5) * reference_size;
        self.rotation_delta = Vec2::ZERO;
        self.dirty = true;
        Some(scale)
    }
}
