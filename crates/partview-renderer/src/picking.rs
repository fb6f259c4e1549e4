//! Object picking functionality

use glam::{Vec2, Vec3};
use partview_core::{NodeHandle, RenderGraph};

use crate::camera::Camera;

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Nearest intersection of a pick ray with renderable geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Renderable node that was hit
    pub node: NodeHandle,
    /// Distance along the ray
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Convert a pointer position to normalized device coordinates.
///
/// `rect_min` and `rect_size` describe the viewport in the same units as
/// `pointer`. Returns `None` for an empty viewport or a pointer outside it.
pub fn pointer_to_ndc(pointer: Vec2, rect_min: Vec2, rect_size: Vec2) -> Option<Vec2> {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return None;
    }
    let local = (pointer - rect_min) / rect_size;
    if !(0.0..=1.0).contains(&local.x) || !(0.0..=1.0).contains(&local.y) {
        return None;
    }
    Some(Vec2::new(local.x * 2.0 - 1.0, 1.0 - local.y * 2.0))
}

/// Pick the nearest visible renderable under a point in NDC.
///
/// Hidden nodes, hidden directly or through an ancestor, are never hit, so
/// a click passes through them to whatever is drawn behind.
pub fn pick(graph: &RenderGraph, camera: &Camera, ndc: Vec2) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(ndc);
    intersect_graph(graph, &ray)
}

/// Intersect a ray with every visible renderable, returning the nearest hit.
pub fn intersect_graph(graph: &RenderGraph, ray: &Ray) -> Option<PickHit> {
    let world_transforms = graph.world_transforms();
    let visibility = graph.effective_visibility();

    let mut closest_hit: Option<(NodeHandle, f32)> = None;

    for (handle, node) in graph.iter() {
        let Some(renderable) = &node.renderable else {
            continue;
        };
        if !visibility[handle.index()] {
            continue;
        }

        let transform = world_transforms[handle.index()];
        let bounds = renderable.mesh.bounds().transform(&transform);
        if bounds.is_empty() {
            continue;
        }

        // First check AABB for early rejection
        if ray_aabb_intersection(ray.origin, ray.direction, bounds.min, bounds.max).is_none() {
            continue;
        }

        let cull_back_faces = !graph
            .materials()
            .get(renderable.material)
            .is_some_and(|m| m.double_sided);
        let flips_winding = transform.determinant() < 0.0;

        for [a, b, c] in renderable.mesh.triangles() {
            let v0 = transform.transform_point3(a);
            let (v1, v2) = if flips_winding {
                (transform.transform_point3(c), transform.transform_point3(b))
            } else {
                (transform.transform_point3(b), transform.transform_point3(c))
            };

            if let Some(t) =
                ray_triangle_intersection(ray.origin, ray.direction, v0, v1, v2, cull_back_faces)
            {
                match closest_hit {
                    None => closest_hit = Some((handle, t)),
                    Some((_, current_t)) if t < current_t => closest_hit = Some((handle, t)),
                    _ => {}
                }
            }
        }
    }

    closest_hit.map(|(node, distance)| {
        tracing::debug!("Pick hit node {} at distance {:.3}", node, distance);
        PickHit {
            node,
            distance,
            point: ray.at(distance),
        }
    })
}

/// Ray-AABB (Axis-Aligned Bounding Box) intersection test
/// Returns the distance to intersection if hit, None otherwise
fn ray_aabb_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    bbox_min: Vec3,
    bbox_max: Vec3,
) -> Option<f32> {
    let inv_dir = ray_dir.recip();

    let t1 = (bbox_min - ray_origin) * inv_dir;
    let t2 = (bbox_max - ray_origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Ray-triangle intersection using the Möller–Trumbore algorithm.
///
/// With `cull_back_faces`, triangles wound clockwise as seen from the ray
/// origin are ignored.
fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    cull_back_faces: bool,
) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray_dir.cross(edge2);
    let a = edge1.dot(h);

    if cull_back_faces {
        if a < EPSILON {
            return None;
        }
    } else if a.abs() < EPSILON {
        return None; // Ray is parallel to triangle
    }

    let f = 1.0 / a;
    let s = ray_origin - v0;
    let u = f * s.dot(h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray_dir.dot(q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    if t > EPSILON { Some(t) } else { None }
}
