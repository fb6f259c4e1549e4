//! CPU-side vertex batches for one scene revision.
//!
//! Geometry is flattened into world space with materials baked into the
//! vertices, so a frame costs three draw calls however the graph is nested.
//! Single-sided triangles keep counter-clockwise front faces (winding is
//! swapped under mirroring transforms) and are back-face culled on the GPU.

use glam::{Mat3, Mat4, Vec3};
use partview_core::material::hex_to_rgb;
use partview_core::{Material, MeshData, RenderGraph};
use partview_renderer::DisplayOptions;
use partview_renderer::config::DisplayConfig;

use super::vertex::{LineVertex, MeshVertex};

/// Axis colors: X red, Y green, Z blue
const AXIS_COLORS: [[f32; 4]; 3] = [
    [0.9, 0.27, 0.27, 1.0],
    [0.31, 0.78, 0.31, 1.0],
    [0.27, 0.47, 0.9, 1.0],
];

/// Vertices of every visible renderable, grouped by pipeline.
#[derive(Debug, Default)]
pub struct SceneBatch {
    /// Back-face culled triangles
    pub solid: Vec<MeshVertex>,
    /// Triangles drawn from both sides
    pub double_sided: Vec<MeshVertex>,
    /// Edge pairs of wireframe materials
    pub edges: Vec<LineVertex>,
}

impl SceneBatch {
    pub fn build(graph: &RenderGraph) -> Self {
        let world = graph.world_transforms();
        let visible = graph.effective_visibility();
        let mut batch = Self::default();

        for (handle, node) in graph.iter() {
            let Some(renderable) = &node.renderable else {
                continue;
            };
            if !visible[handle.index()] {
                continue;
            }
            let Some(material) = graph.materials().get(renderable.material) else {
                continue;
            };
            batch.push_mesh(&renderable.mesh, material, world[handle.index()]);
        }
        batch
    }

    pub fn triangle_count(&self) -> usize {
        (self.solid.len() + self.double_sided.len()) / 3
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() / 2
    }

    fn push_mesh(&mut self, mesh: &MeshData, material: &Material, transform: Mat4) {
        let linear = Mat3::from_mat4(transform);
        let mirrored = linear.determinant() < 0.0;
        let normal_matrix = if linear.determinant().abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };

        for tri in mesh.indices.chunks_exact(3) {
            let Some(corners) = corner_positions(mesh, tri) else {
                continue;
            };
            let [a, b, c] = corners.map(|p| transform.transform_point3(p));

            if material.wireframe {
                for (start, end) in [(a, b), (b, c), (c, a)] {
                    self.edges
                        .push(LineVertex::new(start.to_array(), material.base_color));
                    self.edges.push(LineVertex::new(end.to_array(), material.base_color));
                }
                continue;
            }

            let face_normal = {
                let n = (b - a).cross(c - a).normalize_or_zero();
                if mirrored { -n } else { n }
            };
            let vertex = |slot: usize, position: Vec3| {
                let normal = mesh
                    .normals
                    .get(tri[slot] as usize)
                    .map(|n| (normal_matrix * Vec3::from(*n)).normalize_or_zero())
                    .filter(|n| *n != Vec3::ZERO)
                    .unwrap_or(face_normal);
                MeshVertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    color: material.base_color,
                    emissive: material.emissive,
                }
            };

            let target = if material.double_sided {
                &mut self.double_sided
            } else {
                &mut self.solid
            };
            if mirrored {
                target.extend([vertex(0, a), vertex(2, c), vertex(1, b)]);
            } else {
                target.extend([vertex(0, a), vertex(1, b), vertex(2, c)]);
            }
        }
    }
}

fn corner_positions(mesh: &MeshData, tri: &[u32]) -> Option<[Vec3; 3]> {
    let corner = |i: u32| mesh.positions.get(i as usize).map(|p| Vec3::from(*p));
    Some([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?])
}

/// Grid and axis lines for the current display options.
pub fn overlay_lines(display: &DisplayOptions, config: &DisplayConfig) -> Vec<LineVertex> {
    let mut lines = Vec::new();
    let grid = &config.grid;

    if display.show_grid && grid.divisions > 0 && grid.size > 0.0 {
        let half = grid.size * 0.5;
        let step = grid.size / grid.divisions as f32;
        let center = grid.divisions / 2;

        for i in 0..=grid.divisions {
            let offset = -half + step * i as f32;
            let hex = if grid.divisions % 2 == 0 && i == center {
                grid.center_color
            } else {
                grid.line_color
            };
            let [r, g, b] = hex_to_rgb(hex);
            let color = [r, g, b, 1.0];
            lines.extend([
                LineVertex::new([offset, 0.0, -half], color),
                LineVertex::new([offset, 0.0, half], color),
                LineVertex::new([-half, 0.0, offset], color),
                LineVertex::new([half, 0.0, offset], color),
            ]);
        }
    }

    if display.show_axes {
        let length = grid.size * 0.5;
        for (axis, color) in [Vec3::X, Vec3::Y, Vec3::Z].into_iter().zip(AXIS_COLORS) {
            lines.push(LineVertex::new([0.0; 3], color));
            lines.push(LineVertex::new((axis * length).to_array(), color));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit quad in the XY plane facing +Z
    fn quad(extent: f32) -> MeshData {
        let h = extent * 0.5;
        MeshData::new(
            vec![[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    fn quad_graph(material: Material, transform: Mat4, extent: f32) -> RenderGraph {
        let mut graph = RenderGraph::new("quad");
        let handle = graph.add_material(material);
        let root = graph.root();
        let node = graph.add_node(root, Some("Quad".into()), transform).unwrap();
        graph.set_renderable(node, quad(extent), handle).unwrap();
        graph
    }

    fn winding_normal(v: &[MeshVertex]) -> Vec3 {
        let [a, b, c] = [v[0], v[1], v[2]].map(|v| Vec3::from(v.position));
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn test_single_sided_quad() {
        let graph = quad_graph(Material::default(), Mat4::IDENTITY, 1.0);
        let batch = SceneBatch::build(&graph);
        assert_eq!(batch.solid.len(), 6);
        assert!(batch.double_sided.is_empty());
        assert_eq!(batch.triangle_count(), 2);
        assert_eq!(batch.solid[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_large_face_is_kept_whole() {
        // A face much larger than the view keeps all its triangles; clipping
        // against the near plane is left to the rasterizer.
        let graph = quad_graph(Material::default(), Mat4::IDENTITY, 10.0);
        let batch = SceneBatch::build(&graph);
        assert_eq!(batch.triangle_count(), 2);
        assert_eq!(batch.solid[2].position, [5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_double_sided_goes_to_own_batch() {
        let graph = quad_graph(
            Material::default().with_double_sided(true),
            Mat4::IDENTITY,
            1.0,
        );
        let batch = SceneBatch::build(&graph);
        assert!(batch.solid.is_empty());
        assert_eq!(batch.double_sided.len(), 6);
    }

    #[test]
    fn test_mirroring_keeps_front_winding() {
        let mirror = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let graph = quad_graph(Material::default(), mirror, 1.0);
        let batch = SceneBatch::build(&graph);

        let normal = Vec3::from(batch.solid[0].normal);
        assert!(normal.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(winding_normal(&batch.solid).abs_diff_eq(normal, 1e-6));
    }

    #[test]
    fn test_world_transform_is_applied() {
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0))
            * Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let graph = quad_graph(Material::default(), transform, 1.0);
        let batch = SceneBatch::build(&graph);

        let normal = Vec3::from(batch.solid[0].normal);
        assert!(normal.abs_diff_eq(Vec3::X, 1e-6));
        assert!(batch.solid.iter().all(|v| (v.position[2] + 3.0).abs() < 0.5 + 1e-6));
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let mut graph = quad_graph(Material::default(), Mat4::IDENTITY, 1.0);
        let root = graph.root();
        graph.set_visible(root, false).unwrap();
        let batch = SceneBatch::build(&graph);
        assert_eq!(batch.triangle_count(), 0);
        assert_eq!(batch.edge_count(), 0);
    }

    #[test]
    fn test_wireframe_emits_edges() {
        let mut graph = quad_graph(Material::default(), Mat4::IDENTITY, 1.0);
        graph.materials_mut().set_wireframe(true);
        let batch = SceneBatch::build(&graph);
        assert_eq!(batch.triangle_count(), 0);
        assert_eq!(batch.edge_count(), 6);
    }

    #[test]
    fn test_material_is_baked() {
        let material = Material::new([0.2, 0.4, 0.6, 0.5]).with_emissive([0.1, 0.0, 0.0]);
        let graph = quad_graph(material, Mat4::IDENTITY, 1.0);
        let batch = SceneBatch::build(&graph);
        assert!(batch.solid.iter().all(|v| v.color == [0.2, 0.4, 0.6, 0.5]));
        assert!(batch.solid.iter().all(|v| v.emissive == [0.1, 0.0, 0.0]));
    }

    #[test]
    fn test_overlay_lines() {
        let config = DisplayConfig::default();
        let mut display = DisplayOptions::from_config(&config);

        display.show_grid = false;
        display.show_axes = false;
        assert!(overlay_lines(&display, &config).is_empty());

        display.show_grid = true;
        display.show_axes = true;
        // 21 lines in each direction, then 3 axes
        let lines = overlay_lines(&display, &config);
        assert_eq!(lines.len(), 2 * (2 * 21 + 3));
        assert_eq!(lines[lines.len() - 1].position, [0.0, 0.0, 10.0]);
    }
}
