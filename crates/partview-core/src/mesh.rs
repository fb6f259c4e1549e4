//! Triangle mesh data

use glam::Vec3;

use crate::bounds::BoundingBox;

/// Indexed triangle mesh in the local space of its node.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    bounds: BoundingBox,
}

impl MeshData {
    /// Create a mesh, computing its local bounds.
    ///
    /// Missing normals are filled with per-vertex averages of face normals.
    /// Triangles referencing out-of-range vertices are dropped.
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let vertex_count = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < vertex_count))
            .flatten()
            .copied()
            .collect();

        let bounds = BoundingBox::from_points(positions.iter().map(|p| Vec3::from(*p)));
        let normals = if normals.len() == positions.len() {
            normals
        } else {
            vertex_normals(&positions, &indices)
        };

        Self {
            positions,
            normals,
            indices,
            bounds,
        }
    }

    /// Create a mesh from non-indexed triangle soup.
    pub fn from_triangle_soup(positions: Vec<[f32; 3]>) -> Self {
        let indices = (0..positions.len() as u32).collect();
        Self::new(positions, Vec::new(), indices)
    }

    /// Local-space bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as vertex position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                Vec3::from(self.positions[tri[0] as usize]),
                Vec3::from(self.positions[tri[1] as usize]),
                Vec3::from(self.positions[tri[2] as usize]),
            ]
        })
    }
}

fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let v0 = Vec3::from(positions[tri[0] as usize]);
        let v1 = Vec3::from(positions[tri[1] as usize]);
        let v2 = Vec3::from(positions[tri[2] as usize]);
        let face = (v1 - v0).cross(v2 - v0);
        for &i in tri {
            accum[i as usize] += face;
        }
    }
    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_triangles_dropped() {
        let mesh = MeshData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            Vec::new(),
            vec![0, 1, 2, 0, 1, 7],
        );
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_generated_normals_face_up() {
        let mesh = MeshData::from_triangle_soup(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]);
        assert_eq!(mesh.normals.len(), 3);
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.bounds().max, Vec3::new(1.0, 1.0, 0.0));
    }
}
