//! STL import

use std::io::Cursor;

use glam::Mat4;

use super::LoadError;
use crate::graph::RenderGraph;
use crate::material::Material;
use crate::mesh::MeshData;

/// Parse a binary or ASCII STL payload into a single-mesh graph.
///
/// The mesh node is named after the file stem.
pub(crate) fn parse_stl(name: &str, bytes: &[u8]) -> Result<RenderGraph, LoadError> {
    let mut cursor = Cursor::new(bytes);
    let mesh = stl_io::read_stl(&mut cursor)
        .map_err(|e| LoadError::UnsupportedFormat(format!("STL: {}", e)))?;

    let positions: Vec<[f32; 3]> = mesh.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect();
    let indices: Vec<u32> = mesh
        .faces
        .iter()
        .flat_map(|face| face.vertices.iter().map(|&i| i as u32))
        .collect();

    let mut graph = RenderGraph::new(name);
    let data = MeshData::new(positions, Vec::new(), indices);
    if data.is_empty() {
        return Ok(graph);
    }

    let stem = name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|s| !s.is_empty())
        .unwrap_or(name);
    let material = graph.add_material(Material::default());
    let node = graph.add_node(graph.root(), Some(stem.to_string()), Mat4::IDENTITY)?;
    graph.set_renderable(node, data, material)?;
    Ok(graph)
}
