//! glTF / GLB import

use glam::Mat4;
use gltf::mesh::Mode;

use super::LoadError;
use crate::graph::{NodeHandle, RenderGraph};
use crate::material::{Material, MaterialHandle};
use crate::mesh::MeshData;

/// Materials of the document mapped into the graph library.
struct MaterialMap {
    handles: Vec<MaterialHandle>,
    default: Option<MaterialHandle>,
}

impl MaterialMap {
    fn resolve(&mut self, graph: &mut RenderGraph, index: Option<usize>) -> MaterialHandle {
        if let Some(handle) = index.and_then(|i| self.handles.get(i)) {
            return *handle;
        }
        *self
            .default
            .get_or_insert_with(|| graph.add_material(Material::default()))
    }
}

fn classify_error(e: gltf::Error) -> LoadError {
    match e {
        gltf::Error::Io(_)
        | gltf::Error::ExternalReferenceInSliceImport
        | gltf::Error::UnsupportedScheme => LoadError::Transport(format!("glTF buffer: {}", e)),
        other => LoadError::UnsupportedFormat(format!("glTF: {}", other)),
    }
}

/// Parse a glTF or GLB payload under a root node named `name`.
///
/// Only the default scene (or the first scene) is imported. Buffers must be
/// embedded: GLB binary chunk or `data:` URIs.
pub(crate) fn parse_gltf(name: &str, bytes: &[u8]) -> Result<RenderGraph, LoadError> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(classify_error)?;
    let buffers = gltf::import_buffers(&document, None, blob).map_err(classify_error)?;

    let mut graph = RenderGraph::new(name);
    let mut materials = MaterialMap {
        handles: document
            .materials()
            .map(|m| graph.add_material(convert_material(&m)))
            .collect(),
        default: None,
    };

    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        tracing::warn!("{} contains no scene", name);
        return Ok(graph);
    };

    let root = graph.root();
    for node in scene.nodes() {
        import_node(&mut graph, root, &node, &buffers, &mut materials)?;
    }
    Ok(graph)
}

fn import_node(
    graph: &mut RenderGraph,
    parent: NodeHandle,
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    materials: &mut MaterialMap,
) -> Result<(), LoadError> {
    let local = Mat4::from_cols_array_2d(&node.transform().matrix());
    let mesh = node.mesh();
    let name = node
        .name()
        .or_else(|| mesh.as_ref().and_then(|m| m.name()))
        .map(str::to_string);
    let handle = graph.add_node(parent, name, local)?;

    if let Some(mesh) = mesh {
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            match read_primitive(&primitive, buffers) {
                Some(data) => {
                    let material = materials.resolve(graph, primitive.material().index());
                    primitives.push((data, material));
                }
                None => tracing::debug!(
                    "Skipping primitive {} of mesh {} ({:?})",
                    primitive.index(),
                    mesh.index(),
                    primitive.mode()
                ),
            }
        }

        if primitives.len() == 1 {
            if let Some((data, material)) = primitives.pop() {
                graph.set_renderable(handle, data, material)?;
            }
        } else {
            // One unnamed child per primitive
            for (data, material) in primitives {
                let child = graph.add_node(handle, None, Mat4::IDENTITY)?;
                graph.set_renderable(child, data, material)?;
            }
        }
    }

    for child in node.children() {
        import_node(graph, handle, &child, buffers, materials)?;
    }
    Ok(())
}

/// Read a triangle primitive; point and line primitives yield `None`.
fn read_primitive(primitive: &gltf::Primitive, buffers: &[gltf::buffer::Data]) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|n| n.collect())
        .unwrap_or_default();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let indices = triangulate(primitive.mode(), indices)?;
    let mesh = MeshData::new(positions, normals, indices);
    if mesh.is_empty() {
        return None;
    }
    Some(mesh)
}

/// Expand strips and fans into a triangle list.
fn triangulate(mode: Mode, indices: Vec<u32>) -> Option<Vec<u32>> {
    match mode {
        Mode::Triangles => Some(indices),
        Mode::TriangleStrip => {
            let mut out = Vec::new();
            for i in 0..indices.len().saturating_sub(2) {
                // Alternate winding to keep faces consistently oriented
                if i % 2 == 0 {
                    out.extend_from_slice(&[indices[i], indices[i + 1], indices[i + 2]]);
                } else {
                    out.extend_from_slice(&[indices[i + 1], indices[i], indices[i + 2]]);
                }
            }
            Some(out)
        }
        Mode::TriangleFan => {
            let mut out = Vec::new();
            for i in 1..indices.len().saturating_sub(1) {
                out.extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
            }
            Some(out)
        }
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => None,
    }
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    Material {
        name: material.name().map(str::to_string),
        base_color: pbr.base_color_factor(),
        emissive: material.emissive_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        double_sided: material.double_sided(),
        wireframe: false,
    }
}
