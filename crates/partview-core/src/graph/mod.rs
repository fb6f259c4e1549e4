//! Render graph: the positioned node hierarchy of a loaded asset.
//!
//! Nodes live in an arena and are addressed by [`NodeHandle`]. Nodes are never
//! removed while an asset is loaded, so a handle handed out by the graph stays
//! valid for the lifetime of the graph. A parent is always inserted before its
//! children, which lets world transforms be computed in a single forward pass.

mod traversal;

pub use traversal::Descendants;

use std::fmt;

use glam::Mat4;

use crate::bounds::BoundingBox;
use crate::material::{Material, MaterialHandle, MaterialLibrary};
use crate::mesh::MeshData;

/// Stable handle to a node in a [`RenderGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u32);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry payload of a node: one mesh drawn with one material.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub mesh: MeshData,
    pub material: MaterialHandle,
}

/// A positioned node in the render graph.
#[derive(Debug, Clone)]
pub struct RenderNode {
    /// Name from the asset metadata, if any.
    pub name: Option<String>,
    /// Transform relative to the parent node.
    pub local: Mat4,
    /// Visibility of this node; hidden nodes hide their whole subtree.
    pub visible: bool,
    pub renderable: Option<Renderable>,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl RenderNode {
    fn new(name: Option<String>, local: Mat4, parent: Option<NodeHandle>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()),
            local,
            visible: true,
            renderable: None,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Children in document order.
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn has_geometry(&self) -> bool {
        self.renderable.is_some()
    }

    /// Non-empty asset name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Errors raised by graph mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeHandle),
    #[error("Material not found in library: {0:?}")]
    MaterialNotFound(MaterialHandle),
}

/// Full node hierarchy of a loaded asset, rooted at one top-level node.
#[derive(Debug, Clone)]
pub struct RenderGraph {
    nodes: Vec<RenderNode>,
    materials: MaterialLibrary,
}

impl RenderGraph {
    /// Creates a graph containing only a root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            nodes: vec![RenderNode::new(Some(root_name.into()), Mat4::IDENTITY, None)],
            materials: MaterialLibrary::new(),
        }
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle(0)
    }

    /// Number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A graph always has a root, so it is "empty" when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        handle.index() < self.nodes.len()
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&RenderNode> {
        self.nodes.get(handle.index())
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut RenderNode> {
        self.nodes.get_mut(handle.index())
    }

    /// Iterate over all nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &RenderNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeHandle(i as u32), n))
    }

    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut MaterialLibrary {
        &mut self.materials
    }

    /// Adds a material to the graph's library.
    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.add(material)
    }

    /// Appends a child node under `parent`.
    pub fn add_node(
        &mut self,
        parent: NodeHandle,
        name: Option<String>,
        local: Mat4,
    ) -> Result<NodeHandle, GraphError> {
        if !self.contains(parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let handle = NodeHandle(self.nodes.len() as u32);
        self.nodes.push(RenderNode::new(name, local, Some(parent)));
        self.nodes[parent.index()].children.push(handle);
        Ok(handle)
    }

    /// Attaches geometry to a node, replacing any previous payload.
    pub fn set_renderable(
        &mut self,
        handle: NodeHandle,
        mesh: MeshData,
        material: MaterialHandle,
    ) -> Result<(), GraphError> {
        if !self.materials.contains(material) {
            return Err(GraphError::MaterialNotFound(material));
        }
        let node = self
            .node_mut(handle)
            .ok_or(GraphError::NodeNotFound(handle))?;
        node.renderable = Some(Renderable { mesh, material });
        Ok(())
    }

    /// Swaps the material of a renderable node, returning the previous one.
    ///
    /// Returns `None` if the node does not exist or carries no geometry.
    pub fn swap_material(
        &mut self,
        handle: NodeHandle,
        material: MaterialHandle,
    ) -> Option<MaterialHandle> {
        let renderable = self.nodes.get_mut(handle.index())?.renderable.as_mut()?;
        Some(std::mem::replace(&mut renderable.material, material))
    }

    /// Current material of a renderable node.
    pub fn material_of(&self, handle: NodeHandle) -> Option<MaterialHandle> {
        self.node(handle)?.renderable.as_ref().map(|r| r.material)
    }

    pub fn parent(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.node(handle)?.parent
    }

    pub fn set_visible(&mut self, handle: NodeHandle, visible: bool) -> Result<(), GraphError> {
        let node = self
            .node_mut(handle)
            .ok_or(GraphError::NodeNotFound(handle))?;
        node.visible = visible;
        Ok(())
    }

    /// True if the node and all of its ancestors are visible.
    pub fn is_effectively_visible(&self, handle: NodeHandle) -> bool {
        let mut current = Some(handle);
        while let Some(id) = current {
            match self.node(id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// World transform of a node (product of local transforms from the root).
    pub fn world_transform(&self, handle: NodeHandle) -> Mat4 {
        let mut transform = Mat4::IDENTITY;
        let mut current = Some(handle);
        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                break;
            };
            transform = node.local * transform;
            current = node.parent;
        }
        transform
    }

    /// World transforms of every node, indexed by `NodeHandle::index`.
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut transforms: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let world = match node.parent {
                Some(parent) => transforms[parent.index()] * node.local,
                None => node.local,
            };
            transforms.push(world);
        }
        transforms
    }

    /// Effective visibility of every node, indexed by `NodeHandle::index`.
    pub fn effective_visibility(&self) -> Vec<bool> {
        let mut visible: Vec<bool> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent_visible = node.parent.map(|p| visible[p.index()]).unwrap_or(true);
            visible.push(parent_visible && node.visible);
        }
        visible
    }

    /// Pre-order walk of a subtree, starting with `handle` itself.
    pub fn descendants(&self, handle: NodeHandle) -> Descendants<'_> {
        Descendants::new(self, handle)
    }

    /// Renderable nodes in the subtree rooted at `handle`, in pre-order.
    pub fn renderables_in_subtree(&self, handle: NodeHandle) -> Vec<NodeHandle> {
        self.descendants(handle)
            .filter(|h| self.nodes[h.index()].renderable.is_some())
            .collect()
    }

    /// Number of renderable nodes in the whole graph.
    pub fn renderable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.renderable.is_some()).count()
    }

    /// World-space bounds of every mesh in the subtree rooted at `handle`.
    ///
    /// Hidden nodes are included; visibility does not change an object's extent.
    pub fn subtree_bounds(&self, handle: NodeHandle) -> BoundingBox {
        if !self.contains(handle) {
            return BoundingBox::EMPTY;
        }
        let parent_world = self
            .parent(handle)
            .map(|p| self.world_transform(p))
            .unwrap_or(Mat4::IDENTITY);
        let mut bounds = BoundingBox::EMPTY;
        self.accumulate_bounds(handle, parent_world, &mut bounds);
        bounds
    }

    fn accumulate_bounds(&self, handle: NodeHandle, parent_world: Mat4, bounds: &mut BoundingBox) {
        let node = &self.nodes[handle.index()];
        let world = parent_world * node.local;
        if let Some(renderable) = &node.renderable {
            *bounds = bounds.union(&renderable.mesh.bounds().transform(&world));
        }
        for &child in &node.children {
            self.accumulate_bounds(child, world, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_triangle() -> MeshData {
        MeshData::from_triangle_soup(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    #[test]
    fn test_add_node_requires_parent() {
        let mut graph = RenderGraph::new("root");
        let result = graph.add_node(NodeHandle(42), None, Mat4::IDENTITY);
        assert_eq!(result, Err(GraphError::NodeNotFound(NodeHandle(42))));
    }

    #[test]
    fn test_empty_names_are_dropped() {
        let mut graph = RenderGraph::new("root");
        let node = graph
            .add_node(graph.root(), Some(String::new()), Mat4::IDENTITY)
            .unwrap();
        assert_eq!(graph.node(node).unwrap().name(), None);
    }

    #[test]
    fn test_world_transform_chain() {
        let mut graph = RenderGraph::new("root");
        let a = graph
            .add_node(graph.root(), None, Mat4::from_translation(Vec3::X))
            .unwrap();
        let b = graph
            .add_node(a, None, Mat4::from_translation(Vec3::Y))
            .unwrap();

        let world = graph.world_transform(b);
        assert_eq!(world.transform_point3(Vec3::ZERO), Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(graph.world_transforms()[b.index()], world);
    }

    #[test]
    fn test_subtree_bounds_in_world_space() {
        let mut graph = RenderGraph::new("root");
        let material = graph.add_material(Material::default());
        let group = graph
            .add_node(graph.root(), None, Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();
        let mesh = graph.add_node(group, None, Mat4::IDENTITY).unwrap();
        graph.set_renderable(mesh, unit_triangle(), material).unwrap();

        let bounds = graph.subtree_bounds(group);
        assert_eq!(bounds.min, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 0.0));
        assert_eq!(graph.subtree_bounds(graph.root()), bounds);
    }

    #[test]
    fn test_hidden_ancestor_hides_descendants() {
        let mut graph = RenderGraph::new("root");
        let a = graph.add_node(graph.root(), None, Mat4::IDENTITY).unwrap();
        let b = graph.add_node(a, None, Mat4::IDENTITY).unwrap();
        graph.set_visible(a, false).unwrap();
        assert!(!graph.is_effectively_visible(b));
        assert!(graph.node(b).unwrap().visible);
        assert_eq!(graph.effective_visibility(), vec![true, false, false]);
    }

    #[test]
    fn test_swap_material_returns_previous() {
        let mut graph = RenderGraph::new("root");
        let original = graph.add_material(Material::default());
        let other = graph.add_material(Material::new([1.0, 0.0, 0.0, 1.0]));
        let mesh = graph.add_node(graph.root(), None, Mat4::IDENTITY).unwrap();
        graph.set_renderable(mesh, unit_triangle(), original).unwrap();

        assert_eq!(graph.swap_material(mesh, other), Some(original));
        assert_eq!(graph.material_of(mesh), Some(other));
        assert_eq!(graph.swap_material(graph.root(), other), None);
    }
}
