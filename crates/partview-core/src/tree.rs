//! Scene tree: the UI-addressable index over a render graph.
//!
//! The tree mirrors the renderable sub-parts of a [`RenderGraph`]. Each
//! [`SceneNode`] holds the handle of the graph node it stands for; the graph
//! stays the owner of transforms, geometry and materials.

use std::collections::HashMap;

use crate::graph::{GraphError, NodeHandle, RenderGraph};

/// Label used for unnamed nodes carrying geometry.
pub const MESH_PLACEHOLDER: &str = "Mesh";
/// Label used for unnamed nodes without geometry.
pub const GROUP_PLACEHOLDER: &str = "Group";

/// Handle to a node in a [`SceneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneNodeId(u32);

impl SceneNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index entry for one graph node.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Graph node this entry stands for.
    pub identity: NodeHandle,
    /// Display name: asset name or a placeholder.
    pub name: String,
    /// Mirror of the graph node's visibility flag.
    pub visible: bool,
    /// True if the graph node carries geometry.
    pub has_geometry: bool,
    parent: Option<SceneNodeId>,
    children: Vec<SceneNodeId>,
}

impl SceneNode {
    pub fn parent(&self) -> Option<SceneNodeId> {
        self.parent
    }

    /// Children in document order.
    pub fn children(&self) -> &[SceneNodeId] {
        &self.children
    }
}

/// Errors raised by tree queries and updates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("Scene node not found: {0:?}")]
    NodeNotFound(SceneNodeId),
    #[error("Scene node {node:?} refers to missing graph node {identity}")]
    DanglingIdentity {
        node: SceneNodeId,
        identity: NodeHandle,
    },
    #[error("Graph node {0} is indexed more than once")]
    DuplicateIdentity(NodeHandle),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Ordered forest of [`SceneNode`]s over a render graph.
#[derive(Debug, Clone, Default)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
    roots: Vec<SceneNodeId>,
    by_identity: HashMap<NodeHandle, SceneNodeId>,
}

impl SceneTree {
    /// Index the children of the graph root.
    ///
    /// A graph node is included if it has a name, carries geometry, or has a
    /// descendant that is included. Pruned nodes stay in the graph.
    pub fn build(graph: &RenderGraph) -> Self {
        let mut tree = SceneTree::default();
        let Some(root) = graph.node(graph.root()) else {
            return tree;
        };
        for &child in root.children() {
            if let Some(id) = tree.index_node(graph, child) {
                tree.roots.push(id);
            }
        }
        tree
    }

    fn index_node(&mut self, graph: &RenderGraph, handle: NodeHandle) -> Option<SceneNodeId> {
        let node = graph.node(handle)?;

        let children: Vec<SceneNodeId> = node
            .children()
            .iter()
            .filter_map(|&child| self.index_node(graph, child))
            .collect();

        let has_geometry = node.has_geometry();
        if node.name().is_none() && !has_geometry && children.is_empty() {
            return None;
        }

        let name = match node.name() {
            Some(name) => name.to_string(),
            None if has_geometry => MESH_PLACEHOLDER.to_string(),
            None => GROUP_PLACEHOLDER.to_string(),
        };

        let id = SceneNodeId(self.nodes.len() as u32);
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(SceneNode {
            identity: handle,
            name,
            visible: node.visible,
            has_geometry,
            parent: None,
            children,
        });
        self.by_identity.insert(handle, id);
        Some(id)
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> &[SceneNodeId] {
        &self.roots
    }

    pub fn node(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Scene node indexing the given graph node, if it was not pruned.
    pub fn id_for(&self, identity: NodeHandle) -> Option<SceneNodeId> {
        self.by_identity.get(&identity).copied()
    }

    /// Depth-first walk of the forest in document order.
    pub fn iter_depth_first(&self) -> impl Iterator<Item = SceneNodeId> + '_ {
        let mut stack: Vec<SceneNodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
            Some(id)
        })
    }

    /// Ancestors of a node from the top-level node down to its parent.
    pub fn ancestors(&self, id: SceneNodeId) -> Vec<SceneNodeId> {
        let mut chain = Vec::new();
        let mut current = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).and_then(|n| n.parent);
        }
        chain.reverse();
        chain
    }

    /// Resolve a picked graph node to the scene node that represents it.
    ///
    /// Searches depth-first for a node whose identity is the hit itself or the
    /// hit's immediate parent, since geometry may sit one level below its
    /// indexed ancestor. The first match wins.
    pub fn find_for_hit(&self, graph: &RenderGraph, hit: NodeHandle) -> Option<SceneNodeId> {
        let hit_parent = graph.parent(hit);
        self.iter_depth_first().find(|&id| {
            let identity = self.nodes[id.index()].identity;
            identity == hit || Some(identity) == hit_parent
        })
    }

    /// Flip the visibility of a node and its graph counterpart.
    ///
    /// Returns the new visibility.
    pub fn toggle_visibility(
        &mut self,
        id: SceneNodeId,
        graph: &mut RenderGraph,
    ) -> Result<bool, TreeError> {
        let visible = !self.node(id).ok_or(TreeError::NodeNotFound(id))?.visible;
        self.set_visibility(id, graph, visible)?;
        Ok(visible)
    }

    /// Set the visibility of a node and its graph counterpart.
    pub fn set_visibility(
        &mut self,
        id: SceneNodeId,
        graph: &mut RenderGraph,
        visible: bool,
    ) -> Result<(), TreeError> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or(TreeError::NodeNotFound(id))?;
        graph.set_visible(node.identity, visible)?;
        node.visible = visible;
        Ok(())
    }

    /// Check that every identity resolves to exactly one live graph node.
    pub fn validate(&self, graph: &RenderGraph) -> Result<(), TreeError> {
        let mut seen = HashMap::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let id = SceneNodeId(index as u32);
            if !graph.contains(node.identity) {
                return Err(TreeError::DanglingIdentity {
                    node: id,
                    identity: node.identity,
                });
            }
            if seen.insert(node.identity, id).is_some() {
                return Err(TreeError::DuplicateIdentity(node.identity));
            }
        }
        Ok(())
    }
}
