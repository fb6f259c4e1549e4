//! Selection and highlight state machine.
//!
//! Selecting a scene node swaps the material of every renderable below it for
//! a shared highlight material and remembers the original handles. Every
//! transition first restores all remembered materials, so the record always
//! covers exactly the renderables of the current selection.

use std::collections::HashMap;

use partview_core::{Material, MaterialHandle, NodeHandle, RenderGraph, SceneNodeId, SceneTree};

/// Selection errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("Scene node not found: {0:?}")]
    NodeNotFound(SceneNodeId),
    #[error("Highlight material is not installed in the current graph")]
    NotInstalled,
}

/// Current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selected(SceneNodeId),
}

/// Tracks the selected node and the materials it displaced.
#[derive(Debug, Default)]
pub struct Highlighter {
    state: SelectionState,
    /// Renderable -> material it had before highlighting
    records: HashMap<NodeHandle, MaterialHandle>,
    highlight_material: Option<MaterialHandle>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for a freshly loaded graph.
    ///
    /// Adds the highlight material to the graph's library and drops any state
    /// tied to the previous graph without restoring it.
    pub fn install(&mut self, graph: &mut RenderGraph, highlight: Material) {
        self.reset();
        self.highlight_material = Some(graph.add_material(highlight));
    }

    /// Forget all state, e.g. when the graph is discarded.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
        self.records.clear();
        self.highlight_material = None;
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected(&self) -> Option<SceneNodeId> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Selected(id) => Some(id),
        }
    }

    /// Renderables currently showing the highlight, with their original materials.
    pub fn records(&self) -> &HashMap<NodeHandle, MaterialHandle> {
        &self.records
    }

    pub fn highlight_material(&self) -> Option<MaterialHandle> {
        self.highlight_material
    }

    /// Transition to `target`, or back to idle with `None`.
    ///
    /// On error nothing changes.
    pub fn select(
        &mut self,
        graph: &mut RenderGraph,
        tree: &SceneTree,
        target: Option<SceneNodeId>,
    ) -> Result<(), SelectionError> {
        let Some(highlight) = self.highlight_material else {
            return Err(SelectionError::NotInstalled);
        };
        let identity = match target {
            Some(id) => Some(tree.node(id).ok_or(SelectionError::NodeNotFound(id))?.identity),
            None => None,
        };

        self.restore(graph);

        let (Some(id), Some(identity)) = (target, identity) else {
            self.state = SelectionState::Idle;
            return Ok(());
        };
        self.state = SelectionState::Selected(id);

        for renderable in graph.renderables_in_subtree(identity) {
            if let Some(original) = graph.swap_material(renderable, highlight) {
                self.records.insert(renderable, original);
            }
        }
        tracing::debug!(
            "Selected {:?} (graph node {}), {} renderables highlighted",
            id,
            identity,
            self.records.len()
        );
        Ok(())
    }

    /// Put every recorded material back and empty the record.
    fn restore(&mut self, graph: &mut RenderGraph) {
        for (renderable, original) in self.records.drain() {
            if graph.swap_material(renderable, original).is_none() {
                tracing::warn!("Highlighted node {} no longer carries geometry", renderable);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::Mat4;
    use partview_core::MeshData;

    use super::*;

    fn triangle() -> MeshData {
        MeshData::from_triangle_soup(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    struct Fixture {
        graph: RenderGraph,
        tree: SceneTree,
        a: NodeHandle,
        a_parts: Vec<NodeHandle>,
        b: NodeHandle,
        b_parts: Vec<NodeHandle>,
    }

    /// Two named assemblies, each with two renderables using distinct materials.
    fn fixture() -> Fixture {
        let mut graph = RenderGraph::new("asset");
        let steel = graph.add_material(Material::new([0.6, 0.6, 0.6, 1.0]).with_name("Steel"));
        let rubber = graph.add_material(Material::new([0.1, 0.1, 0.1, 1.0]).with_name("Rubber"));

        let root = graph.root();
        let a = graph.add_node(root, Some("A".into()), Mat4::IDENTITY).unwrap();
        let b = graph.add_node(root, Some("B".into()), Mat4::IDENTITY).unwrap();
        let mut a_parts = Vec::new();
        let mut b_parts = Vec::new();
        for (parent, parts) in [(a, &mut a_parts), (b, &mut b_parts)] {
            for material in [steel, rubber] {
                let node = graph.add_node(parent, None, Mat4::IDENTITY).unwrap();
                graph.set_renderable(node, triangle(), material).unwrap();
                parts.push(node);
            }
        }

        let tree = SceneTree::build(&graph);
        Fixture {
            graph,
            tree,
            a,
            a_parts,
            b,
            b_parts,
        }
    }

    fn materials(graph: &RenderGraph) -> Vec<Option<MaterialHandle>> {
        graph.iter().map(|(h, _)| graph.material_of(h)).collect()
    }

    fn highlight() -> Material {
        Material::from_hex(0xffaa00, 0x553300)
    }

    #[test]
    fn test_select_before_install_fails() {
        let mut f = fixture();
        let mut highlighter = Highlighter::new();
        let id = f.tree.id_for(f.a).unwrap();
        assert_eq!(
            highlighter.select(&mut f.graph, &f.tree, Some(id)),
            Err(SelectionError::NotInstalled)
        );
    }

    #[test]
    fn test_switch_selection_restores_previous() {
        let mut f = fixture();
        let original = materials(&f.graph);
        let mut highlighter = Highlighter::new();
        highlighter.install(&mut f.graph, highlight());
        let highlight = highlighter.highlight_material().unwrap();

        let a_id = f.tree.id_for(f.a).unwrap();
        let b_id = f.tree.id_for(f.b).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();
        for part in &f.a_parts {
            assert_eq!(f.graph.material_of(*part), Some(highlight));
        }

        highlighter.select(&mut f.graph, &f.tree, Some(b_id)).unwrap();
        assert_eq!(highlighter.selected(), Some(b_id));

        let recorded: HashSet<NodeHandle> = highlighter.records().keys().copied().collect();
        let expected: HashSet<NodeHandle> = f.b_parts.iter().copied().collect();
        assert_eq!(recorded, expected);

        for part in &f.a_parts {
            assert_eq!(f.graph.material_of(*part), original[part.index()]);
        }
        for part in &f.b_parts {
            assert_eq!(highlighter.records()[part], original[part.index()].unwrap());
        }
    }

    #[test]
    fn test_select_then_deselect_is_identity() {
        let mut f = fixture();
        let mut highlighter = Highlighter::new();
        highlighter.install(&mut f.graph, highlight());
        let before = materials(&f.graph);

        let a_id = f.tree.id_for(f.a).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();
        highlighter.select(&mut f.graph, &f.tree, None).unwrap();

        assert_eq!(materials(&f.graph), before);
        assert!(highlighter.records().is_empty());
        assert_eq!(highlighter.state(), SelectionState::Idle);
    }

    #[test]
    fn test_reselect_same_node_is_stable() {
        let mut f = fixture();
        let original = materials(&f.graph);
        let mut highlighter = Highlighter::new();
        highlighter.install(&mut f.graph, highlight());

        let a_id = f.tree.id_for(f.a).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();
        // Records must still point at the real originals, not the highlight
        for part in &f.a_parts {
            assert_eq!(highlighter.records()[part], original[part.index()].unwrap());
        }
    }

    #[test]
    fn test_hidden_selection_still_restored() {
        let mut f = fixture();
        let original = materials(&f.graph);
        let mut highlighter = Highlighter::new();
        highlighter.install(&mut f.graph, highlight());

        let a_id = f.tree.id_for(f.a).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();
        f.tree.toggle_visibility(a_id, &mut f.graph).unwrap();
        highlighter.select(&mut f.graph, &f.tree, None).unwrap();

        for part in &f.a_parts {
            assert_eq!(f.graph.material_of(*part), original[part.index()]);
        }
    }

    #[test]
    fn test_unknown_node_leaves_state() {
        let mut f = fixture();
        let mut highlighter = Highlighter::new();
        highlighter.install(&mut f.graph, highlight());
        let a_id = f.tree.id_for(f.a).unwrap();
        highlighter.select(&mut f.graph, &f.tree, Some(a_id)).unwrap();

        let other_tree = SceneTree::default();
        let err = highlighter.select(&mut f.graph, &other_tree, Some(a_id));
        assert_eq!(err, Err(SelectionError::NodeNotFound(a_id)));
        assert_eq!(highlighter.selected(), Some(a_id));
        assert_eq!(highlighter.records().len(), 2);
    }
}
