//! Subtree traversal

use super::{NodeHandle, RenderGraph};

/// Pre-order iterator over a subtree, children visited in document order.
pub struct Descendants<'a> {
    graph: &'a RenderGraph,
    stack: Vec<NodeHandle>,
}

impl<'a> Descendants<'a> {
    pub(super) fn new(graph: &'a RenderGraph, start: NodeHandle) -> Self {
        let stack = if graph.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Self { graph, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeHandle;

    fn next(&mut self) -> Option<NodeHandle> {
        let handle = self.stack.pop()?;
        if let Some(node) = self.graph.node(handle) {
            // Reverse so the first child is popped first
            self.stack.extend(node.children().iter().rev().copied());
        }
        Some(handle)
    }
}
