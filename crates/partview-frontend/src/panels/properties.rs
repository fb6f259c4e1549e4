//! Properties panel

use partview_core::{MaterialHandle, NodeHandle};
use partview_renderer::LoadedModel;

use crate::panels::Panel;
use crate::state::{AppAction, SharedAppState};

/// Properties panel showing the selected node
pub struct PropertiesPanel;

impl PropertiesPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PropertiesPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for PropertiesPanel {
    fn name(&self) -> &str {
        "Properties"
    }

    fn ui(&mut self, ui: &mut egui::Ui, app_state: &SharedAppState) {
        let mut clear_selection = false;
        {
            let state = app_state.lock();
            let viewer = &state.viewer;

            let Some(model) = viewer.model() else {
                ui.weak("No model loaded");
                return;
            };

            ui.heading("Document");
            ui.separator();
            ui.label(format!("Name: {}", model.name));
            ui.label(format!("Nodes: {}", model.graph.len()));
            ui.label(format!("Meshes: {}", model.graph.renderable_count()));
            ui.label(format!("Materials: {}", model.graph.materials().len()));

            ui.separator();

            let Some(selected) = viewer.selected() else {
                ui.weak("No part selected");
                return;
            };
            let Some(node) = model.tree.node(selected) else {
                ui.weak("Selected part not found");
                return;
            };

            ui.heading("Part");
            ui.separator();
            ui.label(format!("Name: {}", node.name));
            ui.label(format!("Visible: {}", if node.visible { "yes" } else { "no" }));

            let renderables = model.graph.renderables_in_subtree(node.identity);
            let triangles: usize = renderables
                .iter()
                .filter_map(|h| model.graph.node(*h)?.renderable.as_ref())
                .map(|r| r.mesh.triangle_count())
                .sum();
            ui.label(format!("Meshes: {}", renderables.len()));
            ui.label(format!("Triangles: {}", triangles));

            let bounds = model.graph.subtree_bounds(node.identity);
            if !bounds.is_empty() {
                let size = bounds.size();
                ui.label(format!("Size: {:.3} x {:.3} x {:.3}", size.x, size.y, size.z));
                let center = bounds.center();
                ui.label(format!(
                    "Center: ({:.3}, {:.3}, {:.3})",
                    center.x, center.y, center.z
                ));
            }

            ui.collapsing("Materials", |ui| {
                let highlighted = viewer.highlighter().records();
                let mut names: Vec<String> = renderables
                    .iter()
                    .filter_map(|h| original_material(model, highlighted.get(h).copied(), *h))
                    .filter_map(|m| model.graph.materials().get(m))
                    .map(|m| m.name.clone().unwrap_or_else(|| "(unnamed)".to_string()))
                    .collect();
                names.sort();
                names.dedup();
                for name in names {
                    ui.label(name);
                }
            });

            ui.separator();
            clear_selection = ui.button("Clear selection").clicked();
        }

        if clear_selection {
            app_state.lock().queue_action(AppAction::SelectNode(None));
        }
    }
}

/// Material a renderable shows when not highlighted.
fn original_material(
    model: &LoadedModel,
    recorded: Option<MaterialHandle>,
    handle: NodeHandle,
) -> Option<MaterialHandle> {
    recorded.or_else(|| model.graph.material_of(handle))
}
