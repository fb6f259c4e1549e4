//! Hierarchy panel - tree view of the loaded model

use partview_core::{SceneNodeId, SceneTree};

use crate::panels::Panel;
use crate::state::{AppAction, SharedAppState};

/// Hierarchy panel showing the scene node tree
pub struct HierarchyPanel;

impl HierarchyPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HierarchyPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for HierarchyPanel {
    fn name(&self) -> &str {
        "Hierarchy"
    }

    fn ui(&mut self, ui: &mut egui::Ui, app_state: &SharedAppState) {
        let mut actions = Vec::new();
        {
            let state = app_state.lock();
            let viewer = &state.viewer;

            ui.heading("Model Tree");
            ui.separator();

            let Some(tree) = viewer.tree() else {
                if viewer.is_loading() {
                    ui.weak("Loading...");
                } else {
                    ui.weak("No model loaded.\nUse File > Open to load a document.");
                }
                return;
            };

            if tree.is_empty() {
                ui.weak("The model has no named parts.");
                return;
            }

            let selected = viewer.selected();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for &root in tree.roots() {
                    render_node(ui, tree, root, selected, &mut actions);
                }
            });
        }

        let mut state = app_state.lock();
        for action in actions {
            state.queue_action(action);
        }
    }
}

fn render_node(
    ui: &mut egui::Ui,
    tree: &SceneTree,
    id: SceneNodeId,
    selected: Option<SceneNodeId>,
    actions: &mut Vec<AppAction>,
) {
    let Some(node) = tree.node(id) else {
        return;
    };

    let row = |ui: &mut egui::Ui, actions: &mut Vec<AppAction>| {
        let eye = if node.visible { "👁" } else { "—" };
        if ui
            .small_button(eye)
            .on_hover_text(if node.visible { "Hide" } else { "Show" })
            .clicked()
        {
            actions.push(AppAction::ToggleVisibility(id));
        }

        let icon = if node.has_geometry { "◆" } else { "▣" };
        let label = format!("{} {}", icon, node.name);
        let text = if node.visible {
            egui::RichText::new(label)
        } else {
            egui::RichText::new(label).weak()
        };
        if ui.selectable_label(selected == Some(id), text).clicked() {
            actions.push(AppAction::SelectNode(Some(id)));
        }
    };

    if node.children().is_empty() {
        ui.horizontal(|ui| {
            // Line up with the collapse toggles of sibling groups
            ui.add_space(ui.spacing().indent);
            row(ui, actions);
        });
        return;
    }

    let state_id = ui.make_persistent_id(("scene_node", id.index()));
    egui::collapsing_header::CollapsingState::load_with_default_open(ui.ctx(), state_id, true)
        .show_header(ui, |ui| row(ui, actions))
        .body(|ui| {
            for &child in node.children() {
                render_node(ui, tree, child, selected, actions);
            }
        });
}
