//! Status bar

use partview_renderer::LoopState;

use crate::state::SharedAppState;

pub fn render_status_bar(ctx: &egui::Context, app_state: &SharedAppState) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        let state = app_state.lock();
        let viewer = &state.viewer;
        let status = viewer.status();

        ui.horizontal(|ui| {
            if status.loading {
                ui.spinner();
                ui.label("Loading...");
            } else if let Some(error) = &status.error {
                ui.colored_label(ui.visuals().error_fg_color, error);
            } else if let Some(name) = &status.document_name {
                ui.label(name);
            } else {
                ui.weak("No document");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match viewer.loop_state() {
                    LoopState::Failed => {
                        ui.colored_label(ui.visuals().error_fg_color, "Rendering stopped");
                    }
                    LoopState::Running => {
                        let image = state.viewport_image.lock();
                        ui.weak(format!(
                            "{} triangles | {} edges | {}x{}",
                            image.triangles, image.edges, image.size.width, image.size.height
                        ));
                    }
                    LoopState::Idle | LoopState::Stopped => {}
                }
            });
        });
    });
}
