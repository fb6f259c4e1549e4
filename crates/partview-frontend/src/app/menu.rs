//! Menu bar and open-document dialog

use partview_core::DocumentRef;

use crate::state::{AppAction, SharedAppState};

/// Render the menu bar and queue any triggered action
pub fn render_menu_bar(ctx: &egui::Context, app_state: &SharedAppState) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open File...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("3D models", &["glb", "gltf", "stl", "GLB", "GLTF", "STL"])
                        .add_filter("All files", &["*"])
                        .pick_file()
                    {
                        app_state
                            .lock()
                            .queue_action(AppAction::OpenDocument(DocumentRef::local(path)));
                    }
                    ui.close_menu();
                }
                if ui.button("Open Document...").clicked() {
                    app_state.lock().open_dialog = Some(String::new());
                    ui.close_menu();
                }
                let can_reload = app_state.lock().current_document.is_some();
                if ui
                    .add_enabled(can_reload, egui::Button::new("Reload"))
                    .clicked()
                {
                    app_state.lock().queue_action(AppAction::Reload);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                let mut state = app_state.lock();
                let display = state.viewer.display();
                let mut wireframe = display.wireframe;
                let mut show_grid = display.show_grid;
                let mut show_axes = display.show_axes;

                if ui.checkbox(&mut wireframe, "Wireframe").changed() {
                    state.queue_action(AppAction::ToggleWireframe);
                }
                if ui.checkbox(&mut show_grid, "Grid").changed() {
                    state.queue_action(AppAction::SetShowGrid(show_grid));
                }
                if ui.checkbox(&mut show_axes, "Axes").changed() {
                    state.queue_action(AppAction::SetShowAxes(show_axes));
                }
                ui.separator();
                if ui.button("Reset Camera").clicked() {
                    state.queue_action(AppAction::ResetCamera);
                    ui.close_menu();
                }
            });
        });
    });
}

/// Render the "Open Document" dialog if it is open
pub fn render_open_dialog(ctx: &egui::Context, app_state: &SharedAppState) {
    let mut state = app_state.lock();
    let Some(input) = state.open_dialog.as_mut() else {
        return;
    };

    let mut open = true;
    let mut submitted = false;
    egui::Window::new("Open Document")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label("Document id or file path:");
            let response = ui.text_edit_singleline(input);
            let entered =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Open").clicked() || entered {
                submitted = true;
            }
        });

    if submitted {
        let value = input.trim().to_string();
        state.open_dialog = None;
        if !value.is_empty() {
            state.queue_action(AppAction::OpenDocument(DocumentRef::parse(&value)));
        }
    } else if !open {
        state.open_dialog = None;
    }
}
