//! Main application

mod menu;
mod status_bar;

use std::sync::Arc;

use egui_dock::{DockArea, DockState, Style};
use parking_lot::Mutex;
use partview_core::{DocumentRef, DocumentSource, LoadError};
use partview_renderer::{RenderSurface, Viewer, ViewportSize};

use crate::config::{SharedConfig, UiConfig, UiTheme, create_shared_config};
use crate::document_service::DocumentService;
use crate::gpu::{GpuSurface, SharedViewportImage};
use crate::load_worker::LoadWorker;
use crate::panels::{AppTabViewer, PanelTab, Panels, default_dock_state};
use crate::scheduler::RepaintScheduler;
use crate::state::{AppAction, AppState, SharedAppState};

/// Errors that prevent the application from starting
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("wgpu renderer unavailable; partview needs eframe's wgpu backend")]
    NoWgpu,
}

/// Main application
pub struct PartviewApp {
    app_state: SharedAppState,
    config: SharedConfig,
    dock_state: DockState<PanelTab>,
    panels: Panels,
    loader: LoadWorker,
    shut_down: bool,
}

impl PartviewApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        initial: Option<DocumentRef>,
    ) -> Result<Self, StartupError> {
        let render_state = cc.wgpu_render_state.as_ref().ok_or(StartupError::NoWgpu)?;
        let viewport_image = SharedViewportImage::default();
        let surface = GpuSurface::new(render_state, viewport_image.clone());
        Ok(Self::with_surface(
            &cc.egui_ctx,
            create_shared_config(),
            Box::new(surface),
            viewport_image,
            initial,
        ))
    }

    fn with_surface(
        ctx: &egui::Context,
        config: SharedConfig,
        surface: Box<dyn RenderSurface>,
        viewport_image: SharedViewportImage,
        initial: Option<DocumentRef>,
    ) -> Self {
        let app_config = config.read().config().clone();
        apply_ui_config(ctx, &app_config.ui);

        let mut viewer = Viewer::new(
            app_config.renderer.clone(),
            surface,
            Box::new(RepaintScheduler::for_context(ctx.clone())),
        );
        if let Err(e) = viewer.start(ViewportSize::default()) {
            tracing::error!("Failed to start rendering: {}", e);
        }

        let source: Arc<dyn DocumentSource> = Arc::new(DocumentService::new(&app_config.api));
        let repaint_ctx = ctx.clone();
        let loader = LoadWorker::new(source, Arc::new(move || repaint_ctx.request_repaint()));

        let mut state = AppState::new(viewer, viewport_image);
        if let Some(reference) = initial {
            state.queue_action(AppAction::OpenDocument(reference));
        }

        Self {
            app_state: Arc::new(Mutex::new(state)),
            config,
            dock_state: default_dock_state(),
            panels: Panels::new(),
            loader,
            shut_down: false,
        }
    }

    /// Hand finished loads to the viewer; stale ones are dropped there.
    fn apply_load_results(&mut self) {
        let results = self.loader.drain();
        if results.is_empty() {
            return;
        }
        let mut state = self.app_state.lock();
        for result in results {
            state.viewer.complete_load(&result.ticket, result.result);
        }
    }

    fn process_actions(&mut self) {
        let actions = self.app_state.lock().take_actions();
        for action in actions {
            tracing::debug!("Action: {}", action.description());
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: AppAction) {
        let mut state = self.app_state.lock();
        let result = match action {
            AppAction::OpenDocument(reference) => {
                drop(state);
                self.open_document(reference);
                return;
            }
            AppAction::Reload => {
                let Some(reference) = state.current_document.clone() else {
                    return;
                };
                drop(state);
                self.open_document(reference);
                return;
            }
            AppAction::SelectNode(id) => state.viewer.select_node(id),
            AppAction::ToggleVisibility(id) => state.viewer.toggle_visibility(id).map(|_| ()),
            AppAction::ResetCamera => {
                state.viewer.reset_camera();
                Ok(())
            }
            AppAction::ToggleWireframe => {
                state.viewer.toggle_wireframe();
                Ok(())
            }
            AppAction::SetShowGrid(show) => {
                state.viewer.display_mut().show_grid = show;
                self.config.write().config_mut().renderer.display.show_grid = show;
                Ok(())
            }
            AppAction::SetShowAxes(show) => {
                state.viewer.display_mut().show_axes = show;
                self.config.write().config_mut().renderer.display.show_axes = show;
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!("Action failed: {}", e);
        }
    }

    fn open_document(&self, reference: DocumentRef) {
        let mut state = self.app_state.lock();
        state.current_document = Some(reference.clone());
        let ticket = state.viewer.begin_load(reference);
        if let Err(e) = self.loader.spawn(ticket.clone()) {
            tracing::error!("Failed to start loader thread: {}", e);
            state.viewer.complete_load(
                &ticket,
                Err(LoadError::Transport(format!("could not start loader: {}", e))),
            );
        }
    }

    fn tick(&mut self) {
        let mut state = self.app_state.lock();
        if let Err(e) = state.viewer.tick() {
            tracing::error!("Render tick failed: {}", e);
        }
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.app_state.lock().viewer.shutdown();
        if let Err(e) = self.config.write().save() {
            tracing::error!("Failed to save config: {}", e);
        }
    }

    fn show(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.shutdown();
            return;
        }

        self.apply_load_results();
        self.process_actions();

        menu::render_menu_bar(ctx, &self.app_state);
        status_bar::render_status_bar(ctx, &self.app_state);
        menu::render_open_dialog(ctx, &self.app_state);

        let mut tab_viewer = AppTabViewer {
            panels: &mut self.panels,
            app_state: &self.app_state,
        };
        DockArea::new(&mut self.dock_state)
            .style(Style::from_egui(ctx.style().as_ref()))
            .show_close_buttons(false)
            .show(ctx, &mut tab_viewer);

        // Render after the panels so resizes and input land in this frame
        self.tick();
    }
}

impl eframe::App for PartviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }

    fn on_exit(&mut self) {
        self.shutdown();
    }
}

fn apply_ui_config(ctx: &egui::Context, ui: &UiConfig) {
    match ui.theme {
        UiTheme::Dark => ctx.set_visuals(egui::Visuals::dark()),
        UiTheme::Light => ctx.set_visuals(egui::Visuals::light()),
    }
    if ui.font_size > 0.0 {
        ctx.set_zoom_factor(ui.font_size);
    }
}

#[cfg(test)]
mod tests {
    use partview_renderer::{Frame, LoopState, SurfaceError};

    use super::*;
    use crate::config::ConfigManager;

    #[derive(Debug, Default)]
    struct SurfaceLog {
        resized: Vec<ViewportSize>,
        rendered: Vec<ViewportSize>,
        released: usize,
    }

    struct RecordingSurface(Arc<Mutex<SurfaceLog>>);

    impl RenderSurface for RecordingSurface {
        fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
            self.0.lock().resized.push(size);
            Ok(())
        }

        fn render(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
            self.0.lock().rendered.push(frame.viewport);
            Ok(())
        }

        fn release(&mut self) {
            self.0.lock().released += 1;
        }
    }

    fn test_app(ctx: &egui::Context, name: &str) -> (PartviewApp, Arc<Mutex<SurfaceLog>>) {
        // Nothing is marked dirty, so shutdown never writes this file
        let path = std::env::temp_dir()
            .join(format!("partview-app-{}-{}", name, std::process::id()))
            .join("config.ron");
        let config = Arc::new(parking_lot::RwLock::new(ConfigManager::with_path(path)));
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let app = PartviewApp::with_surface(
            ctx,
            config,
            Box::new(RecordingSurface(log.clone())),
            SharedViewportImage::default(),
            None,
        );
        (app, log)
    }

    fn screen_input() -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(1024.0, 768.0),
            )),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_frame_renders_at_viewport_size() {
        let ctx = egui::Context::default();
        let (mut app, log) = test_app(&ctx, "first-frame");

        let _ = ctx.run(screen_input(), |ctx| app.show(ctx));

        let log = log.lock();
        let rendered = *log.rendered.last().expect("a frame was rendered");
        assert!(!rendered.is_empty());
        assert_eq!(log.resized.last(), Some(&rendered));
    }

    #[test]
    fn test_on_exit_shuts_down_once() {
        let ctx = egui::Context::default();
        let (mut app, log) = test_app(&ctx, "on-exit");

        eframe::App::on_exit(&mut app);
        eframe::App::on_exit(&mut app);

        assert_eq!(log.lock().released, 1);
        assert_eq!(app.app_state.lock().viewer.loop_state(), LoopState::Stopped);
    }
}
