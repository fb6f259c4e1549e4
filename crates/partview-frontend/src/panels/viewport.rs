//! 3D viewport panel

use glam::Vec2;
use partview_renderer::{ViewportSize, pointer_to_ndc};

use crate::panels::Panel;
use crate::state::SharedAppState;

/// Scroll points per zoom step
const SCROLL_PER_ZOOM_STEP: f32 = 50.0;

/// Viewport panel: forwards input to the viewer and paints the last frame
pub struct ViewportPanel;

impl ViewportPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ViewportPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Panel for ViewportPanel {
    fn name(&self) -> &str {
        "Viewport"
    }

    fn ui(&mut self, ui: &mut egui::Ui, app_state: &SharedAppState) {
        let rect = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());
        let mut state = app_state.lock();

        // Render target in physical pixels
        let pixels = rect.size() * ui.ctx().pixels_per_point();
        if let Err(e) = state
            .viewer
            .resize(ViewportSize::from_f32(pixels.x, pixels.y))
        {
            tracing::error!("Viewport resize failed: {}", e);
        }

        // Camera input
        if response.dragged_by(egui::PointerButton::Primary) {
            let delta = response.drag_delta();
            state.viewer.orbit(delta.x, delta.y);
        }
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            let delta = response.drag_delta();
            state.viewer.pan(delta.x, delta.y);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                state.viewer.zoom(scroll / SCROLL_PER_ZOOM_STEP);
            }
        }

        // Picking
        if response.clicked()
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(ndc) = pointer_to_ndc(
                Vec2::new(pointer.x, pointer.y),
                Vec2::new(rect.min.x, rect.min.y),
                Vec2::new(rect.width(), rect.height()),
            )
        {
            match state.viewer.click(ndc) {
                Ok(Some(id)) => tracing::debug!("Picked scene node {:?}", id),
                Ok(None) => tracing::debug!("Click hit nothing"),
                Err(e) => tracing::warn!("Pick failed: {}", e),
            }
        }

        // Last rendered frame
        let painter = ui.painter_at(rect);
        if let Some(texture) = state.viewport_image.lock().texture {
            painter.image(
                texture,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        // Overlay text
        let status = state.viewer.status();
        let overlay = if status.loading {
            Some("Loading model...".to_string())
        } else if let Some(error) = &status.error {
            Some(error.clone())
        } else if state.viewer.model().is_none() {
            Some("Open a document to view it".to_string())
        } else {
            None
        };
        if let Some(text) = overlay {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(200),
            );
        }

        if state.viewer.needs_redraw() {
            ui.ctx().request_repaint();
        }
    }
}
