//! Application state shared between the app and its panels

use std::sync::Arc;

use parking_lot::Mutex;
use partview_core::{DocumentRef, SceneNodeId};
use partview_renderer::Viewer;

use crate::gpu::SharedViewportImage;

/// Actions queued by the UI and applied once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Load a document, replacing the current one
    OpenDocument(DocumentRef),
    /// Load the current document again
    Reload,
    /// Select a scene node, or clear the selection
    SelectNode(Option<SceneNodeId>),
    /// Flip the visibility of a scene node
    ToggleVisibility(SceneNodeId),
    ResetCamera,
    ToggleWireframe,
    SetShowGrid(bool),
    SetShowAxes(bool),
}

impl AppAction {
    /// Get a description of the action for display
    pub fn description(&self) -> &'static str {
        match self {
            AppAction::OpenDocument(_) => "Open Document",
            AppAction::Reload => "Reload",
            AppAction::SelectNode(_) => "Select Node",
            AppAction::ToggleVisibility(_) => "Toggle Visibility",
            AppAction::ResetCamera => "Reset Camera",
            AppAction::ToggleWireframe => "Toggle Wireframe",
            AppAction::SetShowGrid(_) => "Show Grid",
            AppAction::SetShowAxes(_) => "Show Axes",
        }
    }
}

/// Application state
pub struct AppState {
    /// Viewer owning the loaded model and all view state
    pub viewer: Viewer,
    /// Texture and stats of the last rendered frame
    pub viewport_image: SharedViewportImage,
    /// Document currently shown or being loaded
    pub current_document: Option<DocumentRef>,
    /// Input buffer of the "Open Document" dialog; `None` when closed
    pub open_dialog: Option<String>,
    pending_actions: Vec<AppAction>,
}

impl AppState {
    pub fn new(viewer: Viewer, viewport_image: SharedViewportImage) -> Self {
        Self {
            viewer,
            viewport_image,
            current_document: None,
            open_dialog: None,
            pending_actions: Vec::new(),
        }
    }

    /// Queue an action to be applied at the start of the next frame
    pub fn queue_action(&mut self, action: AppAction) {
        self.pending_actions.push(action);
    }

    /// Take all queued actions
    pub fn take_actions(&mut self) -> Vec<AppAction> {
        std::mem::take(&mut self.pending_actions)
    }
}

/// Shared application state type
pub type SharedAppState = Arc<Mutex<AppState>>;
