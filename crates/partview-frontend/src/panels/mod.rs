//! Dockable panels

mod hierarchy;
mod properties;
mod viewport;

pub use hierarchy::HierarchyPanel;
pub use properties::PropertiesPanel;
pub use viewport::ViewportPanel;

use egui_dock::{DockState, NodeIndex, TabViewer};

use crate::state::SharedAppState;

/// A panel that can be shown in a dock tab
pub trait Panel {
    /// Tab title
    fn name(&self) -> &str;

    /// Draw the panel contents
    fn ui(&mut self, ui: &mut egui::Ui, app_state: &SharedAppState);
}

/// Dock tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTab {
    Hierarchy,
    Viewport,
    Properties,
}

/// Default layout: hierarchy left, viewport center, properties right
pub fn default_dock_state() -> DockState<PanelTab> {
    let mut dock_state = DockState::new(vec![PanelTab::Viewport]);
    let surface = dock_state.main_surface_mut();
    let [viewport, _hierarchy] =
        surface.split_left(NodeIndex::root(), 0.22, vec![PanelTab::Hierarchy]);
    surface.split_right(viewport, 0.75, vec![PanelTab::Properties]);
    dock_state
}

/// All panels, keyed by tab
pub struct Panels {
    pub hierarchy: HierarchyPanel,
    pub viewport: ViewportPanel,
    pub properties: PropertiesPanel,
}

impl Panels {
    pub fn new() -> Self {
        Self {
            hierarchy: HierarchyPanel::new(),
            viewport: ViewportPanel::new(),
            properties: PropertiesPanel::new(),
        }
    }

    fn panel_mut(&mut self, tab: PanelTab) -> &mut dyn Panel {
        match tab {
            PanelTab::Hierarchy => &mut self.hierarchy,
            PanelTab::Viewport => &mut self.viewport,
            PanelTab::Properties => &mut self.properties,
        }
    }
}

impl Default for Panels {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes dock tabs to panels
pub struct AppTabViewer<'a> {
    pub panels: &'a mut Panels,
    pub app_state: &'a SharedAppState,
}

impl TabViewer for AppTabViewer<'_> {
    type Tab = PanelTab;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        self.panels.panel_mut(*tab).name().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut Self::Tab) {
        self.panels.panel_mut(*tab).ui(ui, self.app_state);
    }

    fn closeable(&mut self, _tab: &mut Self::Tab) -> bool {
        false
    }

    fn clear_background(&self, tab: &Self::Tab) -> bool {
        *tab != PanelTab::Viewport
    }
}
