//! Viewer facade.
//!
//! [`Viewer`] owns one loaded asset (render graph + scene tree) together with
//! the camera, selection, display options, viewport and render loop, and
//! exposes the operations the UI drives. All mutation happens through
//! `&mut self`, so transitions are processed one at a time.

use glam::Vec2;
use partview_core::{
    DocumentRef, LoadError, LoadTicket, LoadTracker, LoadedAsset, Material, NodeHandle,
    RenderGraph, SceneNodeId, SceneTree, TreeError,
};

use crate::camera::{Camera, OrbitController};
use crate::config::RendererConfig;
use crate::display_options::DisplayOptions;
use crate::picking::{self, PickHit};
use crate::render_loop::{Frame, FrameScheduler, LoopState, RenderLoop, RenderSurface, SurfaceError};
use crate::selection::{Highlighter, SelectionError};
use crate::viewport::{ViewportManager, ViewportSize};

/// Viewer errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewerError {
    #[error("No model is loaded")]
    NoModel,
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// A loaded asset and its index.
#[derive(Debug)]
pub struct LoadedModel {
    pub name: String,
    pub graph: RenderGraph,
    pub tree: SceneTree,
}

/// Status shown next to the viewport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerStatus {
    pub loading: bool,
    /// Human-readable message of the last failed load
    pub error: Option<String>,
    /// Display name of the current document
    pub document_name: Option<String>,
}

/// Interactive 3D viewer state.
#[derive(Debug)]
pub struct Viewer {
    config: RendererConfig,
    model: Option<LoadedModel>,
    loads: LoadTracker,
    highlighter: Highlighter,
    controller: OrbitController,
    display: DisplayOptions,
    viewport: ViewportManager,
    render_loop: RenderLoop,
    status: ViewerStatus,
    scene_revision: u64,
}

impl Viewer {
    pub fn new(
        config: RendererConfig,
        surface: Box<dyn RenderSurface>,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Self {
        Self {
            controller: OrbitController::new(config.camera.clone()),
            display: DisplayOptions::from_config(&config.display),
            config,
            model: None,
            loads: LoadTracker::new(),
            highlighter: Highlighter::new(),
            viewport: ViewportManager::new(),
            render_loop: RenderLoop::new(surface, scheduler),
            status: ViewerStatus::default(),
            scene_revision: 0,
        }
    }

    /// Attach the size observer, size the surface and start the loop.
    pub fn start(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        self.viewport.attach();
        self.render_loop.start();
        self.resize(size)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Apply new renderer settings; takes effect on the next tick.
    pub fn apply_config(&mut self, config: RendererConfig) {
        self.controller.apply_config(config.camera.clone());
        self.display.show_grid = config.display.show_grid;
        self.display.show_axes = config.display.show_axes;
        self.config = config;
    }

    pub fn status(&self) -> &ViewerStatus {
        &self.status
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn graph(&self) -> Option<&RenderGraph> {
        self.model.as_ref().map(|m| &m.graph)
    }

    pub fn tree(&self) -> Option<&SceneTree> {
        self.model.as_ref().map(|m| &m.tree)
    }

    pub fn selected(&self) -> Option<SceneNodeId> {
        self.highlighter.selected()
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn camera(&self) -> &Camera {
        self.controller.camera()
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut DisplayOptions {
        &mut self.display
    }

    pub fn loop_state(&self) -> LoopState {
        self.render_loop.state()
    }

    /// Counter bumped by every change to the drawn geometry or materials.
    pub fn scene_revision(&self) -> u64 {
        self.scene_revision
    }

    fn touch_scene(&mut self) {
        self.scene_revision = self.scene_revision.wrapping_add(1);
    }

    /// True if the next tick would draw something new.
    pub fn needs_redraw(&self) -> bool {
        self.controller.is_dirty() || self.controller.is_animating()
    }

    // ========== Loading ==========

    /// Register a new load request; it supersedes any request in flight.
    pub fn begin_load(&mut self, reference: DocumentRef) -> LoadTicket {
        let ticket = self.loads.begin(reference);
        tracing::info!("Loading {} ({})", ticket.reference, ticket.id);
        self.status.loading = true;
        self.status.error = None;
        ticket
    }

    /// Apply the result of a load request.
    ///
    /// Results of superseded requests are discarded and `false` is returned.
    /// Otherwise the previous model is replaced: by the new asset on success,
    /// by nothing on failure.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<LoadedAsset, LoadError>,
    ) -> bool {
        if !self.loads.complete(ticket) {
            tracing::warn!("Ignoring stale result of {} ({})", ticket.id, ticket.reference);
            return false;
        }
        self.status.loading = false;
        self.status.document_name = None;
        self.highlighter.reset();
        self.model = None;
        self.touch_scene();

        match result {
            Ok(asset) => {
                tracing::info!("Loaded {} ({:?})", asset.name, asset.format);
                self.install(asset);
            }
            Err(e) => {
                match &e {
                    LoadError::EmptyGeometry => tracing::warn!("{}: {}", ticket.reference, e),
                    _ => tracing::error!("Failed to load {}: {}", ticket.reference, e),
                }
                self.status.error = Some(e.user_message());
            }
        }
        true
    }

    fn install(&mut self, asset: LoadedAsset) {
        let LoadedAsset { name, mut graph, .. } = asset;
        let display = &self.config.display;

        let highlight = Material::from_hex(display.highlight_color, display.highlight_emissive)
            .with_name("highlight");
        self.highlighter.install(&mut graph, highlight);
        graph.materials_mut().set_wireframe(self.display.wireframe);

        if self
            .controller
            .frame_whole(&mut graph, display.reference_size)
            .is_none()
        {
            tracing::warn!("{} has degenerate bounds, framing skipped", name);
        }

        let tree = SceneTree::build(&graph);
        tracing::debug!("Indexed {} scene nodes for {}", tree.len(), name);
        self.status.document_name = Some(name.clone());
        self.model = Some(LoadedModel { name, graph, tree });
    }

    pub fn is_loading(&self) -> bool {
        self.loads.is_loading()
    }

    // ========== Selection ==========

    /// Select a scene node (or clear the selection with `None`) and frame it.
    pub fn select_node(&mut self, target: Option<SceneNodeId>) -> Result<(), ViewerError> {
        let model = self.model.as_mut().ok_or(ViewerError::NoModel)?;
        self.highlighter
            .select(&mut model.graph, &model.tree, target)?;

        if let Some(id) = target
            && let Some(node) = model.tree.node(id)
        {
            let bounds = model.graph.subtree_bounds(node.identity);
            if !self.controller.frame(&bounds) {
                tracing::debug!("Selection {:?} has no extent, camera unchanged", id);
            }
        }
        self.touch_scene();
        Ok(())
    }

    /// Flip the visibility of a scene node. Returns the new visibility.
    pub fn toggle_visibility(&mut self, id: SceneNodeId) -> Result<bool, ViewerError> {
        let model = self.model.as_mut().ok_or(ViewerError::NoModel)?;
        let visible = model.tree.toggle_visibility(id, &mut model.graph)?;
        self.touch_scene();
        Ok(visible)
    }

    /// Pick under a pointer position in NDC without changing the selection.
    pub fn pick(&self, ndc: Vec2) -> Option<PickHit> {
        let graph = self.graph()?;
        picking::pick(graph, self.controller.camera(), ndc)
    }

    /// Select whatever lies under a pointer click.
    ///
    /// A click on empty space, or on geometry with no indexed node, leaves the
    /// selection unchanged and returns `None`.
    pub fn click(&mut self, ndc: Vec2) -> Result<Option<SceneNodeId>, ViewerError> {
        let Some(hit) = self.pick(ndc) else {
            return Ok(None);
        };
        let Some(id) = self.scene_node_for(hit.node) else {
            tracing::debug!("Hit node {} has no scene node", hit.node);
            return Ok(None);
        };
        self.select_node(Some(id))?;
        Ok(Some(id))
    }

    fn scene_node_for(&self, hit: NodeHandle) -> Option<SceneNodeId> {
        let model = self.model.as_ref()?;
        model.tree.find_for_hit(&model.graph, hit)
    }

    // ========== Camera and display ==========

    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.controller.orbit(delta_x, delta_y);
    }

    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        self.controller.pan(delta_x, delta_y);
    }

    pub fn zoom(&mut self, steps: f32) {
        self.controller.zoom(steps);
    }

    pub fn reset_camera(&mut self) {
        self.controller.reset();
    }

    /// Flip wireframe on every material of the current model.
    pub fn toggle_wireframe(&mut self) -> bool {
        self.display.wireframe = !self.display.wireframe;
        if let Some(model) = &mut self.model {
            model.graph.materials_mut().toggle_wireframe();
        }
        self.touch_scene();
        self.display.wireframe
    }

    // ========== Render loop ==========

    /// Report the container size; resizes the surface and camera on change.
    pub fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        let Some(size) = self.viewport.observe(size) else {
            return Ok(());
        };
        if let Some(aspect) = size.aspect() {
            self.controller.set_aspect(aspect);
        }
        self.render_loop.resize(size)
    }

    /// Apply pending camera changes and draw one frame.
    pub fn tick(&mut self) -> Result<(), SurfaceError> {
        if !self.render_loop.is_running() {
            return Ok(());
        }
        self.controller.update();

        let viewport = self.viewport.size().unwrap_or_default();
        let camera = self.controller.camera();
        let graph = self.model.as_ref().map(|m| &m.graph);
        let display = &self.display;
        let config = &self.config.display;
        let scene_revision = self.scene_revision;
        self.render_loop.tick(|index| Frame {
            index,
            scene_revision,
            viewport,
            camera,
            graph,
            display,
            config,
        })
    }

    /// Stop the loop, release the surface, detach the size observer and
    /// discard in-flight loads.
    pub fn shutdown(&mut self) {
        self.render_loop.stop();
        self.viewport.detach();
        self.loads.cancel_all();
        self.status.loading = false;
        tracing::info!("Viewer shut down");
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use partview_core::{AssetFormat, MaterialHandle, MeshData};

    use super::*;
    use crate::render_loop::testing::{SharedLog, doubles};

    fn quad() -> MeshData {
        MeshData::new(
            vec![
                [-0.5, -0.5, 0.0],
                [0.5, -0.5, 0.0],
                [0.5, 0.5, 0.0],
                [-0.5, 0.5, 0.0],
            ],
            Vec::new(),
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    /// Two parts side by side, each a unit quad facing +Z:
    /// "Left" carries its mesh, "Right" has it on an unnamed child.
    fn asset(name: &str) -> LoadedAsset {
        let mut graph = RenderGraph::new(name);
        let steel = graph.add_material(Material::default().with_name("Steel"));
        let paint = graph.add_material(Material::new([0.8, 0.1, 0.1, 1.0]).with_name("Paint"));

        let root = graph.root();
        let left = graph
            .add_node(root, Some("Left".into()), Mat4::from_translation(-Vec3::X))
            .unwrap();
        graph.set_renderable(left, quad(), steel).unwrap();
        let right = graph
            .add_node(root, Some("Right".into()), Mat4::from_translation(Vec3::X))
            .unwrap();
        let right_mesh = graph.add_node(right, None, Mat4::IDENTITY).unwrap();
        graph.set_renderable(right_mesh, quad(), paint).unwrap();

        LoadedAsset::new(name, AssetFormat::Glb, graph)
    }

    fn viewer() -> (Viewer, SharedLog) {
        let (surface, scheduler, log) = doubles();
        let mut viewer = Viewer::new(RendererConfig::default(), surface, scheduler);
        viewer.start(ViewportSize::new(800, 800)).unwrap();
        (viewer, log)
    }

    fn loaded_viewer() -> (Viewer, SharedLog) {
        let (mut viewer, log) = viewer();
        let ticket = viewer.begin_load(DocumentRef::Remote { id: 1 });
        assert!(viewer.complete_load(&ticket, Ok(asset("pump.glb"))));
        (viewer, log)
    }

    fn scene_id(viewer: &Viewer, name: &str) -> SceneNodeId {
        let tree = viewer.tree().unwrap();
        tree.iter_depth_first()
            .find(|id| tree.node(*id).unwrap().name == name)
            .unwrap()
    }

    fn node_materials(viewer: &Viewer) -> Vec<Option<MaterialHandle>> {
        let graph = viewer.graph().unwrap();
        graph.iter().map(|(h, _)| graph.material_of(h)).collect()
    }

    #[test]
    fn test_load_frames_whole_model() {
        let (viewer, _) = loaded_viewer();
        assert_eq!(viewer.status().document_name.as_deref(), Some("pump.glb"));
        assert!(!viewer.status().loading);
        assert_eq!(viewer.camera().target, Vec3::ZERO);
        assert_eq!(viewer.camera().position, Vec3::new(7.5, 5.0, 7.5));
        assert_eq!(viewer.tree().unwrap().roots().len(), 2);
        assert_eq!(viewer.tree().unwrap().validate(viewer.graph().unwrap()), Ok(()));
    }

    #[test]
    fn test_last_load_wins() {
        let (mut viewer, _) = viewer();
        let first = viewer.begin_load(DocumentRef::Remote { id: 1 });
        let second = viewer.begin_load(DocumentRef::Remote { id: 2 });

        assert!(viewer.complete_load(&second, Ok(asset("second.glb"))));
        assert!(!viewer.complete_load(&first, Ok(asset("first.glb"))));

        assert_eq!(viewer.model().unwrap().name, "second.glb");
        assert!(!viewer.status().loading);
    }

    #[test]
    fn test_failed_load_clears_model() {
        let (mut viewer, _) = loaded_viewer();
        let left = scene_id(&viewer, "Left");
        viewer.select_node(Some(left)).unwrap();

        let ticket = viewer.begin_load(DocumentRef::Remote { id: 2 });
        assert!(viewer.status().loading);
        viewer.complete_load(&ticket, Err(LoadError::Transport("timeout".into())));

        assert!(viewer.model().is_none());
        assert!(viewer.selected().is_none());
        assert!(viewer.highlighter().records().is_empty());
        assert!(viewer.status().error.is_some());
        assert!(!viewer.status().loading);
    }

    #[test]
    fn test_empty_geometry_skips_framing() {
        let (mut viewer, _) = viewer();
        viewer.orbit(50.0, 0.0);
        viewer.tick().unwrap();
        let camera_before = viewer.camera().clone();

        let ticket = viewer.begin_load(DocumentRef::local("empty.glb"));
        viewer.complete_load(&ticket, Err(LoadError::EmptyGeometry));

        assert!(viewer.tree().is_none());
        assert_eq!(viewer.camera(), &camera_before);
        assert_eq!(
            viewer.status().error.as_deref(),
            Some(LoadError::EmptyGeometry.user_message().as_str())
        );
    }

    #[test]
    fn test_select_a_then_b() {
        let (mut viewer, _) = loaded_viewer();
        let original = node_materials(&viewer);
        let left = scene_id(&viewer, "Left");
        let right = scene_id(&viewer, "Right");

        viewer.select_node(Some(left)).unwrap();
        viewer.select_node(Some(right)).unwrap();

        let graph = viewer.graph().unwrap();
        let right_identity = viewer.tree().unwrap().node(right).unwrap().identity;
        let expected = graph.renderables_in_subtree(right_identity);
        let records = viewer.highlighter().records();
        assert_eq!(records.len(), expected.len());
        for handle in &expected {
            assert_eq!(Some(records[handle]), original[handle.index()]);
        }

        let left_identity = viewer.tree().unwrap().node(left).unwrap().identity;
        assert_eq!(graph.material_of(left_identity), original[left_identity.index()]);
    }

    #[test]
    fn test_select_then_deselect_restores() {
        let (mut viewer, _) = loaded_viewer();
        let before = node_materials(&viewer);
        let right = scene_id(&viewer, "Right");
        viewer.select_node(Some(right)).unwrap();
        viewer.select_node(None).unwrap();
        assert_eq!(node_materials(&viewer), before);
    }

    #[test]
    fn test_selection_frames_subtree() {
        let (mut viewer, _) = loaded_viewer();
        let left = scene_id(&viewer, "Left");
        viewer.select_node(Some(left)).unwrap();

        let graph = viewer.graph().unwrap();
        let identity = viewer.tree().unwrap().node(left).unwrap().identity;
        let bounds = graph.subtree_bounds(identity);
        assert_eq!(viewer.camera().target, bounds.center());
    }

    #[test]
    fn test_click_selects_and_miss_keeps_selection() {
        let (mut viewer, _) = loaded_viewer();
        // Look straight down -Z at the two quads
        viewer.controller.look_at(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);

        let left_ndc = viewer.camera().view_projection().project_point3(Vec3::new(-5.0 / 3.0, 0.0, 0.0));
        let selected = viewer.click(Vec2::new(left_ndc.x, left_ndc.y)).unwrap();
        let left = scene_id(&viewer, "Left");
        assert_eq!(selected, Some(left));

        let miss = viewer.click(Vec2::new(0.0, 0.95)).unwrap();
        assert_eq!(miss, None);
        assert_eq!(viewer.selected(), Some(left));
    }

    #[test]
    fn test_click_resolves_parent_of_unnamed_mesh() {
        let (mut viewer, _) = loaded_viewer();
        viewer.controller.look_at(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO);

        let right_ndc = viewer.camera().view_projection().project_point3(Vec3::new(5.0 / 3.0, 0.0, 0.0));
        let selected = viewer.click(Vec2::new(right_ndc.x, right_ndc.y)).unwrap();
        assert_eq!(selected, Some(scene_id(&viewer, "Right")));
    }

    #[test]
    fn test_wireframe_toggle_twice_is_identity() {
        let (mut viewer, _) = loaded_viewer();
        let right = scene_id(&viewer, "Right");
        viewer.select_node(Some(right)).unwrap();

        let flags = |viewer: &Viewer| -> Vec<bool> {
            viewer.graph().unwrap().materials().iter().map(|(_, m)| m.wireframe).collect()
        };
        let before = flags(&viewer);
        assert!(viewer.toggle_wireframe());
        assert!(flags(&viewer).iter().all(|w| *w));
        assert!(!viewer.toggle_wireframe());
        assert_eq!(flags(&viewer), before);
    }

    #[test]
    fn test_wireframe_while_selected_then_deselect() {
        let (mut viewer, _) = loaded_viewer();
        let original = node_materials(&viewer);
        let left = scene_id(&viewer, "Left");
        viewer.select_node(Some(left)).unwrap();
        assert!(viewer.toggle_wireframe());
        viewer.select_node(None).unwrap();

        assert!(viewer.highlighter().records().is_empty());
        assert_eq!(node_materials(&viewer), original);

        let graph = viewer.graph().unwrap();
        let identity = viewer.tree().unwrap().node(left).unwrap().identity;
        for handle in graph.renderables_in_subtree(identity) {
            let material = graph.material_of(handle).unwrap();
            assert!(graph.materials().get(material).unwrap().wireframe);
        }
        // Highlight material included
        assert!(graph.materials().iter().all(|(_, m)| m.wireframe));
    }

    #[test]
    fn test_scene_revision_tracks_scene_changes() {
        let (mut viewer, _) = loaded_viewer();
        let left = scene_id(&viewer, "Left");
        let mut last = viewer.scene_revision();
        let mut changed = |viewer: &Viewer| {
            let current = viewer.scene_revision();
            let bumped = current != last;
            last = current;
            bumped
        };

        viewer.select_node(Some(left)).unwrap();
        assert!(changed(&viewer));
        viewer.toggle_visibility(left).unwrap();
        assert!(changed(&viewer));
        viewer.toggle_wireframe();
        assert!(changed(&viewer));

        // Camera motion redraws without touching the scene
        viewer.orbit(10.0, 5.0);
        viewer.tick().unwrap();
        assert!(!changed(&viewer));

        let ticket = viewer.begin_load(DocumentRef::Remote { id: 4 });
        viewer.complete_load(&ticket, Err(LoadError::Transport("offline".into())));
        assert!(changed(&viewer));
    }

    #[test]
    fn test_new_load_inherits_wireframe() {
        let (mut viewer, _) = loaded_viewer();
        viewer.toggle_wireframe();
        let ticket = viewer.begin_load(DocumentRef::Remote { id: 3 });
        viewer.complete_load(&ticket, Ok(asset("other.glb")));
        let graph = viewer.graph().unwrap();
        assert!(graph.materials().iter().all(|(_, m)| m.wireframe));
    }

    #[test]
    fn test_toggle_visibility_independent_of_highlight() {
        let (mut viewer, _) = loaded_viewer();
        let left = scene_id(&viewer, "Left");
        viewer.select_node(Some(left)).unwrap();
        let records = viewer.highlighter().records().clone();

        assert_eq!(viewer.toggle_visibility(left), Ok(false));
        assert_eq!(viewer.highlighter().records(), &records);
        assert_eq!(viewer.toggle_visibility(left), Ok(true));
    }

    #[test]
    fn test_operations_without_model() {
        let (mut viewer, _) = viewer();
        assert_eq!(viewer.select_node(None), Err(ViewerError::NoModel));
        assert_eq!(viewer.click(Vec2::ZERO), Ok(None));
        assert!(viewer.toggle_wireframe());
        assert!(viewer.display().wireframe);
    }

    #[test]
    fn test_reset_after_interaction() {
        let (mut viewer, _) = loaded_viewer();
        viewer.orbit(200.0, 80.0);
        viewer.zoom(-4.0);
        viewer.pan(30.0, 30.0);
        for _ in 0..10 {
            viewer.tick().unwrap();
        }
        viewer.reset_camera();
        assert_eq!(viewer.camera().position, Vec3::splat(5.0));
        assert_eq!(viewer.camera().target, Vec3::ZERO);
    }

    #[test]
    fn test_apply_config_keeps_pose() {
        let (mut viewer, _) = loaded_viewer();
        let position = viewer.camera().position;

        let mut config = RendererConfig::default();
        config.camera.fov_degrees = 60.0;
        config.display.show_axes = true;
        viewer.apply_config(config);

        assert_eq!(viewer.camera().position, position);
        assert!((viewer.camera().fov_y - 60f32.to_radians()).abs() < 1e-6);
        assert!(viewer.display().show_axes);
        assert!(viewer.needs_redraw());
    }

    #[test]
    fn test_resize_updates_aspect() {
        let (mut viewer, log) = viewer();
        viewer.resize(ViewportSize::new(1600, 800)).unwrap();
        assert_eq!(viewer.camera().aspect, 2.0);
        assert_eq!(
            log.lock().unwrap().resized,
            vec![ViewportSize::new(800, 800), ViewportSize::new(1600, 800)]
        );
    }

    #[test]
    fn test_tick_and_shutdown() {
        let (mut viewer, log) = loaded_viewer();
        viewer.tick().unwrap();
        viewer.tick().unwrap();
        assert_eq!(log.lock().unwrap().rendered_with_graph, 2);

        let pending = viewer.begin_load(DocumentRef::Remote { id: 9 });
        viewer.shutdown();
        assert_eq!(viewer.loop_state(), LoopState::Stopped);
        assert!(!viewer.complete_load(&pending, Ok(asset("late.glb"))));

        viewer.tick().unwrap();
        let log = log.lock().unwrap();
        assert_eq!(log.rendered.len(), 2);
        assert_eq!(log.cancelled, 1);
        assert_eq!(log.released, 1);
        assert!(!viewer.viewport.is_observing());
    }
}
