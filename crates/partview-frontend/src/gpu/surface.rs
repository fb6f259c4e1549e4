//! wgpu render surface drawing into an egui-registered texture

use std::sync::Arc;

use bytemuck::Pod;
use egui::mutex::RwLock;
use parking_lot::Mutex;
use partview_renderer::config::GridConfig;
use partview_renderer::{Frame, RenderSurface, SurfaceError, ViewportSize};
use wgpu::util::DeviceExt;

use super::batch::{SceneBatch, overlay_lines};
use super::resources::{self, Pipelines};
use super::uniforms::SceneUniform;

/// What the viewport panel needs to show the last frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewportImage {
    /// Texture holding the rendered frame; `None` until the viewport has a size
    pub texture: Option<egui::TextureId>,
    pub size: ViewportSize,
    pub triangles: usize,
    pub edges: usize,
}

pub type SharedViewportImage = Arc<Mutex<ViewportImage>>;

/// Render target for viewport
struct RenderTarget {
    _color: wgpu::Texture,
    color_view: wgpu::TextureView,
    _depth: wgpu::Texture,
    depth_view: wgpu::TextureView,
    egui_texture_id: egui::TextureId,
    size: ViewportSize,
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl VertexBuffer {
    fn upload<T: Pod>(device: &wgpu::Device, label: &str, vertices: &[T]) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(Self {
            buffer,
            count: vertices.len() as u32,
        })
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &wgpu::RenderPipeline) {
        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, self.buffer.slice(..));
        pass.draw(0..self.count, 0..1);
    }
}

/// Uploaded geometry of one scene revision
struct SceneBuffers {
    revision: u64,
    solid: Option<VertexBuffer>,
    double_sided: Option<VertexBuffer>,
    edges: Option<VertexBuffer>,
    triangles: usize,
    edge_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct OverlayKey {
    show_grid: bool,
    show_axes: bool,
    grid: GridConfig,
}

struct OverlayBuffers {
    key: OverlayKey,
    lines: Option<VertexBuffer>,
}

/// Everything owned on the GPU; dropped as a whole on release.
struct GpuResources {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    egui_renderer: Arc<RwLock<egui_wgpu::Renderer>>,
    format: wgpu::TextureFormat,
    pipelines: Pipelines,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    target: Option<RenderTarget>,
    scene: Option<SceneBuffers>,
    overlay: Option<OverlayBuffers>,
}

impl GpuResources {
    fn new(render_state: &egui_wgpu::RenderState) -> Self {
        let device = render_state.device.clone();
        let format = render_state.target_format;

        let scene_layout = resources::create_scene_bind_group_layout(&device);
        let pipelines = Pipelines::new(&device, format, &scene_layout);
        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniform Buffer"),
            size: std::mem::size_of::<SceneUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        Self {
            device,
            queue: render_state.queue.clone(),
            egui_renderer: render_state.renderer.clone(),
            format,
            pipelines,
            scene_buffer,
            scene_bind_group,
            target: None,
            scene: None,
            overlay: None,
        }
    }

    /// Ensure the render target matches the requested size.
    fn ensure_target(&mut self, size: ViewportSize) -> Option<egui::TextureId> {
        if size.is_empty() {
            self.free_target();
            return None;
        }
        if let Some(target) = &self.target
            && target.size == size
        {
            return Some(target.egui_texture_id);
        }
        self.free_target();

        let (color, color_view) =
            resources::create_color_texture(&self.device, self.format, size.width, size.height);
        let (depth, depth_view) =
            resources::create_depth_texture(&self.device, size.width, size.height);
        let egui_texture_id = self.egui_renderer.write().register_native_texture(
            &self.device,
            &color_view,
            wgpu::FilterMode::Linear,
        );
        tracing::debug!("Viewport target resized to {}x{}", size.width, size.height);

        self.target = Some(RenderTarget {
            _color: color,
            color_view,
            _depth: depth,
            depth_view,
            egui_texture_id,
            size,
        });
        Some(egui_texture_id)
    }

    fn free_target(&mut self) {
        if let Some(old) = self.target.take() {
            self.egui_renderer.write().free_texture(&old.egui_texture_id);
        }
    }

    /// Re-upload geometry when the scene revision or helper options changed,
    /// then write the scene uniform.
    fn prepare(&mut self, frame: &Frame) -> SceneUniform {
        match frame.graph {
            None => self.scene = None,
            Some(graph) => {
                let current = self.scene.as_ref().map(|s| s.revision);
                if current != Some(frame.scene_revision) {
                    let batch = SceneBatch::build(graph);
                    self.scene = Some(SceneBuffers {
                        revision: frame.scene_revision,
                        solid: VertexBuffer::upload(&self.device, "Solid Mesh Buffer", &batch.solid),
                        double_sided: VertexBuffer::upload(
                            &self.device,
                            "Double-Sided Mesh Buffer",
                            &batch.double_sided,
                        ),
                        edges: VertexBuffer::upload(&self.device, "Edge Buffer", &batch.edges),
                        triangles: batch.triangle_count(),
                        edge_count: batch.edge_count(),
                    });
                }
            }
        }

        let key = OverlayKey {
            show_grid: frame.display.show_grid,
            show_axes: frame.display.show_axes,
            grid: frame.config.grid.clone(),
        };
        if self.overlay.as_ref().is_none_or(|o| o.key != key) {
            let lines = overlay_lines(frame.display, frame.config);
            self.overlay = Some(OverlayBuffers {
                key,
                lines: VertexBuffer::upload(&self.device, "Overlay Line Buffer", &lines),
            });
        }

        let uniform = SceneUniform::new(frame.camera, frame.config);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[uniform]));
        uniform
    }

    fn draw(&self, target: &RenderTarget, background: [f32; 4]) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Viewport Render Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background[0] as f64,
                            g: background[1] as f64,
                            b: background[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.scene_bind_group, &[]);

            if let Some(lines) = self.overlay.as_ref().and_then(|o| o.lines.as_ref()) {
                lines.draw(&mut pass, &self.pipelines.lines);
            }
            if let Some(scene) = &self.scene {
                if let Some(solid) = &scene.solid {
                    solid.draw(&mut pass, &self.pipelines.solid);
                }
                if let Some(double_sided) = &scene.double_sided {
                    double_sided.draw(&mut pass, &self.pipelines.double_sided);
                }
                if let Some(edges) = &scene.edges {
                    edges.draw(&mut pass, &self.pipelines.lines);
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Render surface backed by wgpu. The frame is drawn offscreen and shown by
/// the viewport panel as an egui image.
pub struct GpuSurface {
    resources: Option<GpuResources>,
    output: SharedViewportImage,
}

impl GpuSurface {
    pub fn new(render_state: &egui_wgpu::RenderState, output: SharedViewportImage) -> Self {
        Self {
            resources: Some(GpuResources::new(render_state)),
            output,
        }
    }
}

impl RenderSurface for GpuSurface {
    fn resize(&mut self, size: ViewportSize) -> Result<(), SurfaceError> {
        let gpu = self.resources.as_mut().ok_or(SurfaceError::Released)?;
        let texture = gpu.ensure_target(size);
        let mut output = self.output.lock();
        output.texture = texture;
        output.size = size;
        Ok(())
    }

    fn render(&mut self, frame: &Frame) -> Result<(), SurfaceError> {
        let gpu = self.resources.as_mut().ok_or(SurfaceError::Released)?;
        if gpu.target.is_none() {
            return Ok(());
        }
        let uniform = gpu.prepare(frame);
        if let Some(target) = &gpu.target {
            gpu.draw(target, uniform.background);
        }

        let mut output = self.output.lock();
        let (triangles, edges) = gpu
            .scene
            .as_ref()
            .map(|s| (s.triangles, s.edge_count))
            .unwrap_or_default();
        output.triangles = triangles;
        output.edges = edges;
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut gpu) = self.resources.take() {
            gpu.free_target();
            tracing::info!("Released viewport GPU resources");
        }
        *self.output.lock() = ViewportImage::default();
    }
}
