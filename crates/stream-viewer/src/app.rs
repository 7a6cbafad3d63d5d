use crate::{
    camera::{Camera, CameraController},
    config::Config,
    data::PointCloud,
    renderer::Renderer,
    stream::StreamInbox,
    ui::{self, HudStats},
};
use anyhow::{Context, Result};
use glam::Vec3;
use std::{path::Path, sync::Arc};
use winit::{event::WindowEvent, window::Window};

/// The render context: everything the frame callback touches.
///
/// The stream only reaches the cloud through `inbox`, drained at the start of
/// every frame, so the cloud is never mutated mid-draw.
pub struct App {
    pub renderer: Renderer,
    pub camera: Camera,
    pub camera_controller: CameraController,
    pub cloud: PointCloud,
    pub inbox: StreamInbox,
    pub point_color: [f32; 3],
    pub point_size: f32,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
}

impl App {
    pub async fn new(window: Arc<Window>, config: &Config, inbox: StreamInbox) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;
        let size = renderer.gfx.size;

        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            size.width as f32 / size.height.max(1) as f32,
        );
        let camera_controller = CameraController::new(size.height);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            renderer,
            camera,
            camera_controller,
            cloud: PointCloud::new(),
            inbox,
            point_color: config.color,
            point_size: config.point_size,
            egui_ctx,
            egui_state,
        })
    }

    /// Shows the points stored in `path` until the stream replaces them.
    pub fn preload(&mut self, path: &Path) -> Result<()> {
        let points = pointfile::read_points(path)
            .with_context(|| format!("reading points file {}", path.display()))?;

        log::info!("Preloaded {} points from {}", points.len(), path.display());
        self.cloud = PointCloud::from_points(&points);
        Ok(())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera
                .set_aspect(new_size.width as f32 / new_size.height as f32);
            self.camera_controller.set_viewport_height(new_size.height);
        }
    }

    /// Returns true when egui consumed the event.
    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.egui_state.on_window_event(window, event);
        if response.consumed {
            return true;
        }

        self.camera_controller.handle_event(event, &self.camera);

        if let WindowEvent::Resized(physical_size) = event {
            self.resize(*physical_size);
        }

        false
    }

    /// One frame: apply pending stream data, advance the orbit, redraw.
    pub fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        self.inbox.drain_into(&mut self.cloud);
        self.camera_controller.update(&mut self.camera);
        self.renderer.sync_cloud(&mut self.cloud);

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let uniform = self.camera.make_uniform(self.point_color, self.point_size);
        self.renderer.render(&swap_view, &uniform);

        let egui_input = self.egui_state.take_egui_input(window);
        self.egui_ctx.begin_frame(egui_input);

        ui::draw_hud(
            &self.egui_ctx,
            &HudStats {
                state: self.inbox.state(),
                points: self.cloud.point_count(),
                messages: self.inbox.messages(),
                generation: self.cloud.generation(),
                camera_distance: self.camera.radius,
            },
        );

        let egui_output = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(window, egui_output.platform_output);

        let shapes = self
            .egui_ctx
            .tessellate(egui_output.shapes, self.egui_ctx.pixels_per_point());

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point: self.egui_ctx.pixels_per_point(),
        };

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        for (id, delta) in &egui_output.textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("EGUI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &egui_output.textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
