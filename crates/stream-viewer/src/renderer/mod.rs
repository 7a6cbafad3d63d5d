//! The rendering orchestrator. Owns the GPU context, the depth target, the
//! point pipeline with its vertex buffer, and the egui renderer.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{context::GfxContext, pipelines::points::PointsPipeline, targets::Targets};
use crate::data::{PointCloud, PointCloudGpu, PointUniformStd140};
use std::sync::Arc;
use winit::window::Window;

/// Owns all rendering-related state.
pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub points: PointsPipeline,
    pub cloud: PointCloudGpu,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window).await?;

        let targets = Targets::new(&gfx.device, gfx.size);
        let points = PointsPipeline::new(&gfx.device, gfx.config.format, targets.depth_fmt);
        let cloud = PointCloudGpu::new(&gfx.device);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, gfx.config.format, None, 1);

        Ok(Self {
            gfx,
            targets,
            points,
            cloud,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    /// Uploads `cloud` if it was replaced since the last frame.
    pub fn sync_cloud(&mut self, cloud: &mut PointCloud) -> bool {
        self.cloud.sync(&self.gfx.device, &self.gfx.queue, cloud)
    }

    /// Clears to black and draws the current point buffer.
    pub fn render(&mut self, swap_view: &wgpu::TextureView, uniform: &PointUniformStd140) {
        self.points.write_uniform(&self.gfx.queue, uniform);

        let mut encoder = self
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.points.draw(&mut pass, &self.cloud);
        }

        self.gfx.queue.submit(std::iter::once(encoder.finish()));
    }
}
