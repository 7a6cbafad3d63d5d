use crate::data::types::{PointCloudGpu, PointUniformStd140 as PointUniform, POINT_STRIDE};
use wgpu::util::DeviceExt;

/// Each point is a camera-facing quad expanded in view space, so its size
/// is in world units and shrinks with distance.
const POINTS_WGSL: &str = r#"
struct PointUniform {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    color: vec4<f32>,
    point_size: f32,
};

@group(0) @binding(0) var<uniform> u: PointUniform;

@vertex
fn vs_main(
    @location(0) corner: vec2<f32>,
    @location(1) position: vec3<f32>,
) -> @builtin(position) vec4<f32> {
    let view_pos = u.view * vec4<f32>(position, 1.0);
    let offset = corner * (0.5 * u.point_size);
    return u.proj * vec4<f32>(view_pos.xy + offset, view_pos.zw);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.color;
}
"#;

pub struct PointsPipeline {
    pipeline: wgpu::RenderPipeline,
    bind: wgpu::BindGroup,
    ubo: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Uniform Buffer"),
            size: std::mem::size_of::<PointUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point UBO Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PointUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point BindGroup"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points WGSL"),
            source: wgpu::ShaderSource::Wgsl(POINTS_WGSL.into()),
        });

        // Two triangles spanning [-1, 1]²
        let quad_corners: [[f32; 2]; 6] = [
            [-1.0, -1.0],
            [1.0, -1.0],
            [1.0, 1.0],
            [-1.0, -1.0],
            [1.0, 1.0],
            [-1.0, 1.0],
        ];

        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            // Quad corners
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            // One position per point instance
            wgpu::VertexBufferLayout {
                array_stride: POINT_STRIDE,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 1,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points PipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            bind,
            ubo,
            quad_vb,
        }
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue, uniform: &PointUniform) {
        queue.write_buffer(&self.ubo, 0, bytemuck::bytes_of(uniform));
    }

    /// Records the draw for every valid point in `cloud`. An empty cloud
    /// records nothing.
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, cloud: &'a PointCloudGpu) {
        if cloud.len == 0 {
            return;
        }

        let bytes = cloud.len as u64 * POINT_STRIDE;
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, cloud.vtx.slice(..bytes));
        rpass.draw(0..6, 0..cloud.len);
    }
}
