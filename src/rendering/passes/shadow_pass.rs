use wgpu::{MultisampleState, PipelineCompilationOptions, RenderPass, RenderPassDescriptor};

use crate::{
    model::VERTEX_BUFFER_LAYOUT,
    rendering::{
        instance::Instance,
        passes::pass::{create_shader, Pass, MODEL_PRIMITIVE_STATE},
        texture::DEPTH_FORMAT,
    },
};

const SHADOW_SHADER: &str = include_str!("../../shaders/shadow.wgsl");

/// Depth-only pass from the directional light into the shadow map.
pub struct ShadowPass {
    pipeline: wgpu::RenderPipeline,
    uniform_bind_group: wgpu::BindGroup,
}

pub struct ShadowTextureViews {
    pub depth: wgpu::TextureView,
}

impl ShadowPass {
    pub fn create(device: &wgpu::Device, scene_uniform: &wgpu::Buffer) -> Self {
        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shadow uniform bind group layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow uniform bind group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_uniform.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shadow pipeline layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = create_shader(device, "Shadow shader", SHADOW_SHADER);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shadow pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_BUFFER_LAYOUT, Instance::descriptor()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: None,
            primitive: MODEL_PRIMITIVE_STATE,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        ShadowPass {
            pipeline,
            uniform_bind_group,
        }
    }
}

impl Pass for ShadowPass {
    type TextureViews = ShadowTextureViews;

    fn render<'a, F>(
        &self,
        texture_views: &ShadowTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        render_callback: F,
    ) where
        F: FnOnce(&mut RenderPass) + 'a,
    {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Shadow pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

        render_callback(&mut render_pass);
    }
}
