use std::sync::Arc;

use anyhow::Context;
use id_arena::Arena;
use wgpu::CommandEncoderDescriptor;
use winit::window::Window;

use crate::{
    camera::Camera,
    config::StageConfig,
    rendering::{
        imgui_renderer::ImguiRenderer,
        passes::{
            lit_pass::{LitPass, LitTextureViews},
            pass::Pass,
            shadow_pass::{ShadowPass, ShadowTextureViews},
        },
        render_common::surface_config,
        render_model::{gather_instances, sync_render_models, RenderModel},
        scene_uniform::{SceneUniform, SceneUniformState},
        texture::{DepthTexture, ShadowMap},
    },
    scene_graph::Scene,
    viewport::ViewportSize,
};

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: ViewportSize,

    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,

    stage: StageConfig,
    scene_uniform: SceneUniform,
    depth_texture: DepthTexture,
    shadow_map: ShadowMap,
    render_models: Arena<RenderModel>,

    shadow_pass: ShadowPass,
    lit_pass: LitPass,
    imgui_renderer: ImguiRenderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        size: ViewportSize,
        stage: &StageConfig,
        camera: &Camera,
        imgui: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_config = surface_config(&adapter, &surface, size)?;
        surface.configure(&device, &surface_config);

        let scene_uniform = SceneUniform::new(&device, SceneUniformState::new(camera, stage));
        let depth_texture = DepthTexture::new(&device, &surface_config, "Depth texture");
        let shadow_map = ShadowMap::new(&device, stage.directional_light.shadow.map_size);

        let background = stage.background.to_linear();
        let clear_color = wgpu::Color {
            r: background.x as f64,
            g: background.y as f64,
            b: background.z as f64,
            a: 1.0,
        };

        let shadow_pass = ShadowPass::create(&device, scene_uniform.buffer());
        let lit_pass = LitPass::create(
            &device,
            surface_config.format,
            scene_uniform.buffer(),
            &shadow_map,
            clear_color,
        );
        let imgui_renderer = ImguiRenderer::new(&device, &queue, surface_config.format, imgui);

        Ok(Self {
            window,
            size,
            surface,
            surface_config,
            device,
            queue,
            stage: stage.clone(),
            scene_uniform,
            depth_texture,
            shadow_map,
            render_models: Arena::new(),
            shadow_pass,
            lit_pass,
            imgui_renderer,
        })
    }

    pub fn resize(&mut self, size: ViewportSize) {
        self.size = size;
        self.surface_config.width = size.buffer_width;
        self.surface_config.height = size.buffer_height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_texture.resize(&self.device, &self.surface_config);
    }

    /// Reconfigures the surface at the current size after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.resize(self.size);
    }

    pub fn render(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
        imgui: &mut imgui::Context,
    ) -> Result<(), wgpu::SurfaceError> {
        sync_render_models(&self.device, scene, &mut self.render_models);
        gather_instances(scene, &mut self.render_models);

        for (_id, render_model) in self.render_models.iter_mut() {
            if render_model.instances.take_changed() {
                render_model
                    .instance_buffer
                    .write(&self.device, &self.queue, &render_model.instances);
            }
        }

        self.scene_uniform
            .update(&self.queue, SceneUniformState::new(camera, &self.stage));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let render_models = &self.render_models;

        self.shadow_pass.render(
            &ShadowTextureViews {
                depth: self.shadow_map.view().clone(),
            },
            &mut encoder,
            |render_pass| {
                for (_id, render_model) in render_models.iter() {
                    if render_model.instances.any_casts_shadow() {
                        render_model.draw(render_pass);
                    }
                }
            },
        );

        self.lit_pass.render(
            &LitTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            |render_pass| {
                for (_id, render_model) in render_models.iter() {
                    if render_model.instances.should_render() {
                        render_model.draw(render_pass);
                    }
                }
            },
        );

        self.imgui_renderer
            .render(&view, imgui, &self.device, &self.queue, &mut encoder);

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        output.present();

        Ok(())
    }
}
