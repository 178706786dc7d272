use id_arena::{Arena, Id};
use wgpu::util::DeviceExt;

use crate::{
    model::{Model, ModelPrimitive},
    rendering::instance::{Instance, InstanceBuffer, Instances},
    scene_graph::Scene,
};

pub type RenderModelId = Id<RenderModel>;

pub struct RenderPrimitive {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl RenderPrimitive {
    fn from_primitive(device: &wgpu::Device, model: &Model, primitive: &ModelPrimitive) -> Self {
        let vertex_buffer_name = format!(
            "Vertex buffer ({}, primitive {})",
            model.name, primitive.index
        );
        let index_buffer_name = format!(
            "Index buffer ({}, primitive {})",
            model.name, primitive.index
        );

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&vertex_buffer_name),
            contents: bytemuck::cast_slice(&primitive.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&index_buffer_name),
            contents: bytemuck::cast_slice(&primitive.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: primitive.indices.len() as u32,
        }
    }
}

pub struct RenderModel {
    pub name: String,
    pub primitives: Vec<RenderPrimitive>,
    pub instances: Instances,
    pub instance_buffer: InstanceBuffer,
}

impl RenderModel {
    pub fn from_model(device: &wgpu::Device, model: &Model) -> Self {
        let primitives = model
            .primitives
            .iter()
            .map(|primitive| RenderPrimitive::from_primitive(device, model, primitive))
            .collect();

        RenderModel {
            name: model.name.clone(),
            primitives,
            instances: Instances::new(),
            instance_buffer: InstanceBuffer::new(device, &model.name),
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        self.instance_buffer.bind(render_pass);

        for primitive in &self.primitives {
            render_pass.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
            render_pass
                .set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..primitive.num_indices, 0, 0..self.instances.len() as u32);
        }
    }
}

/// Uploads every scene model the renderer has not seen yet. Models arrive while the batch
/// is still loading, so this runs every frame.
pub fn sync_render_models(
    device: &wgpu::Device,
    scene: &mut Scene,
    render_models: &mut Arena<RenderModel>,
) {
    for (_id, scene_model) in scene.models.iter_mut() {
        if scene_model.render_model.is_some() {
            continue;
        }

        let render_model = RenderModel::from_model(device, &scene_model.model);
        scene_model.render_model = Some(render_models.alloc(render_model));

        log::info!(
            "Uploaded model {} with {} primitives",
            scene_model.model.name,
            scene_model.model.primitives.len()
        );
    }
}

/// Rebuilds the per-model instance lists from the world matrices of the scene. Models with
/// a moved object are flagged for upload.
pub fn gather_instances(scene: &Scene, render_models: &mut Arena<RenderModel>) {
    for (_id, render_model) in render_models.iter_mut() {
        render_model.instances.clear();
    }

    for (_, object) in scene.objects.iter() {
        let Some(render_model_id) = object
            .model_id
            .and_then(|model_id| scene.models.get(model_id))
            .and_then(|model| model.render_model)
        else {
            continue;
        };

        if let Some(render_model) = render_models.get_mut(render_model_id) {
            render_model.instances.add(Instance::from_object(object));

            if object.transform.has_changed() {
                render_model.instances.mark_changed();
            }
        }
    }
}
