use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::{camera::Camera, config::StageConfig};

/// Half extent of the directional light's orthographic shadow camera.
const SHADOW_CAMERA_EXTENT: f32 = 5.0;
const SHADOW_CAMERA_NEAR: f32 = 0.5;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SceneUniformState {
    pub view_proj: Mat4,
    pub light_view_proj: Mat4,
    pub camera_position: Vec4,
    /// xyz: direction towards the light, w: intensity.
    pub light_direction: Vec4,
    pub light_color: Vec4,
    /// w: hemisphere intensity.
    pub sky_color: Vec4,
    pub ground_color: Vec4,
    /// w: fog near distance.
    pub fog_color: Vec4,
    /// x: fog far distance, y: exposure, z: shadow normal bias, w: shadow texel size.
    pub params: Vec4,
}

impl SceneUniformState {
    pub fn new(camera: &Camera, stage: &StageConfig) -> Self {
        let light = &stage.directional_light;
        let hemisphere = &stage.hemisphere_light;
        let light_position = Vec3::from(light.position);

        Self {
            view_proj: camera.view_projection(),
            light_view_proj: light_view_projection(stage),
            camera_position: camera.eye.extend(1.0),
            light_direction: light_position.normalize_or(Vec3::Y).extend(light.intensity),
            light_color: light.color.to_linear().extend(1.0),
            sky_color: hemisphere.sky.to_linear().extend(hemisphere.intensity),
            ground_color: hemisphere.ground.to_linear().extend(1.0),
            fog_color: stage.fog.color.to_linear().extend(stage.fog.near),
            params: Vec4::new(
                stage.fog.far,
                stage.exposure,
                light.shadow.normal_bias,
                1.0 / light.shadow.map_size.max(1) as f32,
            ),
        }
    }
}

/// The directional light shines from its position towards the origin.
pub fn light_view_projection(stage: &StageConfig) -> Mat4 {
    let light = &stage.directional_light;
    let view = Mat4::look_at_rh(Vec3::from(light.position), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::orthographic_rh(
        -SHADOW_CAMERA_EXTENT,
        SHADOW_CAMERA_EXTENT,
        -SHADOW_CAMERA_EXTENT,
        SHADOW_CAMERA_EXTENT,
        SHADOW_CAMERA_NEAR,
        light.shadow.far,
    );

    projection * view
}

pub struct SceneUniform {
    buffer: wgpu::Buffer,
}

impl SceneUniform {
    pub fn new(device: &wgpu::Device, initial_state: SceneUniformState) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene uniform buffer"),
            contents: bytemuck::cast_slice(&[initial_state]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self { buffer }
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn update(&self, queue: &wgpu::Queue, state: SceneUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[state]));
    }
}
