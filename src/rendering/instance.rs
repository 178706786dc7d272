use std::mem::size_of;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::BufferUsages;

use crate::scene_graph::Object3D;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    /// x: receives shadows, y: casts shadows.
    pub flags: Vec4,
}

impl Instance {
    pub fn from_object(object: &Object3D) -> Self {
        Self {
            model: *object.transform.get_world_matrix(),
            flags: Vec4::new(
                object.receive_shadow as u8 as f32,
                object.cast_shadow as u8 as f32,
                0.0,
                0.0,
            ),
        }
    }

    pub fn casts_shadow(&self) -> bool {
        self.flags.y > 0.5
    }

    pub fn descriptor() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Instance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        }
    }
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    5 => Float32x4,
    6 => Float32x4,
    7 => Float32x4,
    8 => Float32x4,
    9 => Float32x4
];

pub struct Instances {
    instances: Vec<Instance>,
    changed: bool,
}

impl Instances {
    pub fn new() -> Self {
        Self {
            instances: Vec::new(),
            changed: false,
        }
    }

    pub fn add(&mut self, instance: Instance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Whether any instance moved since the buffer was last written. Resets the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn as_slice(&self) -> &[Instance] {
        &self.instances
    }

    pub fn should_render(&self) -> bool {
        !self.instances.is_empty()
    }

    pub fn any_casts_shadow(&self) -> bool {
        self.instances.iter().any(Instance::casts_shadow)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

/// Per-model instance buffer. Grows to the next power of two when a frame needs more room.
pub struct InstanceBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: String,
}

impl InstanceBuffer {
    const INITIAL_CAPACITY: u64 = 4;

    pub fn new(device: &wgpu::Device, name: &str) -> Self {
        let label = format!("Instance buffer ({})", name);
        let buffer = Self::create_buffer(device, &label, Self::INITIAL_CAPACITY);

        Self {
            buffer,
            capacity: Self::INITIAL_CAPACITY,
            label,
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size_of::<Instance>() as u64 * capacity,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &Instances) {
        let needed = instances.len() as u64;

        if needed > self.capacity {
            self.capacity = needed.next_power_of_two();
            self.buffer = Self::create_buffer(device, &self.label, self.capacity);
            log::debug!("Grew {} to {} instances", self.label, self.capacity);
        }

        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(instances.as_slice()));
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer.slice(..));
    }
}
