use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use gltf::buffer;
use itertools::izip;

use crate::assets::LoadError;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    position: Vec3,
    normal: Vec3,
    /// Linear base color, material factor multiplied with any vertex color.
    color: [f32; 4],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Self {
            position,
            normal,
            color: color.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> Result<Model, LoadError> {
        let mut model = Model {
            name: name.into(),
            primitives: Vec::new(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(LoadError::UnsupportedPrimitive {
                    mesh: model.name,
                    mode: format!("{:?}", primitive.mode()),
                });
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d[..]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| LoadError::MissingAttribute {
                    mesh: model.name.clone(),
                    attribute: "POSITION",
                })?
                .map(Vec3::from)
                .collect();

            // Flat up-facing normals are good enough for meshes exported without them.
            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(normals) => normals.map(Vec3::from).collect(),
                None => vec![Vec3::Y; positions.len()],
            };

            let base_color = Vec4::from(
                primitive
                    .material()
                    .pbr_metallic_roughness()
                    .base_color_factor(),
            );
            let colors: Vec<Vec4> = match reader.read_colors(0) {
                Some(colors) => colors
                    .into_rgba_f32()
                    .map(|color| Vec4::from(color) * base_color)
                    .collect(),
                None => vec![base_color; positions.len()],
            };

            let vertices = izip!(positions, normals, colors)
                .map(|(position, normal, color)| Vertex::new(position, normal, color))
                .collect::<Vec<Vertex>>();

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertices.len() as u32).collect(),
            };

            model.primitives.push(ModelPrimitive {
                index: primitive.index(),
                vertices,
                indices,
            });
        }

        if model.primitives.is_empty() {
            return Err(LoadError::EmptyMesh(model.name));
        }

        Ok(model)
    }

    /// A `width` × `height` plane in the XY plane facing +Z, centered on the origin.
    pub fn plane(name: impl Into<String>, width: f32, height: f32, color: [f32; 4]) -> Model {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let color = Vec4::from(color);

        let vertices = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .into_iter()
            .map(|(x, y)| Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, color))
            .collect();

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                vertices,
                indices: vec![0, 1, 2, 0, 2, 3],
            }],
        }
    }
}

pub const VERTEX_BUFFER_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x4,
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_faces_positive_z() {
        let plane = Model::plane("floor", 100.0, 100.0, [0.1, 0.1, 0.1, 1.0]);
        let primitive = &plane.primitives[0];

        assert_eq!(primitive.vertices.len(), 4);
        assert_eq!(primitive.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(primitive.vertices[2].position(), Vec3::new(50.0, 50.0, 0.0));

        // Counter-clockwise when seen from +Z.
        let [a, b, c] = [0, 1, 2].map(|i| primitive.vertices[i].position());
        assert!((b - a).cross(c - a).z > 0.0);
    }

    #[test]
    fn vertex_layout_matches_struct_size() {
        assert_eq!(VERTEX_BUFFER_LAYOUT.array_stride, 40);
    }
}
