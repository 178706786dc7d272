use std::path::Path;

use glam::{Quat, Vec3};

use crate::{assets::LoadError, model::Model};

/// A node of an imported scene hierarchy.
#[derive(Debug, Clone)]
pub struct AssetNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Index into [`LoadedAsset::meshes`].
    pub mesh: Option<usize>,
    pub children: Vec<AssetNode>,
}

/// CPU-side result of importing one glTF file. Owns everything, so it can be decoded on a
/// worker thread and handed to the scene later.
pub struct LoadedAsset {
    pub nodes: Vec<AssetNode>,
    pub meshes: Vec<Model>,
}

impl LoadedAsset {
    pub fn import(path: &Path) -> Result<Self, LoadError> {
        let (document, buffers, _images) = gltf::import(path)?;

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or(LoadError::NoScene)?;

        let meshes = document
            .meshes()
            .map(|mesh| {
                let name = mesh
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("Mesh {}", mesh.index()));
                Model::from_gltf(name, mesh, &buffers)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let nodes = scene.nodes().map(|node| convert_node(&node)).collect();

        Ok(Self { nodes, meshes })
    }
}

fn convert_node(node: &gltf::Node) -> AssetNode {
    let (translation, rotation, scale) = node.transform().decomposed();

    AssetNode {
        name: node.name().unwrap_or("Unnamed").to_string(),
        translation: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
        mesh: node.mesh().map(|mesh| mesh.index()),
        children: node.children().map(|child| convert_node(&child)).collect(),
    }
}
