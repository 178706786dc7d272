use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::animation::property::PropertyPath;
use crate::assets::{AssetNode, LoadedAsset};
use crate::model::Model;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    #[cfg(test)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Adds a mesh object at the root of the scene.
    pub fn spawn_model(&mut self, name: impl Into<String>, model: Model) -> ObjectId {
        let model_id = self.add_model(SceneModel::new(model));

        self.add_object(Object3D {
            model_id: Some(model_id),
            ..Object3D::named(name)
        })
    }

    /// Attaches a loaded asset under a new root group called `name`. Every object of the
    /// asset casts and receives shadows.
    pub fn spawn_asset(&mut self, name: &str, asset: LoadedAsset) -> ObjectId {
        let LoadedAsset { nodes, meshes } = asset;

        let model_ids: Vec<SceneModelId> = meshes
            .into_iter()
            .map(|model| self.add_model(SceneModel::new(model)))
            .collect();

        let root = self.add_object(Object3D::named(name));

        for node in nodes {
            self.spawn_asset_node(node, root, &model_ids);
        }

        self.traverse_mut(root, |object| {
            object.cast_shadow = true;
            object.receive_shadow = true;
        });

        root
    }

    fn spawn_asset_node(
        &mut self,
        node: AssetNode,
        parent: ObjectId,
        model_ids: &[SceneModelId],
    ) -> ObjectId {
        let mut object = Object3D::named(node.name);
        object
            .transform
            .set_transform(node.translation, node.rotation, node.scale);
        object.model_id = node.mesh.and_then(|index| model_ids.get(index).copied());

        let object_id = self.add_object(object);
        self.set_object_parent(object_id, Some(parent));

        for child in node.children {
            self.spawn_asset_node(child, object_id, model_ids);
        }

        object_id
    }

    /// Visits `root` and all of its descendants.
    pub fn traverse_mut(&mut self, root: ObjectId, mut visit: impl FnMut(&mut Object3D)) {
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if let Some(object) = self.objects.get_mut(id) {
                visit(object);
                stack.extend(object.child_ids.iter().copied());
            }
        }
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_object_transform_recursive(
        &self,
        object_id: ObjectId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        if let Some(object) = self.objects.get(object_id) {
            let changed = parent_changed || object.transform.is_world_dirty();

            if changed {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix, changed);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
            child.transform.invalidate_world();
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) -> bool {
        match self.objects.get_mut(object_id) {
            Some(object) => {
                object.transform.set_translation(translation);
                true
            }
            None => false,
        }
    }

    pub fn object_property(&self, object_id: ObjectId, path: PropertyPath) -> Option<f32> {
        self.objects
            .get(object_id)
            .map(|object| object.transform.get(path))
    }

    /// Writes one transform axis. Returns `false` when the object does not exist.
    pub fn set_object_property(
        &mut self,
        object_id: ObjectId,
        path: PropertyPath,
        value: f32,
    ) -> bool {
        match self.objects.get_mut(object_id) {
            Some(object) => {
                object.transform.set(path, value);
                true
            }
            None => false,
        }
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    pub fn early_update(&mut self) {
        for (_, object) in self.objects.iter() {
            object.transform.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{assets::AssetNode, model::Model};

    fn node(name: &str, translation: Vec3, children: Vec<AssetNode>) -> AssetNode {
        AssetNode {
            name: name.to_string(),
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            children,
        }
    }

    #[test]
    fn spawned_assets_cast_and_receive_shadows() {
        let mut scene = Scene::new();
        let mut mesh_node = node("Mesh", Vec3::ZERO, Vec::new());
        mesh_node.mesh = Some(0);
        let asset = LoadedAsset {
            nodes: vec![node("Root", Vec3::ZERO, vec![mesh_node])],
            meshes: vec![Model::plane("quad", 1.0, 1.0, [1.0; 4])],
        };

        let root = scene.spawn_asset("box", asset);

        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.get_object(root).unwrap().name, "box");
        assert!(scene
            .objects
            .iter()
            .all(|(_, object)| object.cast_shadow && object.receive_shadow));
        let mesh = scene.get_object_by_name("Mesh").unwrap();
        assert!(scene.get_object(mesh).unwrap().model_id.is_some());
    }

    #[test]
    fn world_matrices_follow_the_root_group() {
        let mut scene = Scene::new();
        let asset = LoadedAsset {
            nodes: vec![node("Child", Vec3::new(0.0, 1.0, 0.0), Vec::new())],
            meshes: Vec::new(),
        };
        let root = scene.spawn_asset("shoes", asset);
        let child = scene.get_object_by_name("Child").unwrap();

        scene.late_update();
        scene.set_object_translation(root, Vec3::new(2.0, 0.0, 0.0));
        scene.late_update();

        let world = *scene.get_object_transform(child).unwrap().get_world_matrix();
        assert_eq!(world.w_axis.truncate(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn writes_to_missing_objects_are_rejected() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object3D::named("ghost"));

        let path = "position.x".parse().unwrap();
        assert!(scene.set_object_property(id, path, 1.0));

        let mut empty = Scene::new();
        assert!(!empty.set_object_property(id, path, 1.0));
        assert_eq!(empty.object_property(id, path), None);
    }
}
