use id_arena::Id;

use crate::{model::Model, rendering::render_model::RenderModelId};

pub type SceneModelId = Id<SceneModel>;

/// CPU-side mesh data shared by every object that draws it. The renderer uploads it
/// the first time it sees the model and records the GPU handle here.
pub struct SceneModel {
    pub model: Model,
    pub render_model: Option<RenderModelId>,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            render_model: None,
        }
    }
}
