use std::f32::consts::FRAC_PI_2;

use glam::Vec3;

use crate::{
    animation::{Scrub, Timeline},
    assets::{load_batch, BatchOutcome, LoadFailurePolicy, PendingBatch},
    camera::Camera,
    config::{Placement, PresentationConfig},
    markers::{LoadStatus, MarkerState},
    model::Model,
    scene_graph::{ObjectId, Scene},
    scroll::ScrollState,
    viewport::{Viewport, ViewportSize},
};

/// Where the presentation is in its lifecycle. A timeline exists only once the model batch
/// has completed.
pub enum Stage {
    Loading(PendingBatch),
    Ready(Timeline),
    /// Loading finished but no timeline could be built. The scene renders as placed.
    Static { failed: usize },
}

pub struct DemoState {
    pub config: PresentationConfig,
    pub camera: Camera,
    camera_target: Vec3,
    pub scene: Scene,
    pub scroll: ScrollState,
    pub viewport: Viewport,
    pub markers_enabled: bool,
    scrub: Scrub,
    stage: Stage,
    raw_progress: f32,
    progress: f32,
}

impl DemoState {
    pub fn new(config: PresentationConfig) -> Self {
        let batch = load_batch(config.models.clone());
        Self::with_stage(config, Stage::Loading(batch))
    }

    fn with_stage(config: PresentationConfig, stage: Stage) -> Self {
        let camera_config = &config.stage.camera;
        let camera_target = Vec3::from(camera_config.target);
        let camera = Camera {
            eye: Vec3::from(camera_config.position),
            target: camera_target,
            up: Vec3::Y,
            fov_y: camera_config.fov,
            aspect: 1.0,
            near: camera_config.near,
            far: camera_config.far,
        };

        let mut scene = Scene::new();
        let floor = &config.stage.floor;
        let floor_id = scene.spawn_model(
            "floor",
            Model::plane(
                "floor",
                floor.size,
                floor.size,
                floor.color.to_linear().extend(1.0).to_array(),
            ),
        );
        if let Some(object) = scene.get_object_mut(floor_id) {
            object.transform.set_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0));
            object.receive_shadow = true;
        }

        Self {
            camera,
            camera_target,
            scene,
            scroll: ScrollState::new(config.page.height_in_viewports),
            viewport: Viewport::default(),
            markers_enabled: config.timeline.markers,
            scrub: Scrub::new(config.timeline.scrub),
            stage,
            raw_progress: 0.0,
            progress: 0.0,
            config,
        }
    }

    /// Applies a new container size to the camera and the scroll page.
    pub fn resize(
        &mut self,
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
    ) -> Option<ViewportSize> {
        let size = self
            .viewport
            .resize(width, height, device_pixel_ratio, &mut self.camera)?;
        self.scroll.set_viewport_height(size.height);
        Some(size)
    }

    pub fn scroll_lines(&mut self, lines: f32) {
        self.scroll
            .scroll_by(lines * self.config.page.wheel_line_pixels);
    }

    pub fn update(&mut self, delta: f32) {
        if let Stage::Loading(batch) = &mut self.stage {
            if let Some(outcome) = batch.poll(&mut self.scene) {
                self.finish_loading(outcome);
            }
        }

        // Without a layout there is no scroll range to measure.
        if self.scroll.viewport_height() > 0.0 {
            self.raw_progress = self.config.timeline.trigger.progress(
                self.scroll.page(),
                self.scroll.viewport_height(),
                self.scroll.offset(),
            );
        }

        self.progress = self.scrub.update(self.raw_progress, delta);

        if let Stage::Ready(timeline) = &self.stage {
            timeline.apply(self.progress, &mut self.scene);
        }

        self.camera.look_at(self.camera_target);
    }

    fn finish_loading(&mut self, outcome: BatchOutcome) {
        log::debug!(
            "Models in scene: {:?}",
            outcome.registry.names().collect::<Vec<_>>()
        );

        for placement in &self.config.placements {
            if let Some(root) = outcome.registry.get(&placement.name) {
                apply_placement(&mut self.scene, root, placement);
            }
        }

        let mut spec = self.config.timeline.clone();
        let failed = outcome.failures.len();

        if outcome.registry.is_empty() && !self.config.models.is_empty() {
            log::warn!("No models loaded");
        }

        if failed > 0 {
            match self.config.load_failure_policy {
                LoadFailurePolicy::Abort => {
                    log::error!(
                        "{} of {} models failed to load, keeping the scene static",
                        failed,
                        self.config.models.len()
                    );
                    self.stage = Stage::Static { failed };
                    return;
                }
                LoadFailurePolicy::SkipMissing => {
                    let dropped = spec.retain_targets(|name| outcome.registry.contains(name));
                    log::warn!("Animating without failed models: {:?}", dropped);
                }
            }
        }

        self.stage = match Timeline::build(&spec, &outcome.registry, &self.scene) {
            Ok(timeline) => {
                log::info!(
                    "Timeline ready with {} tracks over {} sections",
                    timeline.track_count(),
                    timeline.sections().len()
                );
                Stage::Ready(timeline)
            }
            Err(error) => {
                log::error!("Failed to build timeline: {}", error);
                Stage::Static { failed }
            }
        };
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn marker_state(&self) -> MarkerState {
        let (section, boundaries, load_status) = match &self.stage {
            Stage::Loading(batch) => (
                None,
                Vec::new(),
                LoadStatus::Loading {
                    reported: batch.reported(),
                    total: batch.total(),
                },
            ),
            Stage::Ready(timeline) => (
                timeline.section_at(self.progress),
                timeline.section_boundaries(),
                LoadStatus::Ready,
            ),
            Stage::Static { failed } => (None, Vec::new(), LoadStatus::Static { failed: *failed }),
        };

        MarkerState {
            scroll_offset: self.scroll.offset(),
            max_offset: self.scroll.max_offset(),
            range: self
                .config
                .timeline
                .trigger
                .range(self.scroll.page(), self.scroll.viewport_height()),
            raw_progress: self.raw_progress,
            progress: self.progress,
            section,
            boundaries,
            load_status,
        }
    }
}

fn apply_placement(scene: &mut Scene, root: ObjectId, placement: &Placement) {
    let Some(object) = scene.get_object_mut(root) else {
        return;
    };

    if let Some(position) = placement.position {
        object.transform.set_translation(Vec3::from(position));
    }
    if let Some(rotation) = placement.rotation {
        object.transform.set_rotation(Vec3::from(rotation));
    }
    if let Some(scale) = placement.scale {
        object.transform.set_scale(Vec3::from(scale));
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::{
        assets::{LoadError, LoadFailure, ModelRegistry},
        scene_graph::Object3D,
    };

    fn state_with(policy: LoadFailurePolicy) -> (DemoState, ObjectId) {
        let config = PresentationConfig {
            load_failure_policy: policy,
            ..Default::default()
        };
        let mut state = DemoState::with_stage(config, Stage::Static { failed: 0 });
        let boxy = state.scene.add_object(Object3D::named("box"));
        state.resize(800.0, 600.0, 1.0);

        (state, boxy)
    }

    fn shoes_failed(boxy: ObjectId) -> BatchOutcome {
        BatchOutcome {
            registry: ModelRegistry::from_entries([("box", boxy)]),
            failures: vec![LoadFailure {
                name: "shoes".into(),
                path: PathBuf::from("assets/air.gltf"),
                error: LoadError::WorkerLost,
            }],
        }
    }

    fn translation(state: &DemoState, id: ObjectId) -> Vec3 {
        state.scene.get_object_transform(id).unwrap().translation()
    }

    #[test]
    fn placements_are_applied_before_the_timeline_reads_start_values() {
        let (mut state, boxy) = state_with(LoadFailurePolicy::SkipMissing);
        state.finish_loading(shoes_failed(boxy));

        assert_eq!(translation(&state, boxy), Vec3::new(-6.0, 0.1, 0.0));

        state.update(0.0);
        assert_eq!(translation(&state, boxy), Vec3::new(-6.0, 0.1, 0.0));
    }

    #[test]
    fn abort_policy_keeps_the_scene_static() {
        let (mut state, boxy) = state_with(LoadFailurePolicy::Abort);
        state.finish_loading(shoes_failed(boxy));

        assert!(matches!(state.stage(), Stage::Static { failed: 1 }));

        state.scroll.end();
        state.update(1.0);
        assert_eq!(translation(&state, boxy), Vec3::new(-6.0, 0.1, 0.0));
    }

    #[test]
    fn skip_missing_animates_the_models_that_loaded() {
        let (mut state, boxy) = state_with(LoadFailurePolicy::SkipMissing);
        state.finish_loading(shoes_failed(boxy));

        assert!(matches!(state.stage(), Stage::Ready(_)));

        // The first sample is not smoothed, so the end of the page lands on the end state.
        state.scroll.end();
        state.update(1.0 / 60.0);
        assert!((translation(&state, boxy).x - 3.0).abs() < 1e-4);
        assert_eq!(state.marker_state().section, Some(2));
    }

    #[test]
    fn progress_is_smoothed_towards_the_scroll_position() {
        let (mut state, boxy) = state_with(LoadFailurePolicy::SkipMissing);
        state.finish_loading(shoes_failed(boxy));

        state.update(1.0 / 60.0);
        assert_eq!(state.progress(), 0.0);

        state.scroll.end();
        state.update(1.0 / 60.0);
        assert!(state.progress() > 0.0 && state.progress() < 1.0);

        for _ in 0..120 {
            state.update(1.0 / 60.0);
        }
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn floor_lies_flat_and_only_receives_shadows() {
        let (state, _) = state_with(LoadFailurePolicy::Abort);
        let floor_id = state.scene.get_object_by_name("floor").unwrap();
        let floor = state.scene.get_object(floor_id).unwrap();

        assert!(floor.receive_shadow && !floor.cast_shadow);
        let normal = floor.transform.quaternion() * Vec3::Z;
        assert!((normal - Vec3::Y).length() < 1e-5);
    }
}
