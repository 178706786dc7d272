use std::{
    panic::{self, AssertUnwindSafe},
    path::PathBuf,
    sync::mpsc::{channel, Receiver, TryRecvError},
};

use crate::{
    assets::{LoadError, LoadRequest, LoadedAsset, ModelRegistry},
    scene_graph::{ObjectId, Scene},
};

struct LoadEvent {
    index: usize,
    result: Result<LoadedAsset, LoadError>,
}

#[derive(Debug)]
pub struct LoadFailure {
    pub name: String,
    pub path: PathBuf,
    pub error: LoadError,
}

/// Result of a finished batch. `registry` holds every model that loaded.
#[derive(Debug)]
pub struct BatchOutcome {
    pub registry: ModelRegistry,
    pub failures: Vec<LoadFailure>,
}

/// A batch of model loads running on the rayon pool.
///
/// Each model is attached to the scene as soon as it arrives, but the batch only completes
/// once every request has reported back.
pub struct PendingBatch {
    receiver: Receiver<LoadEvent>,
    requests: Vec<Option<LoadRequest>>,
    resolved: Vec<(String, ObjectId)>,
    failures: Vec<LoadFailure>,
    finished: bool,
}

/// Starts loading every request. Requests are consumed; a batch is loaded exactly once.
pub fn load_batch(requests: Vec<LoadRequest>) -> PendingBatch {
    let (sender, receiver) = channel();

    for (index, request) in requests.iter().enumerate() {
        let sender = sender.clone();
        let path = request.path.clone();

        rayon::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| LoadedAsset::import(&path)))
                .unwrap_or(Err(LoadError::Panicked));

            if sender.send(LoadEvent { index, result }).is_err() {
                log::debug!("Load of {:?} finished after its batch was dropped", path);
            }
        });
    }

    log::info!("Loading {} models", requests.len());

    PendingBatch {
        receiver,
        requests: requests.into_iter().map(Some).collect(),
        resolved: Vec::new(),
        failures: Vec::new(),
        finished: false,
    }
}

impl PendingBatch {
    pub fn total(&self) -> usize {
        self.requests.len()
    }

    pub fn reported(&self) -> usize {
        self.resolved.len() + self.failures.len()
    }

    /// Attaches whatever has arrived since the last call. Returns the outcome exactly once,
    /// on the call that observes the last report.
    pub fn poll(&mut self, scene: &mut Scene) -> Option<BatchOutcome> {
        if self.finished {
            return None;
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) => self.handle_event(event, scene),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.fail_unreported();
                    break;
                }
            }
        }

        if self.reported() < self.total() {
            return None;
        }

        self.finished = true;
        let registry = ModelRegistry::from_entries(std::mem::take(&mut self.resolved));
        let failures = std::mem::take(&mut self.failures);

        log::info!(
            "Model batch complete: {} loaded, {} failed",
            registry.len(),
            failures.len()
        );

        Some(BatchOutcome { registry, failures })
    }

    fn handle_event(&mut self, event: LoadEvent, scene: &mut Scene) {
        let Some(request) = self.requests.get_mut(event.index).and_then(Option::take) else {
            log::warn!("Ignoring duplicate load report for request {}", event.index);
            return;
        };

        match event.result {
            Ok(asset) => {
                let root = scene.spawn_asset(&request.name, asset);
                log::info!("Loaded model {} from {:?}", request.name, request.path);
                self.resolved.push((request.name, root));
            }
            Err(error) => {
                log::error!(
                    "Failed to load model {} from {:?}: {}",
                    request.name,
                    request.path,
                    error
                );
                self.failures.push(LoadFailure {
                    name: request.name,
                    path: request.path,
                    error,
                });
            }
        }
    }

    fn fail_unreported(&mut self) {
        for request in self.requests.iter_mut().filter_map(Option::take) {
            log::error!("Load of model {} never reported back", request.name);
            self.failures.push(LoadFailure {
                name: request.name,
                path: request.path,
                error: LoadError::WorkerLost,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        path::Path,
        time::{Duration, Instant},
    };

    use super::*;

    // One triangle with an embedded buffer.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "name": "Body", "mesh": 0, "translation": [0.0, 1.0, 0.0] }],
        "meshes": [{ "name": "Body", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }]
    }"#;

    fn scratch_dir(test: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "scrollstage-{}-{}",
            test,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_model(dir: &Path, file: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, TRIANGLE_GLTF).unwrap();
        path
    }

    fn wait_for(batch: &mut PendingBatch, scene: &mut Scene) -> BatchOutcome {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(outcome) = batch.poll(scene) {
                return outcome;
            }
            assert!(Instant::now() < deadline, "batch never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn registry_is_only_produced_after_every_model_loaded() {
        let dir = scratch_dir("join");
        let requests = vec![
            LoadRequest::new("box", write_model(&dir, "box.gltf")),
            LoadRequest::new("shoes", write_model(&dir, "air.gltf")),
        ];

        let mut scene = Scene::new();
        let mut batch = load_batch(requests);
        assert_eq!(batch.total(), 2);

        let outcome = wait_for(&mut batch, &mut scene);

        assert!(outcome.failures.is_empty());
        assert!(outcome.registry.get("box").is_some());
        assert!(outcome.registry.get("shoes").is_some());
        assert!(scene.get_object_by_name("Body").is_some());
        assert!(batch.poll(&mut scene).is_none(), "outcome is reported once");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn failed_items_are_reported_individually() {
        let dir = scratch_dir("failure");
        let requests = vec![
            LoadRequest::new("box", write_model(&dir, "box.gltf")),
            LoadRequest::new("shoes", dir.join("missing.gltf")),
        ];

        let mut scene = Scene::new();
        let mut batch = load_batch(requests);
        let outcome = wait_for(&mut batch, &mut scene);

        assert!(outcome.registry.contains("box"));
        assert!(!outcome.registry.contains("shoes"));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, "shoes");
        assert!(matches!(outcome.failures[0].error, LoadError::Import(_)));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn empty_batch_completes_immediately() {
        let mut scene = Scene::new();
        let mut batch = load_batch(Vec::new());

        let outcome = batch.poll(&mut scene).unwrap();
        assert_eq!(outcome.registry.len(), 0);
    }

    #[test]
    fn loaded_meshes_keep_their_node_transform() {
        let dir = scratch_dir("transform");
        let asset = LoadedAsset::import(&write_model(&dir, "box.gltf")).unwrap();

        assert_eq!(asset.meshes.len(), 1);
        assert_eq!(asset.meshes[0].primitives[0].vertices.len(), 3);
        assert_eq!(asset.nodes[0].translation, glam::Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(asset.nodes[0].mesh, Some(0));

        fs::remove_dir_all(dir).ok();
    }
}
