use std::{path::PathBuf, sync::Arc};

use parking_lot::Mutex;
use serde::Serialize;

use crate::core::error::LoadError;
use crate::core::events::{EventSink, LoadEvent};
use crate::models::{download_to_path, parse_url, Fetcher, ModelCache};
use crate::scene::{ModelLoader, NodeId, SceneGraph};

pub const LOADED_MODEL_NODE: &str = "LoadedModel";

/// One load attempt. Cache usage is fixed when the request is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub source_url: String,
    pub use_cache: bool,
}

impl LoadRequest {
    pub fn new(source_url: impl Into<String>, use_cache: bool) -> Self {
        Self {
            source_url: source_url.into(),
            use_cache,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedModel {
    pub node: NodeId,
    pub local_path: PathBuf,
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SequencerState {
    Idle,
    Fetching,
}

/// The host-side pieces a sequencer drives.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub scene: Arc<dyn SceneGraph>,
    pub loader: Arc<dyn ModelLoader>,
    pub events: Arc<dyn EventSink>,
}

/// Runs URL -> local file -> loader handoff and owns the single loaded-model slot.
pub struct LoadSequencer {
    cache: ModelCache,
    collaborators: Collaborators,
    state: Mutex<SequencerState>,
    loaded: Mutex<Option<LoadedModel>>,
}

impl LoadSequencer {
    pub fn new(cache: ModelCache, collaborators: Collaborators) -> Self {
        Self {
            cache,
            collaborators,
            state: Mutex::new(SequencerState::Idle),
            loaded: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SequencerState {
        *self.state.lock()
    }

    pub fn loaded_model(&self) -> Option<LoadedModel> {
        self.loaded.lock().clone()
    }

    /// Destroys the current model's node, leaving the slot empty.
    pub fn release_current(&self) -> Option<LoadedModel> {
        let previous = self.loaded.lock().take();
        if let Some(model) = &previous {
            if !self.collaborators.scene.destroy_node(model.node) {
                tracing::debug!("Node {} was already removed from the scene", model.node);
            }
        }
        previous
    }

    /// Releases the previous model, resolves the local file (cache or download),
    /// then attaches a fresh node to it. A failed fetch leaves the slot empty.
    pub fn load_model(&self, request: &LoadRequest) -> Result<LoadedModel, LoadError> {
        self.release_current();

        *self.state.lock() = SequencerState::Fetching;
        let resolved = self.resolve_local_path(request);
        *self.state.lock() = SequencerState::Idle;

        let local_path = match resolved {
            Ok(path) => path,
            Err(error) => {
                let url = request.source_url.clone();
                let message = error.to_string();
                let event = match error {
                    LoadError::Transport { .. } | LoadError::Storage { .. } => {
                        LoadEvent::DownloadFailed { url, message }
                    }
                    _ => LoadEvent::LoadFailed { url, message },
                };
                self.collaborators.events.emit(&event);
                return Err(error);
            }
        };

        let scene = self.collaborators.scene.as_ref();
        let node = scene.spawn_node(LOADED_MODEL_NODE);
        self.collaborators.loader.attach(scene, node, &local_path);

        let model = LoadedModel {
            node,
            local_path: local_path.clone(),
            source_url: request.source_url.clone(),
        };
        *self.loaded.lock() = Some(model.clone());
        self.collaborators.events.emit(&LoadEvent::ModelAttached {
            node,
            path: local_path,
        });
        Ok(model)
    }

    fn resolve_local_path(&self, request: &LoadRequest) -> Result<PathBuf, LoadError> {
        if request.source_url.trim().is_empty() {
            return Err(LoadError::EmptyUrl);
        }
        let url = parse_url(&request.source_url)?;
        let local_path = self.cache.path_for(&url)?;

        if request.use_cache {
            if let Some(hit) = self.cache.lookup(&url)? {
                self.collaborators.events.emit(&LoadEvent::CacheHit {
                    url: request.source_url.clone(),
                    path: hit.local_path.clone(),
                });
                return Ok(hit.local_path);
            }
        }

        self.cache.ensure_directory()?;
        self.collaborators.events.emit(&LoadEvent::DownloadStarted {
            url: request.source_url.clone(),
            path: local_path.clone(),
        });
        let events = &self.collaborators.events;
        let outcome = download_to_path(
            self.collaborators.fetcher.as_ref(),
            &url,
            &local_path,
            |downloaded, total| {
                events.emit(&LoadEvent::DownloadProgress {
                    url: request.source_url.clone(),
                    downloaded,
                    total,
                });
            },
        )?;
        tracing::debug!(
            "Stored {} bytes at {}",
            outcome.bytes_downloaded,
            outcome.final_path.display()
        );
        Ok(outcome.final_path)
    }
}
