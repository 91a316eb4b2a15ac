use std::path::PathBuf;

use crossbeam_channel::Sender;
use serde::Serialize;

use crate::output::logs;
use crate::scene::NodeId;

pub const EVENT_LOAD_STATUS: &str = "load-status";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LoadEvent {
    #[serde(rename_all = "camelCase")]
    CacheHit { url: String, path: PathBuf },
    #[serde(rename_all = "camelCase")]
    DownloadStarted { url: String, path: PathBuf },
    #[serde(rename_all = "camelCase")]
    DownloadProgress {
        url: String,
        downloaded: u64,
        total: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    DownloadFailed { url: String, message: String },
    /// The request was rejected before any download started.
    #[serde(rename_all = "camelCase")]
    LoadFailed { url: String, message: String },
    #[serde(rename_all = "camelCase")]
    ModelAttached { node: NodeId, path: PathBuf },
    EmptyUrlSubmitted,
    #[serde(rename_all = "camelCase")]
    UiUnavailable { reason: String },
    #[serde(rename_all = "camelCase")]
    RequestSuperseded { url: String },
}

/// Receives load status notifications. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LoadEvent);
}

/// Logs each event through `tracing` and keeps a copy in the log buffer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &LoadEvent) {
        match event {
            LoadEvent::CacheHit { path, .. } => {
                tracing::info!("Loading model from cache: {}", path.display());
            }
            LoadEvent::DownloadStarted { url, path } => {
                tracing::info!("Downloading model {url} -> {}", path.display());
            }
            LoadEvent::DownloadProgress {
                url,
                downloaded,
                total,
            } => {
                tracing::debug!(url = %url, downloaded, total = ?total, "download progress");
                // Progress is too chatty for the log buffer.
                return;
            }
            LoadEvent::DownloadFailed { message, .. } => {
                tracing::error!("Failed to download and load model: {message}");
            }
            LoadEvent::LoadFailed { url, message } => {
                tracing::error!("Cannot load model from {url:?}: {message}");
            }
            LoadEvent::ModelAttached { node, path } => {
                tracing::info!("GLTF component added to {node} with URI {}", path.display());
            }
            LoadEvent::EmptyUrlSubmitted => {
                tracing::warn!("Please enter a valid URL.");
            }
            LoadEvent::UiUnavailable { reason } => {
                tracing::error!("Runtime loading disabled: {reason}");
            }
            LoadEvent::RequestSuperseded { url } => {
                tracing::warn!("Skipping load of {url}: a newer request is pending");
            }
        }
        logs::push_log(describe(event));
    }
}

/// Forwards events to a host, e.g. a frontend bridge. Dropped receivers are ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<LoadEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<LoadEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &LoadEvent) {
        let _ = self.sender.send(event.clone());
    }
}

fn describe(event: &LoadEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("{EVENT_LOAD_STATUS} {json}"),
        Err(_) => format!("{EVENT_LOAD_STATUS} {event:?}"),
    }
}
