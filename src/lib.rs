//! Loads glTF models from URLs into a scene, reusing a persistent file cache.
//!
//! [`UrlGltfComponent`] is the entry point: it resolves each URL to a local
//! file (cache hit or download) on a single worker thread and hands the file
//! to a [`ModelLoader`] attached to a fresh scene node.

pub mod core;
pub mod models;
pub mod output;
pub mod scene;
pub mod ui;

pub use crate::core::component::UrlGltfComponent;
pub use crate::core::error::LoadError;
pub use crate::core::events::{ChannelSink, EventSink, LoadEvent, TracingSink};
pub use crate::core::sequencer::{
    Collaborators, LoadRequest, LoadSequencer, LoadedModel, SequencerState,
};
pub use crate::core::settings::LoaderSettings;
pub use crate::models::{CacheKeyStrategy, Fetcher, HttpFetcher, LoadTicket, ModelCache};
pub use crate::scene::{GltfSourceLoader, InMemoryScene, ModelLoader, NodeId, SceneGraph};
pub use crate::ui::{LoadButton, RuntimePanel, TextField, UrlField};
