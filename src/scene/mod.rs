mod gltf;
mod graph;

pub use gltf::{probe_format, GltfComponent, GltfFormat, GltfSourceLoader, ModelLoader};
pub use graph::{InMemoryScene, NodeId, SceneGraph, SceneNode};
