use std::{collections::HashMap, fmt};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GltfComponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0.simple())
    }
}

/// Host scene the loaded models live in.
pub trait SceneGraph: Send + Sync {
    fn spawn_node(&self, name: &str) -> NodeId;
    /// Returns `false` when the node was already gone.
    fn destroy_node(&self, id: NodeId) -> bool;
    /// Returns `false` when the node does not exist.
    fn add_component(&self, id: NodeId, component: GltfComponent) -> bool;
    fn node_count(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub components: Vec<GltfComponent>,
}

#[derive(Debug, Default)]
pub struct InMemoryScene {
    nodes: RwLock<HashMap<NodeId, SceneNode>>,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<SceneNode> {
        self.nodes.read().get(&id).cloned()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.read().keys().copied().collect()
    }
}

impl SceneGraph for InMemoryScene {
    fn spawn_node(&self, name: &str) -> NodeId {
        let id = NodeId::new();
        self.nodes.write().insert(
            id,
            SceneNode {
                name: name.to_string(),
                components: Vec::new(),
            },
        );
        id
    }

    fn destroy_node(&self, id: NodeId) -> bool {
        self.nodes.write().remove(&id).is_some()
    }

    fn add_component(&self, id: NodeId, component: GltfComponent) -> bool {
        match self.nodes.write().get_mut(&id) {
            Some(node) => {
                node.components.push(component);
                true
            }
            None => false,
        }
    }

    fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}
