use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::{NodeId, SceneGraph};

const GLB_MAGIC: &[u8; 4] = b"glTF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GltfFormat {
    Binary,
    Json,
    Unknown,
}

/// Loader component attached to a scene node, pointing at a local model file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfComponent {
    pub uri: PathBuf,
    pub append_streaming_assets: bool,
    pub format: GltfFormat,
}

/// Hands a local file to the model parser. Parsing runs on the loader's own
/// schedule; nothing is reported back to the caller.
pub trait ModelLoader: Send + Sync {
    fn attach(&self, scene: &dyn SceneGraph, node: NodeId, source: &Path);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GltfSourceLoader;

impl ModelLoader for GltfSourceLoader {
    fn attach(&self, scene: &dyn SceneGraph, node: NodeId, source: &Path) {
        let format = match probe_format(source) {
            Ok(format) => format,
            Err(error) => {
                tracing::warn!("Unable to inspect {}: {error}", source.display());
                GltfFormat::Unknown
            }
        };
        let component = GltfComponent {
            uri: source.to_path_buf(),
            append_streaming_assets: false,
            format,
        };
        if !scene.add_component(node, component) {
            tracing::warn!("Scene node {node} vanished before the GLTF component was attached");
        }
    }
}

/// Distinguishes binary `.glb` containers from JSON `.gltf` documents.
pub fn probe_format(path: &Path) -> io::Result<GltfFormat> {
    let mut header = [0u8; 4];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < header.len() {
        let read = file.read(&mut header[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    let header = &header[..filled];

    if header == GLB_MAGIC {
        return Ok(GltfFormat::Binary);
    }
    match header.iter().find(|byte| !byte.is_ascii_whitespace()) {
        Some(b'{') => Ok(GltfFormat::Json),
        _ => Ok(GltfFormat::Unknown),
    }
}
