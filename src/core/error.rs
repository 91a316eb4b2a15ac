use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// Runtime UI wiring is incomplete; the feature stays disabled.
    #[error("runtime loading unavailable: {0}")]
    Configuration(String),
    #[error("no URL provided")]
    EmptyUrl,
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to download {url}: {message}")]
    Transport { url: String, message: String },
    #[error("failed to write {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("load of {url} superseded by a newer request")]
    Superseded { url: String },
    #[error("load service stopped before the request completed")]
    ServiceStopped,
}

impl LoadError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Storage {
            path: path.into(),
            source,
        }
    }
}
