use std::{fs, path::PathBuf};

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::error::LoadError;

/// Bytes that cannot appear in a file name on common platforms, plus `%` so
/// the re-encoding stays reversible.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[\x00-\x1f\x7f/\\:*?"<>|%]"#).expect("valid file name pattern")
});

const URL_HASH_PREFIX_LEN: usize = 16;

/// How a URL maps to a file name inside the cache root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheKeyStrategy {
    /// `<root>/<final path segment>`. Different URLs sharing a file name alias.
    #[default]
    FileName,
    /// `<root>/<sha256(url) prefix>-<final path segment>`.
    UrlHash,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub local_path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct ModelCache {
    root: PathBuf,
    strategy: CacheKeyStrategy,
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>, strategy: CacheKeyStrategy) -> Self {
        Self {
            root: root.into(),
            strategy,
        }
    }

    pub fn ensure_directory(&self) -> Result<(), LoadError> {
        fs::create_dir_all(&self.root).map_err(|error| LoadError::storage(&self.root, error))
    }

    /// Local path for `url`. Pure: the same URL always maps to the same path.
    pub fn path_for(&self, url: &Url) -> Result<PathBuf, LoadError> {
        Ok(self.root.join(cache_file_name(url, self.strategy)?))
    }

    /// Existing cache entry for `url`, if a regular file is present.
    pub fn lookup(&self, url: &Url) -> Result<Option<CachedFile>, LoadError> {
        let path = self.path_for(url)?;
        Ok(fs::metadata(&path)
            .ok()
            .filter(|meta| meta.is_file())
            .map(|meta| CachedFile {
                local_path: path,
                size_bytes: meta.len(),
            }))
    }
}

pub fn parse_url(raw: &str) -> Result<Url, LoadError> {
    Url::parse(raw.trim()).map_err(|error| LoadError::InvalidUrl {
        url: raw.to_string(),
        reason: error.to_string(),
    })
}

pub fn cache_file_name(url: &Url, strategy: CacheKeyStrategy) -> Result<String, LoadError> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| LoadError::InvalidUrl {
            url: url.to_string(),
            reason: "URL path has no file name".into(),
        })?;
    let file_name = sanitize(&percent_decode_str(segment).decode_utf8_lossy());

    Ok(match strategy {
        CacheKeyStrategy::FileName => file_name,
        CacheKeyStrategy::UrlHash => {
            let digest = Sha256::digest(url.as_str().as_bytes());
            let hex = format!("{:x}", digest);
            format!("{}-{}", &hex[..URL_HASH_PREFIX_LEN], file_name)
        }
    })
}

/// Re-encodes unsafe bytes of a decoded segment as `%XX`. A leading `.` is
/// encoded too, so entries are never hidden, never `.` or `..`, and never
/// collide with staging files.
fn sanitize(segment: &str) -> String {
    let clean = UNSAFE_CHARS.replace_all(segment, |caps: &Captures| {
        format!("%{:02X}", caps[0].as_bytes()[0])
    });
    match clean.strip_prefix('.') {
        Some(rest) => format!("%2E{rest}"),
        None => clean.into_owned(),
    }
}
