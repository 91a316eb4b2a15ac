use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::models::CacheKeyStrategy;

const CONFIG_FILE: &str = "config.json";

pub const ENV_URL: &str = "GLTF_URL";
pub const ENV_USE_CACHE: &str = "GLTF_USE_CACHE";
pub const ENV_RUNTIME_LOADING: &str = "GLTF_RUNTIME_LOADING";
pub const ENV_CACHE_DIR: &str = "GLTF_CACHE_DIR";

/// Per-run loader configuration. Read once at startup and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderSettings {
    pub source_url: Option<String>,
    pub use_cache: bool,
    pub runtime_loading: bool,
    pub cache_key: CacheKeyStrategy,
    pub cache_dir: Option<PathBuf>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            source_url: None,
            use_cache: true,
            runtime_loading: false,
            cache_key: CacheKeyStrategy::FileName,
            cache_dir: None,
        }
    }
}

impl LoaderSettings {
    /// Settings file from the platform config directory, then environment overrides.
    pub fn load() -> Result<Self> {
        let path = resolve_config_path()?;
        let settings = load_settings(&path)?;
        Ok(settings.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies `GLTF_*` overrides looked up through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL) {
            let trimmed = url.trim();
            self.source_url = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Some(flag) = lookup(ENV_USE_CACHE).as_deref().and_then(parse_flag) {
            self.use_cache = flag;
        }
        if let Some(flag) = lookup(ENV_RUNTIME_LOADING).as_deref().and_then(parse_flag) {
            self.runtime_loading = flag;
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR).filter(|dir| !dir.trim().is_empty()) {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Configured cache directory, or `<data dir>/models` for this application.
    pub fn cache_root(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let project_dirs = project_dirs()?;
                Ok(project_dirs.data_dir().join("models"))
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!("Ignoring unrecognized boolean setting {other:?}");
            None
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "GltfUrlLoader", "GltfUrlLoader")
        .context("missing project directories")
}

fn resolve_config_path() -> Result<PathBuf> {
    let project_dirs = project_dirs()?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

pub fn load_settings(path: &Path) -> Result<LoaderSettings> {
    if !path.exists() {
        return Ok(LoaderSettings::default());
    }
    let bytes = fs::read(path).with_context(|| format!("failed reading {path:?}"))?;
    serde_json::from_slice(&bytes).context("config json could not be parsed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_enable_cache_and_disable_runtime_loading() {
        let settings = LoaderSettings::default();
        assert!(settings.use_cache);
        assert!(!settings.runtime_loading);
        assert_eq!(settings.source_url, None);
        assert_eq!(settings.cache_key, CacheKeyStrategy::FileName);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(&dir.path().join("config.json")).unwrap();
        assert_eq!(settings, LoaderSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "sourceUrl": "https://example.com/assets/duck.glb", "cacheKey": "url-hash" }"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(
            settings.source_url.as_deref(),
            Some("https://example.com/assets/duck.glb")
        );
        assert_eq!(settings.cache_key, CacheKeyStrategy::UrlHash);
        assert!(settings.use_cache);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_settings(&path).is_err());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            (ENV_URL, " https://example.com/a/b.gltf "),
            (ENV_USE_CACHE, "false"),
            (ENV_RUNTIME_LOADING, "1"),
            (ENV_CACHE_DIR, "/tmp/gltf-cache"),
        ]
        .into_iter()
        .collect();

        let settings = LoaderSettings::default()
            .with_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(
            settings.source_url.as_deref(),
            Some("https://example.com/a/b.gltf")
        );
        assert!(!settings.use_cache);
        assert!(settings.runtime_loading);
        assert_eq!(settings.cache_root().unwrap(), PathBuf::from("/tmp/gltf-cache"));
    }

    #[test]
    fn unrecognized_flag_leaves_value_untouched() {
        let settings = LoaderSettings::default()
            .with_overrides(|key| (key == ENV_USE_CACHE).then(|| "sometimes".to_string()));
        assert!(settings.use_cache);
    }
}
