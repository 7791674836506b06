//! Configuration, loaded from `<config dir>/feature-atlas/config.json` and
//! overridden by `FEATURE_ATLAS_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::explorer::DisplayPrefs;
use crate::models::GraphMode;
use crate::source::{DirectorySource, FeatureSource, HttpSource};
use crate::tree::ValidationPolicy;

const APP_NAME: &str = "feature-atlas";
const CONFIG_FILE: &str = "config.json";

/// Where feature documents are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    /// A directory with `tree.json`, `tangling.json` and `featureHistory.json`.
    Dir(PathBuf),
    /// A host bridge answering `GET {url}/query?request=...`.
    Url(String),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Dir(PathBuf::from("."))
    }
}

impl SourceConfig {
    pub fn build(&self) -> Arc<dyn FeatureSource> {
        match self {
            Self::Dir(path) => Arc::new(DirectorySource::new(path.clone())),
            Self::Url(url) => Arc::new(HttpSource::new(url.clone())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    /// Port for `fatlas serve`.
    pub port: u16,
    /// Whether invariant violations reject a dataset or are only logged.
    pub validation: ValidationPolicy,
    /// Show feature identifiers as labels and make them searchable.
    pub show_identifiers: bool,
    pub tangling_mode: GraphMode,
    /// Refresh interval for `fatlas serve`. `None` disables automatic fetching.
    pub auto_fetch_minutes: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            port: 3000,
            validation: ValidationPolicy::Strict,
            show_identifiers: true,
            tangling_mode: GraphMode::Circular,
            auto_fetch_minutes: None,
        }
    }
}

impl Config {
    /// Load the config file and apply environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Apply `FEATURE_ATLAS_*` overrides looked up through `lookup`.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup("FEATURE_ATLAS_SOURCE_DIR") {
            self.source = SourceConfig::Dir(PathBuf::from(dir));
        }
        if let Some(url) = lookup("FEATURE_ATLAS_SOURCE_URL") {
            self.source = SourceConfig::Url(url);
        }
        if let Some(port) = lookup("FEATURE_ATLAS_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring FEATURE_ATLAS_PORT={}", port),
            }
        }
        if let Some(policy) = lookup("FEATURE_ATLAS_VALIDATION") {
            match ValidationPolicy::from_str(&policy) {
                Some(policy) => self.validation = policy,
                None => tracing::warn!("Ignoring FEATURE_ATLAS_VALIDATION={}", policy),
            }
        }
        if let Some(show) = lookup("FEATURE_ATLAS_SHOW_IDS") {
            match show.parse() {
                Ok(show) => self.show_identifiers = show,
                Err(_) => tracing::warn!("Ignoring FEATURE_ATLAS_SHOW_IDS={}", show),
            }
        }
        if let Some(mode) = lookup("FEATURE_ATLAS_TANGLING_MODE") {
            match GraphMode::from_str(&mode) {
                Some(mode) => self.tangling_mode = mode,
                None => tracing::warn!("Ignoring FEATURE_ATLAS_TANGLING_MODE={}", mode),
            }
        }
        if let Some(minutes) = lookup("FEATURE_ATLAS_AUTO_FETCH") {
            match minutes.parse::<u64>() {
                Ok(0) => self.auto_fetch_minutes = None,
                Ok(minutes) => self.auto_fetch_minutes = Some(minutes),
                Err(_) => tracing::warn!("Ignoring FEATURE_ATLAS_AUTO_FETCH={}", minutes),
            }
        }
        self
    }

    pub fn display_prefs(&self) -> DisplayPrefs {
        DisplayPrefs {
            show_identifiers: self.show_identifiers,
            tangling_mode: self.tangling_mode,
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = Config::default().with_overrides(env(&[
            ("FEATURE_ATLAS_SOURCE_URL", "http://localhost:9000"),
            ("FEATURE_ATLAS_PORT", "4000"),
            ("FEATURE_ATLAS_VALIDATION", "warn"),
            ("FEATURE_ATLAS_SHOW_IDS", "false"),
            ("FEATURE_ATLAS_TANGLING_MODE", "normal"),
            ("FEATURE_ATLAS_AUTO_FETCH", "10"),
        ]));
        assert_eq!(
            config.source,
            SourceConfig::Url("http://localhost:9000".to_string())
        );
        assert_eq!(config.port, 4000);
        assert_eq!(config.validation, ValidationPolicy::Warn);
        assert!(!config.show_identifiers);
        assert_eq!(config.tangling_mode, GraphMode::Normal);
        assert_eq!(config.auto_fetch_minutes, Some(10));
    }

    #[test]
    fn bad_overrides_are_ignored() {
        let config = Config::default().with_overrides(env(&[
            ("FEATURE_ATLAS_PORT", "eighty"),
            ("FEATURE_ATLAS_VALIDATION", "lenient"),
        ]));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn loads_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"source": {"dir": "/data/export"}, "port": 8080}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.source, SourceConfig::Dir(PathBuf::from("/data/export")));
        assert_eq!(config.port, 8080);
        assert!(config.show_identifiers);
    }
}
