use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vault::DEFAULT_MAX_UPLOAD_BYTES;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "DOCSEARCH_API_URL";
pub const DATA_DIR_ENV: &str = "DOCSEARCH_DATA_DIR";

/// Client configuration, read from `config.toml`. Every field is optional in
/// the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Base URL of the search backend.
    pub api_url: String,
    /// Where the session store and document cache live. Supports `~`.
    /// Defaults to the platform data directory.
    pub data_dir: Option<String>,
    /// Largest file `upload` will send, in bytes.
    pub max_upload_bytes: u64,
    /// Number of chunks to retrieve when `--top-k` is not given.
    pub default_top_k: usize,
    /// Ask the backend for a synthesized answer by default.
    pub use_rag: bool,
    /// Per-request timeout in seconds. Unset means wait indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// Default tracing filter when neither `RUST_LOG` nor `-v` is given.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_top_k: 5,
            use_rag: true,
            request_timeout_secs: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location. A missing file yields
    /// defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match path {
            Some(ref p) if p.exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config {}", p.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Invalid config {}", p.display()))?
            }
            _ => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(dir);
        }
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(shellexpand::tilde(dir).to_string())),
            None => project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .context("Could not determine a data directory; set data_dir in config.toml"),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "docsearch", "docsearch")
}
