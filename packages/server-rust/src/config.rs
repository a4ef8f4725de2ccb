//! Configuration types for the session layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Environment variable holding the service sub-directory under the base path.
pub const MS_PATH_ENV: &str = "MS_PATH";

/// Default lifetime of a cached client record.
pub const DEFAULT_CLIENT_TTL: Duration = Duration::from_secs(10 * 60);

/// Key of the client model section inside the service settings document.
pub const CLIENT_SETTINGS_KEY: &str = "clients";

/// Configuration of the [`ClientCache`](crate::cache::ClientCache).
#[derive(Debug, Clone)]
pub struct ClientCacheConfig {
    /// Time-to-live of an entry from the moment it was fetched.
    pub ttl: Duration,
    /// Upper bound on a single backing-store lookup. `None` = wait indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl Default for ClientCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CLIENT_TTL,
            fetch_timeout: None,
        }
    }
}

impl ClientCacheConfig {
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

/// Where the client store implementation is registered.
///
/// Resolves to `<base_dir>/<ms_path>/models/client`, the key under which the
/// host registers its store in a [`ClientStoreRegistry`](crate::store::ClientStoreRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    /// Service root directory (the process working directory by default).
    pub base_dir: PathBuf,
    /// Optional sub-directory taken from `MS_PATH`.
    pub ms_path: Option<String>,
}

impl StoreLocation {
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ms_path: None,
        }
    }

    #[must_use]
    pub fn with_ms_path(mut self, ms_path: impl Into<String>) -> Self {
        self.ms_path = Some(ms_path.into());
        self
    }

    /// Builds the location from the working directory and `MS_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current working directory cannot be read.
    pub fn from_env() -> std::io::Result<Self> {
        Ok(Self {
            base_dir: std::env::current_dir()?,
            ms_path: std::env::var(MS_PATH_ENV).ok().filter(|p| !p.is_empty()),
        })
    }

    /// Full path of the client model.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        let mut path = self.base_dir.clone();
        if let Some(ms_path) = &self.ms_path {
            path.push(ms_path);
        }
        path.join("models").join("client")
    }

    /// Registry key of the client model (the model path rendered as a string).
    #[must_use]
    pub fn key(&self) -> String {
        self.model_path().display().to_string()
    }
}

/// Table and database settings of the client model.
///
/// Read from the `clients` section of the service settings; any missing
/// key falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientModelSettings {
    pub table: String,
    pub database_key: String,
}

impl Default for ClientModelSettings {
    fn default() -> Self {
        Self {
            table: "clients".to_string(),
            database_key: "_default".to_string(),
        }
    }
}

impl ClientModelSettings {
    /// Fields exposed by the client model.
    pub const FIELDS: [&'static str; 2] = ["name", "storename"];

    /// Extracts the client model settings from a full settings document.
    ///
    /// A missing or non-object `clients` section yields the defaults.
    #[must_use]
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        settings
            .get(CLIENT_SETTINGS_KEY)
            .and_then(|section| serde_json::from_value(section.clone()).ok())
            .unwrap_or_default()
    }

    /// Reads a service settings document from `path` and extracts the
    /// client model settings from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub async fn from_settings_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading service settings from {}", path.display()))?;
        let settings: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing service settings from {}", path.display()))?;
        Ok(Self::from_settings(&settings))
    }
}
