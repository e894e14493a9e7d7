//! Modal settings: named configuration buckets over a mandatory default.

pub mod bucket;

pub use bucket::{Bucket, BucketSpec, Callback, ResolvedConfig};

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// Name of the bucket every field falls back to
pub const DEFAULT_BUCKET: &str = "default";

/// Environment variable naming a settings file
pub const SETTINGS_ENV: &str = "MODALS_SETTINGS";

/// On-disk shape of a settings file
pub type SettingsFile = BTreeMap<String, BucketSpec>;

/// Configuration errors, raised at construction time only
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings have no \"default\" bucket")]
    MissingDefault,

    #[error("The \"default\" bucket does not set '{field}'")]
    IncompleteDefault { field: &'static str },

    #[error("Settings must be a JSON object keyed by bucket name")]
    NotAnObject,

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("No settings file found")]
    NotFound,
}

/// Immutable bucket table with the default bucket already resolved
#[derive(Debug, Clone)]
pub struct Settings {
    buckets: HashMap<String, Bucket>,
    defaults: ResolvedConfig,
}

impl Settings {
    /// Build settings, failing fast when the default bucket is absent or
    /// leaves a parameter unset.
    pub fn new(buckets: HashMap<String, Bucket>) -> Result<Self, ConfigError> {
        let default = buckets.get(DEFAULT_BUCKET).ok_or(ConfigError::MissingDefault)?;
        if let Some(field) = default.first_missing_field() {
            return Err(ConfigError::IncompleteDefault { field });
        }

        let defaults = ResolvedConfig {
            prevent_default: default.prevent_default.unwrap_or_default(),
            open_timeout: default.open_timeout.unwrap_or_default(),
            enable_scroll_timeout: default.enable_scroll_timeout.unwrap_or_default(),
            enable_scrolling: default.enable_scrolling.unwrap_or_default(),
            disable_scrolling: default.disable_scrolling.unwrap_or_default(),
            stop_play: default.stop_play.unwrap_or_default(),
            lock_focus: default.lock_focus.unwrap_or_default(),
            open_callback: default.open_callback.clone(),
            close_callback: default.close_callback.clone(),
        };

        debug!(buckets = buckets.len(), "Settings initialized");
        Ok(Self { buckets, defaults })
    }

    /// Build settings from a JSON object keyed by bucket name
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let table = value.as_object().ok_or(ConfigError::NotAnObject)?;
        let buckets = table
            .iter()
            .map(|(name, bucket)| (name.clone(), Bucket::from_value(name, bucket)))
            .collect();
        Self::new(buckets)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    /// Load settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading settings from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Load settings from the first location that exists:
    /// 1. `$MODALS_SETTINGS`
    /// 2. `./modals.json`
    /// 3. `$CONFIG_DIR/modals/settings.json`
    pub async fn discover() -> Result<Self, ConfigError> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            candidates.push(PathBuf::from(path));
        }
        candidates.push(PathBuf::from("./modals.json"));
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("modals").join("settings.json"));
        }

        for path in candidates {
            if path.exists() {
                return Self::load(&path).await;
            }
        }

        Err(ConfigError::NotFound)
    }

    /// Resolve a bucket over the defaults. `None` when no such bucket exists.
    pub fn resolve(&self, name: &str) -> Option<ResolvedConfig> {
        let bucket = self.buckets.get(name)?;
        Some(bucket.resolve_over(&self.defaults))
    }

    /// The resolved default bucket
    pub fn defaults(&self) -> &ResolvedConfig {
        &self.defaults
    }

    pub fn bucket_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.buckets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Attach an open callback to a bucket, creating the bucket if needed
    pub fn with_open_callback(mut self, bucket: &str, callback: impl Fn() + 'static) -> Self {
        let callback: Callback = Rc::new(callback);
        if bucket == DEFAULT_BUCKET {
            self.defaults.open_callback = Some(Rc::clone(&callback));
        }
        self.buckets.entry(bucket.to_string()).or_default().open_callback = Some(callback);
        self
    }

    /// Attach a close callback to a bucket, creating the bucket if needed
    pub fn with_close_callback(mut self, bucket: &str, callback: impl Fn() + 'static) -> Self {
        let callback: Callback = Rc::new(callback);
        if bucket == DEFAULT_BUCKET {
            self.defaults.close_callback = Some(Rc::clone(&callback));
        }
        self.buckets.entry(bucket.to_string()).or_default().close_callback = Some(callback);
        self
    }
}
