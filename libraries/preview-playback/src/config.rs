//! Player configuration
//!
//! Every field has a default, so an empty file (or none at all) is valid.
//! Values can be overridden by `PREVIEW_`-prefixed environment variables,
//! e.g. `PREVIEW_SEARCH_DEBOUNCE_MS=250`.

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "preview-player.toml";

/// Configuration for the playback coordinator and search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Duration assumed for a preview until the backend reports one (default: 30s)
    #[serde(default = "default_preview_duration_secs")]
    pub preview_duration_secs: f64,

    /// Quiet period before a typed query is searched (default: 500ms)
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Maximum number of search results kept (default: 20)
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Capacity of the playback event channel (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_preview_duration_secs() -> f64 {
    30.0
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_search_limit() -> usize {
    20
}

fn default_event_capacity() -> usize {
    64
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            preview_duration_secs: default_preview_duration_secs(),
            search_debounce_ms: default_search_debounce_ms(),
            search_limit: default_search_limit(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from `preview-player.toml` (if present) and environment
    pub fn load() -> Result<Self> {
        Self::load_layered(Some(PathBuf::from(DEFAULT_CONFIG_FILE)), true)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(Some(path.as_ref().to_path_buf()), false)
    }

    fn load_layered(path: Option<PathBuf>, with_env: bool) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path.filter(|p| p.exists()) {
            settings = settings.add_source(config::File::from(path));
        }

        if with_env {
            settings = settings.add_source(
                config::Environment::with_prefix("PREVIEW")
                    .prefix_separator("_")
                    .try_parsing(true),
            );
        }

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        tracing::debug!(?config, "Loaded player configuration");
        Ok(config)
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.preview_duration_secs.is_finite() || self.preview_duration_secs < 0.0 {
            return Err(PlaybackError::Config(format!(
                "preview_duration_secs must be a non-negative number, got {}",
                self.preview_duration_secs
            )));
        }
        Ok(())
    }

    /// Debounce period as a `Duration`
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
