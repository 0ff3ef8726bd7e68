//! Client configuration and its resolution order.
//!
//! 1. Command-line flags (clap also folds in `XRAY_LENS_API_URL` /
//!    `XRAY_LENS_CONFIG`)
//! 2. TOML config file (`--config`, else `<config_dir>/xray-lens/config.toml`)
//! 3. Compiled defaults

use crate::error::AppError;
use crate::services::notifier::DEFAULT_NOTIFICATION_TIMEOUT;
use crate::services::thumbnail_service::DEFAULT_THUMBNAIL_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root; `/health`, `/model-info` and `/predict` hang off it.
    pub api_base_url: String,
    pub notification_timeout_secs: u64,
    pub thumbnail_size: u32,
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            notification_timeout_secs: DEFAULT_NOTIFICATION_TIMEOUT.as_secs(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            event_capacity: 256,
        }
    }
}

/// Values supplied on the command line (or their environment fallbacks).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub config_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self, AppError> {
        resolve_from(overrides, default_config_path())
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("xray-lens").join("config.toml"))
}

/// An explicit config path must exist; the fallback path is optional.
fn resolve_from(
    overrides: &ConfigOverrides,
    fallback: Option<PathBuf>,
) -> Result<ClientConfig, AppError> {
    let mut config = match (&overrides.config_path, fallback) {
        (Some(path), _) => ClientConfig::load_file(path)?,
        (None, Some(path)) if path.exists() => ClientConfig::load_file(&path)?,
        _ => ClientConfig::default(),
    };

    if let Some(url) = &overrides.api_url {
        config.api_base_url = url.clone();
    }

    if config.api_base_url.trim().is_empty() {
        return Err(AppError::Config("api_base_url must not be empty".to_string()));
    }

    debug!(?config, "Resolved client configuration");
    Ok(config)
}
