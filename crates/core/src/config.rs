//! Settings
//!
//! Persistent avdkit settings:
//! - Android SDK root and SDK home
//! - AVD creation tuning (settle delay, name prefix, default locale)

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{AvdError, Result};

/// Android SDK settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidSettings {
    /// SDK root containing the command-line tools and system images
    pub sdk_root: Option<PathBuf>,
    /// Directory under which `.android/avd` lives, if not the user's home
    pub sdk_home: Option<PathBuf>,
}

/// AVD creation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationSettings {
    /// Time given to `avdmanager` to print its prompt or exit, in milliseconds
    pub settle_delay_ms: u64,
    /// Prefix of generated AVD names
    pub name_prefix: String,
    /// Locale used when a request does not name one
    pub default_locale: String,
}

impl Default for CreationSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1000,
            name_prefix: crate::DEFAULT_NAME_PREFIX.to_string(),
            default_locale: crate::DEFAULT_LOCALE.to_string(),
        }
    }
}

impl CreationSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Main avdkit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AvdkitConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Android SDK settings
    pub android: AndroidSettings,
    /// AVD creation settings
    pub creation: CreationSettings,
}

impl Default for AvdkitConfig {
    fn default() -> Self {
        Self {
            version: 1,
            android: AndroidSettings::default(),
            creation: CreationSettings::default(),
        }
    }
}

impl AvdkitConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "avdkit", "avdkit")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults if absent
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| AvdError::Configuration("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from `path`, writing defaults if absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| AvdError::ConfigFile { path: path.to_path_buf(), source })?;
            let config: AvdkitConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = AvdkitConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        let io_err = |source| AvdError::ConfigFile { path: path.to_path_buf(), source };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await.map_err(io_err)?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Fill unset SDK locations from the process environment
    pub fn apply_env(&mut self) {
        if self.android.sdk_root.is_none() {
            self.android.sdk_root = ["ANDROID_SDK_ROOT", "ANDROID_HOME"]
                .iter()
                .find_map(|var| std::env::var_os(var))
                .map(PathBuf::from);
        }
        if self.android.sdk_home.is_none() {
            self.android.sdk_home = std::env::var_os("ANDROID_SDK_HOME").map(PathBuf::from);
        }
    }
}
