//! Android SDK Location
//!
//! Where the SDK lives (tools, system images) and where its per-user state
//! (`.android/avd`) lives.

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use avdkit_core::AndroidSettings;

/// SDK root and SDK home, either of which may be unknown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AndroidSdk {
    root: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl AndroidSdk {
    pub fn new(root: Option<PathBuf>, home: Option<PathBuf>) -> Self {
        Self { root, home }
    }

    /// Build from settings, filling gaps from the environment and well-known
    /// install locations
    pub fn from_settings(settings: &AndroidSettings) -> Self {
        let from_env = Self::from_env();
        let root = settings
            .sdk_root
            .clone()
            .or(from_env.root)
            .or_else(Self::detect_root);
        let home = settings.sdk_home.clone().or(from_env.home);
        Self { root, home }
    }

    /// `ANDROID_SDK_ROOT` (or `ANDROID_HOME`) and `ANDROID_SDK_HOME` only
    pub fn from_env() -> Self {
        let root = ["ANDROID_SDK_ROOT", "ANDROID_HOME"]
            .iter()
            .find_map(|var| env::var_os(var))
            .map(PathBuf::from);
        let home = env::var_os("ANDROID_SDK_HOME").map(PathBuf::from);
        Self { root, home }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Find an SDK root from the environment or common install paths
    pub fn detect_root() -> Option<PathBuf> {
        let found = Self::root_candidates().into_iter().find(|p| p.is_dir());
        match &found {
            Some(path) => info!("Found Android SDK at {:?}", path),
            None => debug!("No Android SDK found in standard locations"),
        }
        found
    }

    fn root_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        for var in ["ANDROID_SDK_ROOT", "ANDROID_HOME"] {
            if let Some(value) = env::var_os(var) {
                candidates.push(PathBuf::from(value));
            }
        }

        if cfg!(windows) {
            if let Some(local) = dirs::data_local_dir() {
                candidates.push(local.join("Android").join("Sdk"));
            }
            candidates.push(PathBuf::from(r"C:\Android\sdk"));
        }

        if cfg!(unix) {
            if let Some(home) = dirs::home_dir() {
                candidates.push(home.join("Android").join("Sdk"));
                candidates.push(home.join("android-sdk"));
            }
            candidates.push(PathBuf::from("/opt/android-sdk"));
            candidates.push(PathBuf::from("/usr/local/android-sdk"));
        }

        candidates
    }
}

/// Base directory holding `.android/`: the SDK home when set, otherwise the
/// user's home directory
pub fn home_directory(sdk_home: Option<&Path>) -> PathBuf {
    sdk_home
        .map(Path::to_path_buf)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `<home>/.android/avd`
pub fn avd_home(home: &Path) -> PathBuf {
    home.join(".android").join("avd")
}
