//! Tool Environment
//!
//! Environment variables passed to SDK tools spawned by avdkit.

use std::collections::BTreeMap;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::sdk::AndroidSdk;

/// Variables set on every spawned SDK tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolEnvironment {
    vars: BTreeMap<String, String>,
}

impl ToolEnvironment {
    /// `ANDROID_SDK_ROOT` when the root is known, `ANDROID_SDK_HOME` when the
    /// home is known
    pub fn for_sdk(sdk: &AndroidSdk) -> Self {
        let mut env = Self::default();
        if let Some(root) = sdk.root() {
            env.set_path("ANDROID_SDK_ROOT", root);
        }
        if let Some(home) = sdk.home() {
            env.set_path("ANDROID_SDK_HOME", home);
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    fn set_path(&mut self, key: &str, path: &Path) {
        self.set(key, path.to_string_lossy());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Add the variables to a command
    pub fn apply(&self, cmd: &mut Command) {
        for (key, value) in &self.vars {
            debug!("env {}={}", key, value);
            cmd.env(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_for_sdk() {
        let sdk = AndroidSdk::new(Some(PathBuf::from("/sdk")), Some(PathBuf::from("/home/ci")));
        let env = ToolEnvironment::for_sdk(&sdk);
        assert_eq!(env.get("ANDROID_SDK_ROOT"), Some("/sdk"));
        assert_eq!(env.get("ANDROID_SDK_HOME"), Some("/home/ci"));
    }

    #[test]
    fn test_unknown_home_not_set() {
        let sdk = AndroidSdk::new(Some(PathBuf::from("/sdk")), None);
        let env = ToolEnvironment::for_sdk(&sdk);
        assert!(env.get("ANDROID_SDK_HOME").is_none());
        assert!(ToolEnvironment::for_sdk(&AndroidSdk::default()).get("ANDROID_SDK_ROOT").is_none());
    }
}
