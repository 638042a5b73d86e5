//! Post-creation config.ini patches keyed by platform release

use std::path::Path;
use tracing::info;

use avdkit_android_toolchain::AndroidPlatform;
use avdkit_core::{AvdError, Result};

use crate::config_ini;

/// A config.ini entry forced for a set of known platform releases
#[derive(Debug, Clone, Copy)]
pub struct ConfigPatch {
    /// Version names from the known platform table
    pub platforms: &'static [&'static str],
    pub key: &'static str,
    pub value: &'static str,
}

/// Android 5.0 and 5.1 images ship a data partition too small to install
/// most test APKs.
pub static POST_CREATION_PATCHES: &[ConfigPatch] = &[ConfigPatch {
    platforms: &["5.0", "5.1"],
    key: "disk.dataPartition.size",
    value: "1024",
}];

/// Patches that apply to `platform`. Custom platforms never match, whatever
/// their API level.
pub fn patches_for(platform: &AndroidPlatform) -> impl Iterator<Item = &'static ConfigPatch> + '_ {
    POST_CREATION_PATCHES.iter().filter(move |patch| {
        !platform.is_custom() && patch.platforms.contains(&platform.name())
    })
}

/// Apply every patch for `platform` to the config file
pub async fn apply(config_file: &Path, platform: &AndroidPlatform) -> Result<usize> {
    let mut applied = 0;
    for patch in patches_for(platform) {
        info!("Android {}: setting {}={}", platform, patch.key, patch.value);
        config_ini::set_value(config_file, patch.key, patch.value)
            .await
            .map_err(|source| AvdError::ConfigFile {
                path: config_file.to_path_buf(),
                source,
            })?;
        applied += 1;
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use avdkit_android_toolchain::PlatformResolver;

    fn platform(version: &str) -> AndroidPlatform {
        PlatformResolver::new().resolve(version).unwrap()
    }

    #[test]
    fn test_lollipop_only() {
        assert_eq!(patches_for(&platform("21")).count(), 1);
        assert_eq!(patches_for(&platform("5.1")).count(), 1);
        assert_eq!(patches_for(&platform("4.4")).count(), 0);
        assert_eq!(patches_for(&platform("23")).count(), 0);
    }

    #[test]
    fn test_custom_platform_never_patched() {
        let addon = platform("Vendor:Addon:21");
        assert!(addon.is_custom());
        assert_eq!(addon.sdk_level(), 21);
        assert_eq!(patches_for(&addon).count(), 0);
        assert_eq!(patches_for(&platform("foo-22")).count(), 0);
    }

    #[tokio::test]
    async fn test_apply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        tokio::fs::write(&path, "hw.ramSize=1536\r\n").await.unwrap();

        assert_eq!(apply(&path, &platform("5.0")).await.unwrap(), 1);
        let values = config_ini::parse(&path).await.unwrap();
        assert_eq!(values["disk.dataPartition.size"], "1024");
        assert_eq!(values["hw.ramSize"], "1536");

        assert_eq!(apply(&path, &platform("9.0")).await.unwrap(), 0);
    }
}
