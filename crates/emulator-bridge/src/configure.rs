//! Hardware Configuration
//!
//! Merges device profile and explicit hardware properties into an AVD's
//! `config.ini`.

use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use avdkit_core::{AvdError, Result};

use crate::avd::{AvdConfig, AvdLayout};
use crate::config_ini::{self, ConfigFile};

/// Properties the emulator is known to understand
pub static KNOWN_HARDWARE_PROPERTIES: &[&str] = &[
    "hw.accelerometer",
    "hw.battery",
    "hw.camera",
    "hw.dPad",
    "hw.gps",
    "hw.gsmModem",
    "hw.keyboard",
    "hw.ramSize",
    "hw.sdCard",
    "hw.touchScreen",
    "hw.trackBall",
    "vm.heapSize",
];

/// One `key=value` hardware override
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareProperty {
    pub key: String,
    pub value: String,
}

impl HardwareProperty {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value`; key and value are trimmed and the key must be non-empty
    pub fn parse(input: &str) -> Result<Self> {
        let (key, value) = input
            .split_once('=')
            .ok_or_else(|| AvdError::InvalidInput(format!("expected key=value, got '{}'", input)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(AvdError::InvalidInput(format!("empty hardware key in '{}'", input)));
        }
        Ok(Self::new(key, value.trim()))
    }

    pub fn is_known(&self) -> bool {
        KNOWN_HARDWARE_PROPERTIES.contains(&self.key.as_str())
    }
}

impl FromStr for HardwareProperty {
    type Err = AvdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for HardwareProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Write device profile and `overrides` into `config.ini`, overrides last.
///
/// The AVD must already exist.
pub async fn configure_hardware(
    config: &AvdConfig,
    layout: &AvdLayout,
    overrides: &[HardwareProperty],
) -> Result<()> {
    let config_file = layout.config_file();
    let base = config_ini::parse(&config_file)
        .await
        .map_err(|source| AvdError::ConfigFile {
            path: config_file.clone(),
            source,
        })?;

    let device = config.device().map(|d| d.properties()).unwrap_or_default();

    let mut explicit = ConfigFile::new();
    for property in overrides {
        if !property.is_known() {
            warn!("Unfamiliar hardware property '{}'", property.key);
        }
        info!("Setting hardware property {}", property);
        explicit.insert(property.key.clone(), property.value.clone());
    }

    let merged = config_ini::merge(base, [&device, &explicit]);
    config_ini::write(&config_file, &merged)
        .await
        .map_err(|source| AvdError::ConfigFile {
            path: config_file,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avd::AvdRequest;
    use avdkit_android_toolchain::{AndroidSdk, PlatformResolver};
    use avdkit_core::CreationSettings;
    use std::path::Path;

    fn generated(home: &Path) -> (AvdConfig, AvdLayout) {
        let request = AvdRequest {
            os_version: Some("4.4".into()),
            device: Some("NEXUS_7".into()),
            sdk_home: Some(home.to_path_buf()),
            ..Default::default()
        };
        let config =
            AvdConfig::from_request(&request, &PlatformResolver::new(), &CreationSettings::default())
                .unwrap();
        let layout = config.layout(&AndroidSdk::default());
        (config, layout)
    }

    #[test]
    fn test_parse_property() {
        let prop: HardwareProperty = " hw.ramSize = 2048 ".parse().unwrap();
        assert_eq!(prop, HardwareProperty::new("hw.ramSize", "2048"));
        assert!(prop.is_known());

        assert!(HardwareProperty::parse("hw.ramSize").is_err());
        assert!(HardwareProperty::parse("=1").is_err());
        assert!(!HardwareProperty::parse("hw.fancy=1").unwrap().is_known());
    }

    #[tokio::test]
    async fn test_merge_order() {
        let home = tempfile::tempdir().unwrap();
        let (config, layout) = generated(home.path());
        std::fs::create_dir_all(layout.avd_dir()).unwrap();
        std::fs::write(
            layout.config_file(),
            "hw.lcd.density=160\r\nhw.ramSize=512\r\nimage.sysdir.1=system-images/android-19/default/x86/\r\n",
        )
        .unwrap();

        let overrides = [
            HardwareProperty::new("hw.lcd.density", "240"),
            HardwareProperty::new("hw.ramSize", "2048"),
        ];
        configure_hardware(&config, &layout, &overrides).await.unwrap();

        let values = config_ini::parse(&layout.config_file()).await.unwrap();
        assert_eq!(values["hw.lcd.density"], "240");
        assert_eq!(values["hw.ramSize"], "2048");
        assert_eq!(values["hw.device.name"], "Nexus 7 2013");
        assert_eq!(values["skin.path"], "/skins/nexus_7_2013");
        assert_eq!(values["image.sysdir.1"], "system-images/android-19/default/x86/");
    }

    #[tokio::test]
    async fn test_missing_config() {
        let home = tempfile::tempdir().unwrap();
        let (config, layout) = generated(home.path());
        let err = configure_hardware(&config, &layout, &[]).await.unwrap_err();
        assert!(matches!(err, AvdError::ConfigFile { .. }));
    }
}
