//! Device Profiles
//!
//! Named hardware configurations merged into an AVD's `config.ini`.

use std::fmt;

use crate::config_ini::ConfigFile;

/// Separator between `key=value` entries in a profile spec
pub const SPEC_DELIMITER: char = ';';

const NEXUS_7_SPECS: &str = "hw.device.manufacturer=Google;\
hw.device.name=Nexus 7 2013;\
hw.lcd.density=320;\
showDeviceFrame=yes;\
skin.dynamic=yes;\
skin.name=nexus_7_2013;";

const NEXUS_7_SKIN: &str = "nexus_7_2013";

/// Device profile registry entry
#[derive(Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    key: &'static str,
    specs: &'static str,
    skin: Option<&'static str>,
}

/// Every known device profile
pub static DEVICE_PROFILES: &[DeviceProfile] = &[
    DeviceProfile {
        key: "NEXUS_7",
        specs: NEXUS_7_SPECS,
        skin: Some(NEXUS_7_SKIN),
    },
    DeviceProfile {
        key: "NEXUS_7_NO_SKIN",
        specs: NEXUS_7_SPECS,
        skin: None,
    },
];

impl DeviceProfile {
    /// Find a profile by key, ignoring case
    pub fn lookup(key: &str) -> Option<&'static DeviceProfile> {
        let key = key.trim();
        DEVICE_PROFILES.iter().find(|p| p.key.eq_ignore_ascii_case(key))
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn skin(&self) -> Option<&'static str> {
        self.skin
    }

    /// Hardware properties for this device, skin entries last
    pub fn properties(&self) -> ConfigFile {
        let mut props = parse_specs(self.specs);
        if let Some(skin) = self.skin {
            props.insert("skin.name".to_string(), skin.to_string());
            props.insert("skin.path".to_string(), format!("/skins/{}", skin));
        }
        props
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key)
    }
}

/// Parse `k1=v1;k2=v2;...`. Tokens without exactly one `=` are dropped.
pub fn parse_specs(specs: &str) -> ConfigFile {
    specs
        .split(SPEC_DELIMITER)
        .filter_map(|token| {
            let mut parts = token.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) if !key.is_empty() => {
                    Some((key.to_string(), value.to_string()))
                }
                _ => None,
            }
        })
        .collect()
}
