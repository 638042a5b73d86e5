//! Android Platforms
//!
//! Resolves free-text OS version input ("4.4", "19", "android-19",
//! "Google Inc.:Google APIs:23") into an [`AndroidPlatform`].

use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Known platform releases as `(version name, API level)`, oldest first.
pub const KNOWN_PLATFORMS: &[(&str, u32)] = &[
    ("1.1", 2),
    ("1.5", 3),
    ("1.6", 4),
    ("2.0", 5),
    ("2.0.1", 6),
    ("2.1", 7),
    ("2.2", 8),
    ("2.3", 9),
    ("2.3.3", 10),
    ("3.0", 11),
    ("3.1", 12),
    ("3.2", 13),
    ("4.0", 14),
    ("4.0.3", 15),
    ("4.1", 16),
    ("4.2", 17),
    ("4.3", 18),
    ("4.4", 19),
    ("4.4W", 20),
    ("5.0", 21),
    ("5.1", 22),
    ("6.0", 23),
    ("7.0", 24),
    ("7.1", 25),
    ("8.0", 26),
    ("8.1", 27),
    ("9.0", 28),
];

/// A resolved Android platform.
///
/// Known releases always carry a positive API level. Custom (add-on or
/// unrecognised) platforms keep the raw input as their name and target, and
/// have level 0 when the level could not be determined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AndroidPlatform {
    name: String,
    sdk_level: u32,
    custom: bool,
}

impl AndroidPlatform {
    fn known(name: &str, sdk_level: u32) -> Self {
        Self {
            name: name.to_string(),
            sdk_level,
            custom: false,
        }
    }

    /// Version name ("4.4") or raw custom target
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sdk_level(&self) -> u32 {
        self.sdk_level
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Target name used in package identifiers
    pub fn target_name(&self) -> String {
        if self.custom {
            self.name.clone()
        } else {
            format!("android-{}", self.sdk_level)
        }
    }
}

impl fmt::Display for AndroidPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Determines the API level of a platform missing from [`KNOWN_PLATFORMS`].
pub trait AddonLevelLookup: Send + Sync {
    fn api_level(&self, target: &str) -> Option<u32>;
}

static TRAILING_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-:]([0-9]{1,2})$").expect("valid regex"));

/// Reads the level from the end of an add-on target, e.g. `Vendor:Addon:23`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingApiLevel;

impl AddonLevelLookup for TrailingApiLevel {
    fn api_level(&self, target: &str) -> Option<u32> {
        TRAILING_LEVEL
            .captures(target)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Platform resolver
pub struct PlatformResolver {
    addon_lookup: Box<dyn AddonLevelLookup>,
}

impl Default for PlatformResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformResolver {
    /// Create a resolver using [`TrailingApiLevel`] for custom platforms
    pub fn new() -> Self {
        Self::with_addon_lookup(TrailingApiLevel)
    }

    pub fn with_addon_lookup(lookup: impl AddonLevelLookup + 'static) -> Self {
        Self {
            addon_lookup: Box::new(lookup),
        }
    }

    /// Resolve a version string.
    ///
    /// Returns `None` only for blank input. Anything that does not match a
    /// known release becomes a custom platform.
    pub fn resolve(&self, version: &str) -> Option<AndroidPlatform> {
        let version = unquote(version.trim());
        if version.is_empty() {
            return None;
        }

        if let Some(platform) = find_known(version) {
            return Some(platform);
        }

        let sdk_level = self.addon_lookup.api_level(version).unwrap_or(0);
        debug!("Treating '{}' as a custom platform (level {})", version, sdk_level);
        Some(AndroidPlatform {
            name: version.to_string(),
            sdk_level,
            custom: true,
        })
    }
}

/// Look up a release by name, level, or `android-<level>` target name
pub fn find_known(version: &str) -> Option<AndroidPlatform> {
    KNOWN_PLATFORMS
        .iter()
        .find(|(name, level)| {
            version == *name
                || version == level.to_string()
                || version == format!("android-{}", level)
        })
        .map(|(name, level)| AndroidPlatform::known(name, *level))
}

fn unquote(s: &str) -> &str {
    if s.len() > 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}
