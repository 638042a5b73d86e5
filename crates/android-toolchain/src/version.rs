//! System Image Versions
//!
//! Combines a platform, an API flavor and a hardware ABI into the
//! `system-images;...` package identifier understood by `avdmanager`.

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::platform::AndroidPlatform;

const PACKAGE_TYPE_IMAGE: &str = "system-images";

/// System image API flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiFlavor {
    #[default]
    Default,
    Google,
}

impl ApiFlavor {
    /// Path segment in the package identifier
    pub fn path_str(&self) -> &'static str {
        match self {
            ApiFlavor::Default => "default",
            ApiFlavor::Google => "google_apis",
        }
    }

    /// All flavors, in match order
    pub fn all() -> &'static [ApiFlavor] {
        &[ApiFlavor::Default, ApiFlavor::Google]
    }

    /// First flavor whose token occurs in `input`, `Default` otherwise
    pub fn parse(input: Option<&str>) -> Self {
        input
            .and_then(|s| Self::all().iter().copied().find(|f| s.contains(f.path_str())))
            .unwrap_or_default()
    }
}

/// Emulated CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HardwareAbi {
    #[default]
    X86,
    X86_64,
    ArmeabiV7a,
    Arm64V8a,
}

impl HardwareAbi {
    /// Get the ABI name as used in system image paths
    pub fn abi_name(&self) -> &'static str {
        match self {
            HardwareAbi::X86 => "x86",
            HardwareAbi::X86_64 => "x86_64",
            HardwareAbi::ArmeabiV7a => "armeabi-v7a",
            HardwareAbi::Arm64V8a => "arm64-v8a",
        }
    }

    /// All ABIs, most specific token first. `x86` is a substring of
    /// `x86_64`, so it must be tried last.
    pub fn match_order() -> &'static [HardwareAbi] {
        &[
            HardwareAbi::X86_64,
            HardwareAbi::Arm64V8a,
            HardwareAbi::ArmeabiV7a,
            HardwareAbi::X86,
        ]
    }

    /// ABI whose token occurs in `input`, `X86` otherwise
    pub fn parse(input: Option<&str>) -> Self {
        input
            .and_then(|s| {
                Self::match_order()
                    .iter()
                    .copied()
                    .find(|abi| s.contains(abi.abi_name()))
            })
            .unwrap_or_default()
    }
}

/// Platform + flavor + ABI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSpec {
    pub platform: AndroidPlatform,
    pub api: ApiFlavor,
    pub abi: HardwareAbi,
}

impl VersionSpec {
    /// Derive flavor and ABI from a free-text ABI argument such as
    /// `google_apis/x86_64` or `default/armeabi-v7a`.
    pub fn new(platform: AndroidPlatform, abi: Option<&str>) -> Self {
        Self {
            platform,
            api: ApiFlavor::parse(abi),
            abi: HardwareAbi::parse(abi),
        }
    }

    /// Package identifier for `avdmanager -k`
    pub fn package_id(&self) -> String {
        [
            PACKAGE_TYPE_IMAGE,
            &self.platform.target_name(),
            self.api.path_str(),
            self.abi.abi_name(),
        ]
        .join(";")
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.package_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformResolver;

    fn platform(v: &str) -> AndroidPlatform {
        PlatformResolver::new().resolve(v).unwrap()
    }

    #[test]
    fn test_package_id() {
        let spec = VersionSpec::new(platform("4.4"), Some("x86"));
        assert_eq!(spec.package_id(), "system-images;android-19;default;x86");

        let spec = VersionSpec::new(platform("24"), Some("google_apis/armeabi-v7a"));
        assert_eq!(spec.package_id(), "system-images;android-24;google_apis;armeabi-v7a");
    }

    #[test]
    fn test_x86_64_not_misclassified() {
        assert_eq!(HardwareAbi::parse(Some("x86_64")), HardwareAbi::X86_64);
        assert_eq!(HardwareAbi::parse(Some("google_apis/x86_64")), HardwareAbi::X86_64);
        assert_eq!(HardwareAbi::parse(Some("x86")), HardwareAbi::X86);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(HardwareAbi::parse(None), HardwareAbi::X86);
        assert_eq!(HardwareAbi::parse(Some("mips")), HardwareAbi::X86);
        assert_eq!(ApiFlavor::parse(None), ApiFlavor::Default);
        assert_eq!(ApiFlavor::parse(Some("arm64-v8a")), ApiFlavor::Default);
        assert_eq!(ApiFlavor::parse(Some("google_apis/arm64-v8a")), ApiFlavor::Google);
    }

    #[test]
    fn test_custom_platform_target() {
        let spec = VersionSpec::new(platform("Google Inc.:Google APIs:23"), None);
        assert_eq!(
            spec.package_id(),
            "system-images;Google Inc.:Google APIs:23;default;x86"
        );
    }
}
