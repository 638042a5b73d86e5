//! AVD Definitions
//!
//! Turns a free-text AVD request into a resolved, immutable [`AvdConfig`],
//! and computes the AVD's name and on-disk layout.

use std::path::{Path, PathBuf};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use avdkit_android_toolchain::sdk::{avd_home, home_directory};
use avdkit_android_toolchain::{AndroidSdk, PlatformResolver, Tool, VersionSpec};
use avdkit_core::{AvdError, CreationSettings, Result};

use crate::device::DeviceProfile;

static AVD_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]+$").expect("valid regex"));
static LOCALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]{2}_[A-Z]{2}$").expect("valid regex"));
static SD_CARD_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9]{1,12}) ?([KM])B?$").expect("valid regex"));
static NAME_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex"));

/// Free-text AVD request, as supplied by a job configuration or the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AvdRequest {
    /// Name of an existing AVD; when set, the other identity fields are ignored
    pub avd_name: Option<String>,
    /// OS version ("4.4", "19", "android-19", or an add-on target)
    pub os_version: Option<String>,
    /// Device profile key
    pub device: Option<String>,
    /// Locale such as `en_US` or `de-de`
    pub locale: Option<String>,
    /// SD card size such as `512M`
    pub sd_card_size: Option<String>,
    pub wipe_data: bool,
    pub show_window: bool,
    /// Extra emulator command line options
    pub extra_options: Option<String>,
    /// ABI, optionally prefixed with the API flavor (`google_apis/x86_64`)
    pub target_abi: Option<String>,
    /// Custom SDK home for the AVD store
    pub sdk_home: Option<PathBuf>,
    /// Emulator executable variant
    pub executable: Option<String>,
    /// Suffix appended to generated names
    pub name_suffix: Option<String>,
}

/// Which AVD a config refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvdIdentity {
    /// A pre-existing AVD referenced by name. Never created by avdkit.
    Named(String),
    /// An AVD whose name is derived from its platform and device
    Generated {
        version: VersionSpec,
        device: &'static DeviceProfile,
    },
}

/// Resolved AVD configuration
#[derive(Debug, Clone)]
pub struct AvdConfig {
    identity: AvdIdentity,
    name: String,
    locale: String,
    sd_card_size: Option<String>,
    wipe_data: bool,
    show_window: bool,
    extra_options: Option<String>,
    sdk_home: Option<PathBuf>,
    executable: Tool,
}

impl AvdConfig {
    /// Resolve a request. Fails before any tool runs if the request has
    /// neither a usable name nor a version and device.
    pub fn from_request(
        request: &AvdRequest,
        resolver: &PlatformResolver,
        settings: &CreationSettings,
    ) -> Result<Self> {
        let sd_card_size = non_blank(&request.sd_card_size).map(str::to_string);
        if let Some(size) = &sd_card_size {
            if !SD_CARD_SIZE.is_match(size) {
                return Err(AvdError::InvalidInput(format!("invalid SD card size '{}'", size)));
            }
        }

        let locale = match non_blank(&request.locale) {
            Some(raw) => {
                let locale = normalize_locale(raw);
                if !LOCALE.is_match(&locale) {
                    return Err(AvdError::InvalidInput(format!("invalid locale '{}'", raw)));
                }
                locale
            }
            None => settings.default_locale.clone(),
        };

        let (identity, name) = match non_blank(&request.avd_name) {
            Some(avd_name) => {
                if !AVD_NAME.is_match(avd_name) {
                    return Err(AvdError::InvalidInput(format!("invalid AVD name '{}'", avd_name)));
                }
                if request.os_version.is_some() || request.device.is_some() {
                    warn!("AVD name '{}' given; ignoring OS version and device", avd_name);
                }
                (AvdIdentity::Named(avd_name.to_string()), avd_name.to_string())
            }
            None => {
                let (version, device) = resolve_generated(request, resolver)?;
                let suffix = non_blank(&request.name_suffix);
                let name = generate_avd_name(
                    &settings.name_prefix,
                    &locale,
                    device.key(),
                    &version.package_id(),
                    suffix,
                );
                (AvdIdentity::Generated { version, device }, name)
            }
        };

        debug!("Resolved AVD '{}'", name);

        Ok(Self {
            identity,
            name,
            locale,
            sd_card_size,
            wipe_data: request.wipe_data,
            show_window: request.show_window,
            extra_options: non_blank(&request.extra_options).map(str::to_string),
            sdk_home: request.sdk_home.clone(),
            executable: Tool::emulator_variant(non_blank(&request.executable)),
        })
    }

    /// True for an AVD referenced by name rather than generated
    pub fn is_named(&self) -> bool {
        matches!(self.identity, AvdIdentity::Named(_))
    }

    pub fn avd_name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&VersionSpec> {
        match &self.identity {
            AvdIdentity::Generated { version, .. } => Some(version),
            AvdIdentity::Named(_) => None,
        }
    }

    pub fn device(&self) -> Option<&'static DeviceProfile> {
        match &self.identity {
            AvdIdentity::Generated { device, .. } => Some(device),
            AvdIdentity::Named(_) => None,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Two-letter language code of the locale
    pub fn device_language(&self) -> &str {
        self.locale.split('_').next().unwrap_or(&self.locale)
    }

    /// Country code of the locale
    pub fn device_country(&self) -> &str {
        self.locale.split_once('_').map(|(_, c)| c).unwrap_or("")
    }

    pub fn sd_card_size(&self) -> Option<&str> {
        self.sd_card_size.as_deref()
    }

    pub fn wipe_data(&self) -> bool {
        self.wipe_data
    }

    pub fn show_window(&self) -> bool {
        self.show_window
    }

    pub fn extra_options(&self) -> Option<&str> {
        self.extra_options.as_deref()
    }

    pub fn sdk_home(&self) -> Option<&Path> {
        self.sdk_home.as_deref()
    }

    pub fn executable(&self) -> Tool {
        self.executable
    }

    /// Where this AVD lives. The config's own SDK home wins over the SDK's.
    pub fn layout(&self, sdk: &AndroidSdk) -> AvdLayout {
        let custom_home = self.sdk_home().or_else(|| sdk.home());
        AvdLayout::new(home_directory(custom_home), &self.name, custom_home.is_some())
    }
}

fn resolve_generated(
    request: &AvdRequest,
    resolver: &PlatformResolver,
) -> Result<(VersionSpec, &'static DeviceProfile)> {
    let missing =
        || AvdError::InvalidInput("Valid OS version and device properties must be supplied".into());

    let os_version = non_blank(&request.os_version).ok_or_else(missing)?;
    let device_key = non_blank(&request.device).ok_or_else(missing)?;

    let device = DeviceProfile::lookup(device_key)
        .ok_or_else(|| AvdError::InvalidInput(format!("unknown device '{}'", device_key)))?;
    let platform = resolver.resolve(os_version).ok_or_else(missing)?;

    let abi = non_blank(&request.target_abi);
    let abi = abi.map(|a| a.strip_prefix("default/").unwrap_or(a));

    Ok((VersionSpec::new(platform, abi), device))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `de-de` → `de_DE`. Inputs of four characters or fewer are returned as is.
pub fn normalize_locale(raw: &str) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    if chars.len() <= 4 {
        return chars.into_iter().collect();
    }
    let language: String = chars[..2].iter().collect::<String>().to_lowercase();
    let country: String = chars[3..].iter().collect::<String>().to_uppercase();
    format!("{}_{}", language, country)
}

/// Deterministic name for a generated AVD:
/// `<prefix>_<locale>_<device>_<platform>[_<suffix>]`.
///
/// Locale underscores become dashes; device and platform characters outside
/// `[A-Za-z0-9._-]` become `_`; suffix characters outside that set become `-`.
/// Inputs that differ only in characters sharing a replacement collide.
pub fn generate_avd_name(
    prefix: &str,
    locale: &str,
    device: &str,
    package_id: &str,
    suffix: Option<&str>,
) -> String {
    let locale = locale.replace('_', "-");
    let device = NAME_TOKEN.replace_all(device, "_");
    let platform = NAME_TOKEN.replace_all(package_id, "_");
    let suffix = suffix
        .map(|s| format!("_{}", NAME_TOKEN.replace_all(s, "-")))
        .unwrap_or_default();

    format!("{}_{}_{}_{}{}", prefix, locale, device, platform, suffix)
}

/// Filesystem layout of one AVD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvdLayout {
    home: PathBuf,
    name: String,
    custom_home: bool,
}

impl AvdLayout {
    pub fn new(home: PathBuf, name: &str, custom_home: bool) -> Self {
        Self {
            home,
            name: name.to_string(),
            custom_home,
        }
    }

    /// Base directory holding `.android/`
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// True when the AVD store is under an SDK home rather than the user's home
    pub fn has_custom_home(&self) -> bool {
        self.custom_home
    }

    /// `<home>/.android/avd`
    pub fn avd_home(&self) -> PathBuf {
        avd_home(&self.home)
    }

    /// `<avd home>/<name>.avd`
    pub fn avd_dir(&self) -> PathBuf {
        self.avd_home().join(format!("{}.avd", self.name))
    }

    pub fn config_file(&self) -> PathBuf {
        self.avd_dir().join("config.ini")
    }

    pub fn sd_card_image(&self) -> PathBuf {
        self.avd_dir().join("sdcard.img")
    }

    /// `<avd home>/<name>.ini`, the pointer file next to the AVD directory
    pub fn metadata_file(&self) -> PathBuf {
        self.avd_home().join(format!("{}.ini", self.name))
    }
}
