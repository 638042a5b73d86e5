//! SDK Tools
//!
//! The command-line tools avdkit drives, and where to find them in an SDK.

use std::fmt;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Unix,
    Windows,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        }
    }
}

/// An SDK executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    Adb,
    SdkManager,
    AvdManager,
    Emulator,
    EmulatorArm,
    EmulatorMips,
    EmulatorX86,
    Emulator64Arm,
    Emulator64Mips,
    Emulator64X86,
    MkSdCard,
}

impl Tool {
    /// Emulator executables, in preference order
    pub const EMULATORS: &'static [Tool] = &[
        Tool::Emulator,
        Tool::EmulatorArm,
        Tool::EmulatorMips,
        Tool::EmulatorX86,
        Tool::Emulator64Arm,
        Tool::Emulator64Mips,
        Tool::Emulator64X86,
    ];

    /// Base executable name
    pub fn executable(&self) -> &'static str {
        match self {
            Tool::Adb => "adb",
            Tool::SdkManager => "sdkmanager",
            Tool::AvdManager => "avdmanager",
            Tool::Emulator => "emulator",
            Tool::EmulatorArm => "emulator-arm",
            Tool::EmulatorMips => "emulator-mips",
            Tool::EmulatorX86 => "emulator-x86",
            Tool::Emulator64Arm => "emulator64-arm",
            Tool::Emulator64Mips => "emulator64-mips",
            Tool::Emulator64X86 => "emulator64-x86",
            Tool::MkSdCard => "mksdcard",
        }
    }

    fn windows_extension(&self) -> &'static str {
        match self {
            Tool::SdkManager | Tool::AvdManager => ".bat",
            _ => ".exe",
        }
    }

    /// File name on the given OS
    pub fn file_name(&self, os: OsFamily) -> String {
        match os {
            OsFamily::Unix => self.executable().to_string(),
            OsFamily::Windows => format!("{}{}", self.executable(), self.windows_extension()),
        }
    }

    /// SDK-relative directories that may hold this tool, most current first
    pub fn sdk_dirs(&self) -> &'static [&'static str] {
        match self {
            Tool::Adb => &["platform-tools"],
            Tool::SdkManager | Tool::AvdManager => &["cmdline-tools/latest/bin", "tools/bin"],
            _ => &["emulator", "tools"],
        }
    }

    /// Emulator variant by executable name, falling back to `emulator`
    pub fn emulator_variant(name: Option<&str>) -> Tool {
        name.and_then(|n| Self::EMULATORS.iter().copied().find(|t| t.executable() == n))
            .unwrap_or(Tool::Emulator)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// Resolves the path of a tool inside an SDK
pub trait ToolLocator: Send + Sync {
    fn locate(&self, sdk_root: &Path, tool: Tool, os: OsFamily) -> PathBuf;
}

/// Looks in the standard SDK layout, then on `PATH`.
///
/// When the tool is found nowhere, the first SDK candidate is returned so the
/// spawn error names the expected location.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkToolLocator;

impl ToolLocator for SdkToolLocator {
    fn locate(&self, sdk_root: &Path, tool: Tool, os: OsFamily) -> PathBuf {
        let file_name = tool.file_name(os);
        let candidates: Vec<PathBuf> = tool
            .sdk_dirs()
            .iter()
            .map(|dir| sdk_root.join(dir).join(&file_name))
            .collect();

        if let Some(found) = candidates.iter().find(|p| p.is_file()) {
            return found.clone();
        }

        if let Ok(on_path) = which::which(&file_name) {
            debug!("{} not in SDK, using {:?} from PATH", tool, on_path);
            return on_path;
        }

        candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| sdk_root.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(Tool::AvdManager.file_name(OsFamily::Unix), "avdmanager");
        assert_eq!(Tool::AvdManager.file_name(OsFamily::Windows), "avdmanager.bat");
        assert_eq!(Tool::MkSdCard.file_name(OsFamily::Windows), "mksdcard.exe");
    }

    #[test]
    fn test_emulator_variant() {
        assert_eq!(Tool::emulator_variant(Some("emulator64-x86")), Tool::Emulator64X86);
        assert_eq!(Tool::emulator_variant(Some("adb")), Tool::Emulator);
        assert_eq!(Tool::emulator_variant(None), Tool::Emulator);
    }

    #[test]
    fn test_locator_prefers_existing_candidate() {
        let sdk = tempfile::tempdir().unwrap();
        let legacy = sdk.path().join("tools").join("bin");
        std::fs::create_dir_all(&legacy).unwrap();
        std::fs::write(legacy.join("avdmanager"), "").unwrap();

        let path = SdkToolLocator.locate(sdk.path(), Tool::AvdManager, OsFamily::Unix);
        assert_eq!(path, legacy.join("avdmanager"));
    }
}
