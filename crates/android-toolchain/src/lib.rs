//! Android Toolchain
//!
//! Resolves what an AVD is built from and which SDK tools build it:
//! - Platforms (OS version → API level / target name)
//! - System image package identifiers
//! - SDK tool locations and environment

pub mod platform;
pub mod version;
pub mod tool;
pub mod sdk;
pub mod env;

pub use platform::{AddonLevelLookup, AndroidPlatform, PlatformResolver, TrailingApiLevel};
pub use version::{ApiFlavor, HardwareAbi, VersionSpec};
pub use tool::{OsFamily, SdkToolLocator, Tool, ToolLocator};
pub use sdk::AndroidSdk;
pub use env::ToolEnvironment;
