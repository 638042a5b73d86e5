//! avdkit - Android Virtual Device provisioning
//!
//! Resolves a device/platform request into a concrete AVD on disk and drives
//! the Android SDK tools to create, configure and delete it.
//!
//! ## Architecture
//!
//! - `avdkit-core`: error types and persisted settings
//! - `avdkit-android-toolchain`: platforms, system image ids, SDK tool lookup
//! - `avdkit-emulator-bridge`: AVD naming, config.ini, creation and deletion

#![warn(clippy::all)]

pub mod cli;
pub mod commands;

// Re-export main components for library usage
pub use avdkit_core as core;
pub use avdkit_android_toolchain as toolchain;
pub use avdkit_emulator_bridge as bridge;

/// Prelude module for convenient imports
pub mod prelude {
    pub use avdkit_core::{AvdError, AvdkitConfig, ErrorKind};
    pub use avdkit_android_toolchain::{AndroidSdk, PlatformResolver, VersionSpec};
    pub use avdkit_emulator_bridge::{AvdConfig, AvdCreator, AvdRequest, CreationOutcome};
}
