//! avdkit core - shared types
//!
//! Error types and persisted settings used by every avdkit crate.

pub mod config;
pub mod error;

pub use config::{AndroidSettings, AvdkitConfig, CreationSettings};
pub use error::{AvdError, ErrorKind, Result};

/// avdkit version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Locale that emulators default to when none is requested
pub const DEFAULT_LOCALE: &str = "en_US";

/// Prefix of generated AVD names
pub const DEFAULT_NAME_PREFIX: &str = "hudson";
