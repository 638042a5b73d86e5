//! Android Emulator Bridge
//!
//! Creates, configures and deletes Android Virtual Devices (AVDs) by driving
//! the SDK tools, and computes the emulator command line for them.

pub mod avd;
pub mod classify;
pub mod config_ini;
pub mod configure;
pub mod create;
pub mod delete;
pub mod device;
pub mod emulator;
pub mod patches;
pub mod process;
pub mod sdcard;

pub use avd::{generate_avd_name, normalize_locale, AvdConfig, AvdIdentity, AvdLayout, AvdRequest};
pub use classify::FailureKind;
pub use config_ini::ConfigFile;
pub use configure::{configure_hardware, HardwareProperty, KNOWN_HARDWARE_PROPERTIES};
pub use create::{AvdCreator, CreationOutcome, CreationStage};
pub use delete::delete_avd;
pub use device::{DeviceProfile, DEVICE_PROFILES};
pub use emulator::{write_console_auth_file, EmulatorArguments, EmulatorPorts};

/// Default emulator console port
pub const DEFAULT_CONSOLE_PORT: u16 = 5554;

/// Emulator console ports, even numbers only; each console port's adb port
/// is the next odd number
pub const EMULATOR_PORT_RANGE: std::ops::Range<u16> = DEFAULT_CONSOLE_PORT..5584;

/// Lowest console port not in `used_ports`
pub fn next_emulator_port(used_ports: &[u16]) -> Option<u16> {
    EMULATOR_PORT_RANGE
        .step_by(2)
        .find(|port| !used_ports.contains(port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_emulator_port() {
        assert_eq!(next_emulator_port(&[]), Some(DEFAULT_CONSOLE_PORT));
        assert_eq!(next_emulator_port(&[5554, 5556]), Some(5558));
        let all: Vec<u16> = EMULATOR_PORT_RANGE.step_by(2).collect();
        assert_eq!(next_emulator_port(&all), None);
    }
}
