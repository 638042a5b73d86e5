//! Emulator Command Line
//!
//! Arguments for booting an AVD. avdkit never starts the emulator itself;
//! the caller runs the computed command.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use avdkit_android_toolchain::Tool;

use crate::avd::AvdConfig;

/// Console auth token file the emulator reads from the user's home
pub const CONSOLE_AUTH_FILE: &str = ".emulator_console_auth_token";

/// Ports handed to the emulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatorPorts {
    /// Telnet console port
    pub user: u16,
    pub adb: u16,
    /// Port the emulator reports its console on once started
    pub callback: u16,
    /// Seconds the emulator waits for the callback port
    pub console_timeout: u32,
}

/// Emulator executable plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorArguments {
    pub executable: Tool,
    pub args: Vec<String>,
}

impl EmulatorArguments {
    pub fn for_avd(config: &AvdConfig, ports: EmulatorPorts) -> Self {
        let mut args = vec![
            "-ports".to_string(),
            format!("{},{}", ports.user, ports.adb),
            "-report-console".to_string(),
            format!("tcp:{},max={}", ports.callback, ports.console_timeout),
        ];

        // Named AVDs keep whatever locale they were built with
        if !config.is_named() {
            args.push("-prop".to_string());
            args.push(format!("persist.sys.language={}", config.device_language()));
            args.push("-prop".to_string());
            args.push(format!("persist.sys.country={}", config.device_country()));
        }

        args.push("-avd".to_string());
        args.push(config.avd_name().to_string());
        args.push("-no-snapshot".to_string());

        if config.wipe_data() {
            args.push("-wipe-data".to_string());
        }

        if !config.show_window() {
            args.push("-no-window".to_string());
        }

        if let Some(options) = config.extra_options() {
            args.extend(options.split_whitespace().map(str::to_string));
        }

        debug!("Emulator args: {:?}", args);

        Self {
            executable: config.executable(),
            args,
        }
    }

    /// Arguments joined with spaces, for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.executable().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Write an empty console auth file into `home` so the emulator console does
/// not ask for a token
pub async fn write_console_auth_file(home: &Path) -> io::Result<PathBuf> {
    let path = home.join(CONSOLE_AUTH_FILE);
    tokio::fs::write(&path, "").await?;
    info!("Wrote empty console auth file {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avd::AvdRequest;
    use avdkit_android_toolchain::PlatformResolver;
    use avdkit_core::CreationSettings;

    const PORTS: EmulatorPorts = EmulatorPorts {
        user: 5554,
        adb: 5555,
        callback: 40000,
        console_timeout: 60,
    };

    fn config(request: AvdRequest) -> AvdConfig {
        AvdConfig::from_request(&request, &PlatformResolver::new(), &CreationSettings::default())
            .unwrap()
    }

    #[test]
    fn test_generated_avd_args() {
        let config = config(AvdRequest {
            os_version: Some("4.4".into()),
            device: Some("NEXUS_7".into()),
            locale: Some("de_DE".into()),
            wipe_data: true,
            extra_options: Some("-gpu  swiftshader_indirect".into()),
            executable: Some("emulator64-x86".into()),
            ..Default::default()
        });

        let emu = EmulatorArguments::for_avd(&config, PORTS);
        assert_eq!(emu.executable, Tool::Emulator64X86);
        assert_eq!(
            emu.args,
            vec![
                "-ports",
                "5554,5555",
                "-report-console",
                "tcp:40000,max=60",
                "-prop",
                "persist.sys.language=de",
                "-prop",
                "persist.sys.country=DE",
                "-avd",
                config.avd_name(),
                "-no-snapshot",
                "-wipe-data",
                "-no-window",
                "-gpu",
                "swiftshader_indirect",
            ]
        );
    }

    #[test]
    fn test_named_avd_args() {
        let config = config(AvdRequest {
            avd_name: Some("Pixel_API_28".into()),
            show_window: true,
            ..Default::default()
        });

        let emu = EmulatorArguments::for_avd(&config, PORTS);
        assert_eq!(emu.executable, Tool::Emulator);
        assert!(!emu.args.iter().any(|a| a == "-prop"));
        assert!(!emu.args.iter().any(|a| a == "-no-window"));
        assert!(emu.command_line().starts_with("emulator -ports 5554,5555"));
    }

    #[tokio::test]
    async fn test_console_auth_file() {
        let home = tempfile::tempdir().unwrap();
        std::fs::write(home.path().join(CONSOLE_AUTH_FILE), "secret").unwrap();

        let path = write_console_auth_file(home.path()).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "");
    }
}
