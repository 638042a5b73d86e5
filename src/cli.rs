//! Command line definition

use std::path::PathBuf;
use clap::{Args, Parser, Subcommand};

use avdkit_emulator_bridge::{AvdRequest, HardwareProperty};

#[derive(Debug, Parser)]
#[command(name = "avdkit", version, about = "Create, configure and delete Android Virtual Devices")]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Settings file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Android SDK root
    #[arg(long, global = true)]
    pub sdk_root: Option<PathBuf>,

    /// Directory holding `.android/avd`
    #[arg(long, global = true)]
    pub sdk_home: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Print the AVD name a request resolves to
    Name {
        #[command(flatten)]
        avd: AvdArgs,
    },
    /// Create the AVD unless it already exists
    Ensure {
        #[command(flatten)]
        avd: AvdArgs,
        /// Time given to avdmanager to prompt or exit
        #[arg(long)]
        settle_ms: Option<u64>,
    },
    /// Merge device profile and hardware properties into config.ini
    Configure {
        #[command(flatten)]
        avd: AvdArgs,
        /// Hardware property, repeatable
        #[arg(long = "hw", value_name = "KEY=VALUE", value_parser = parse_hardware)]
        hardware: Vec<HardwareProperty>,
    },
    /// Delete the AVD
    Delete {
        #[command(flatten)]
        avd: AvdArgs,
    },
    /// Print the emulator command line for the AVD
    Args {
        #[command(flatten)]
        avd: AvdArgs,
        /// Console port (default: first free even port from 5554)
        #[arg(long)]
        port: Option<u16>,
        /// ADB port (default: console port + 1)
        #[arg(long)]
        adb_port: Option<u16>,
        #[arg(long)]
        callback_port: u16,
        /// Seconds the emulator waits for the callback port
        #[arg(long, default_value_t = 60)]
        timeout: u32,
        /// Also write an empty console auth token to the home directory
        #[arg(long)]
        write_auth_file: bool,
    },
    /// List known platforms
    Platforms,
    /// List device profiles
    Devices,
}

/// AVD identity and options shared by the AVD subcommands
#[derive(Debug, Clone, Default, Args)]
pub struct AvdArgs {
    /// Existing AVD name
    #[arg(long)]
    pub name: Option<String>,
    /// OS version, API level or add-on target
    #[arg(long)]
    pub os: Option<String>,
    /// Device profile key
    #[arg(long)]
    pub device: Option<String>,
    #[arg(long)]
    pub locale: Option<String>,
    /// ABI, optionally with API flavor (google_apis/x86_64)
    #[arg(long)]
    pub abi: Option<String>,
    /// SD card size (e.g. 512M)
    #[arg(long)]
    pub sdcard: Option<String>,
    /// Suffix for generated names
    #[arg(long)]
    pub suffix: Option<String>,
    #[arg(long)]
    pub wipe_data: bool,
    #[arg(long)]
    pub show_window: bool,
    /// Extra emulator options
    #[arg(long, allow_hyphen_values = true)]
    pub options: Option<String>,
    /// Emulator executable variant
    #[arg(long)]
    pub executable: Option<String>,
}

impl AvdArgs {
    /// The SDK home comes from the session, not the request
    pub fn to_request(&self) -> AvdRequest {
        AvdRequest {
            avd_name: self.name.clone(),
            os_version: self.os.clone(),
            device: self.device.clone(),
            locale: self.locale.clone(),
            sd_card_size: self.sdcard.clone(),
            wipe_data: self.wipe_data,
            show_window: self.show_window,
            extra_options: self.options.clone(),
            target_abi: self.abi.clone(),
            sdk_home: None,
            executable: self.executable.clone(),
            name_suffix: self.suffix.clone(),
        }
    }
}

fn parse_hardware(input: &str) -> Result<HardwareProperty, String> {
    HardwareProperty::parse(input).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ensure() {
        let cli = Cli::try_parse_from([
            "avdkit", "-v", "--sdk-root", "/sdk", "ensure", "--os", "7.0", "--device", "NEXUS_7",
            "--abi", "google_apis/x86_64", "--sdcard", "256M", "--settle-ms", "250",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.sdk_root, Some(PathBuf::from("/sdk")));
        match cli.cmd {
            Cmd::Ensure { avd, settle_ms } => {
                assert_eq!(settle_ms, Some(250));
                let request = avd.to_request();
                assert_eq!(request.os_version.as_deref(), Some("7.0"));
                assert_eq!(request.target_abi.as_deref(), Some("google_apis/x86_64"));
                assert_eq!(request.sd_card_size.as_deref(), Some("256M"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_hardware() {
        let cli = Cli::try_parse_from([
            "avdkit", "configure", "--name", "my_avd", "--hw", "hw.ramSize=2048", "--hw", "hw.gps=no",
        ])
        .unwrap();

        match cli.cmd {
            Cmd::Configure { hardware, .. } => {
                assert_eq!(hardware.len(), 2);
                assert_eq!(hardware[0], HardwareProperty::new("hw.ramSize", "2048"));
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["avdkit", "configure", "--hw", "nonsense"]).is_err());
    }

    #[test]
    fn test_options_with_hyphens() {
        let cli = Cli::try_parse_from([
            "avdkit", "args", "--name", "a", "--callback-port", "40000", "--options", "-gpu host",
        ])
        .unwrap();
        match cli.cmd {
            Cmd::Args { avd, timeout, .. } => {
                assert_eq!(avd.options.as_deref(), Some("-gpu host"));
                assert_eq!(timeout, 60);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
