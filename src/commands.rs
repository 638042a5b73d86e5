//! CLI commands for avdkit
//!
//! Each command resolves its AVD request against the session settings and
//! calls into the emulator bridge.

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use avdkit_android_toolchain::platform::KNOWN_PLATFORMS;
use avdkit_android_toolchain::sdk::home_directory;
use avdkit_android_toolchain::{AndroidSdk, PlatformResolver};
use avdkit_core::AvdkitConfig;
use avdkit_emulator_bridge::{
    configure_hardware, delete_avd, next_emulator_port, write_console_auth_file, AvdConfig,
    AvdCreator, AvdRequest, CreationOutcome, EmulatorArguments, EmulatorPorts, HardwareProperty,
    DEVICE_PROFILES,
};

/// Settings and SDK location shared by every command
pub struct Session {
    pub config: AvdkitConfig,
    pub sdk: AndroidSdk,
    pub resolver: PlatformResolver,
    pub json: bool,
}

impl Session {
    /// Load settings, then apply the environment and command line overrides
    pub async fn load(
        config_path: Option<PathBuf>,
        sdk_root: Option<PathBuf>,
        sdk_home: Option<PathBuf>,
        json: bool,
    ) -> Result<Self> {
        let mut config = match &config_path {
            Some(path) => AvdkitConfig::load_from(path).await,
            None => AvdkitConfig::load().await,
        }
        .context("Failed to load avdkit settings")?;

        config.apply_env();
        if sdk_root.is_some() {
            config.android.sdk_root = sdk_root;
        }
        if sdk_home.is_some() {
            config.android.sdk_home = sdk_home;
        }

        Ok(Self::new(config, json))
    }

    pub fn new(config: AvdkitConfig, json: bool) -> Self {
        let sdk = AndroidSdk::from_settings(&config.android);
        debug!("SDK root {:?}, SDK home {:?}", sdk.root(), sdk.home());
        Self {
            config,
            sdk,
            resolver: PlatformResolver::new(),
            json,
        }
    }

    /// Resolve a request into an AVD config
    pub fn resolve(&self, request: &AvdRequest) -> Result<AvdConfig> {
        let config = AvdConfig::from_request(request, &self.resolver, &self.config.creation)?;
        Ok(config)
    }

    fn creator(&self) -> AvdCreator {
        AvdCreator::with_settings(self.sdk.clone(), &self.config.creation)
    }
}

/// Print the resolved AVD name
pub struct NameCommand {
    pub request: AvdRequest,
}

impl NameCommand {
    pub fn execute(&self, session: &Session) -> Result<String> {
        let config = session.resolve(&self.request)?;
        let name = config.avd_name().to_string();
        if session.json {
            println!("{}", json!({ "name": name, "named": config.is_named() }));
        } else {
            println!("{}", name);
        }
        Ok(name)
    }
}

/// Create the AVD unless it exists
pub struct EnsureCommand {
    pub request: AvdRequest,
    pub settle_ms: Option<u64>,
}

impl EnsureCommand {
    pub async fn execute(&self, session: &Session) -> Result<CreationOutcome> {
        let config = session.resolve(&self.request)?;

        let mut creator = session.creator();
        if let Some(ms) = self.settle_ms {
            creator = creator.with_settle_delay(Duration::from_millis(ms));
        }

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping avdmanager");
                on_interrupt.cancel();
            }
        });

        let outcome = creator.ensure_exists(&config, &cancel).await;
        interrupt.abort();
        let outcome = outcome?;

        let layout = creator.layout(&config);
        if session.json {
            println!(
                "{}",
                json!({
                    "name": config.avd_name(),
                    "created": !outcome.already_existed(),
                    "path": layout.avd_dir(),
                })
            );
        } else {
            match outcome {
                CreationOutcome::Created => println!("Created {}", config.avd_name()),
                CreationOutcome::AlreadyExisted => println!("Using existing {}", config.avd_name()),
            }
        }

        Ok(outcome)
    }
}

/// Write hardware properties into an existing AVD
pub struct ConfigureCommand {
    pub request: AvdRequest,
    pub hardware: Vec<HardwareProperty>,
}

impl ConfigureCommand {
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let config = session.resolve(&self.request)?;
        let layout = config.layout(&session.sdk);

        configure_hardware(&config, &layout, &self.hardware).await?;
        info!("Configured {} hardware properties on {}", self.hardware.len(), config.avd_name());
        Ok(())
    }
}

/// Delete an AVD
pub struct DeleteCommand {
    pub request: AvdRequest,
}

impl DeleteCommand {
    pub async fn execute(&self, session: &Session) -> Result<bool> {
        let config = session.resolve(&self.request)?;
        let layout = config.layout(&session.sdk);

        let deleted = delete_avd(&config, &layout).await?;
        if session.json {
            println!("{}", json!({ "name": config.avd_name(), "deleted": deleted }));
        } else if deleted {
            println!("Deleted {}", config.avd_name());
        } else {
            println!("{} does not exist", config.avd_name());
        }
        Ok(deleted)
    }
}

/// Print the emulator command line
pub struct ArgsCommand {
    pub request: AvdRequest,
    pub port: Option<u16>,
    pub adb_port: Option<u16>,
    pub callback_port: u16,
    pub timeout: u32,
    pub write_auth_file: bool,
}

impl ArgsCommand {
    pub async fn execute(&self, session: &Session) -> Result<EmulatorArguments> {
        let config = session.resolve(&self.request)?;

        let user = match self.port {
            Some(port) => port,
            None => next_emulator_port(&[]).context("No free emulator port")?,
        };
        let adb = match self.adb_port {
            Some(port) => port,
            None => user.checked_add(1).context("No adb port after console port")?,
        };
        let ports = EmulatorPorts {
            user,
            adb,
            callback: self.callback_port,
            console_timeout: self.timeout,
        };

        if self.write_auth_file {
            let home = home_directory(None);
            write_console_auth_file(&home)
                .await
                .with_context(|| format!("Failed to write console auth file to {:?}", home))?;
        }

        let emulator = EmulatorArguments::for_avd(&config, ports);
        if session.json {
            println!(
                "{}",
                json!({ "executable": emulator.executable.executable(), "args": emulator.args })
            );
        } else {
            println!("{}", emulator.command_line());
        }
        Ok(emulator)
    }
}

/// List known platforms
pub struct PlatformsCommand;

impl PlatformsCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        if session.json {
            let platforms: Vec<_> = KNOWN_PLATFORMS
                .iter()
                .map(|(name, level)| json!({ "name": name, "level": level }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&platforms)?);
        } else {
            for (name, level) in KNOWN_PLATFORMS {
                println!("{:<6} android-{}", name, level);
            }
        }
        Ok(())
    }
}

/// List device profiles
pub struct DevicesCommand;

impl DevicesCommand {
    pub fn execute(&self, session: &Session) -> Result<()> {
        if session.json {
            let devices: Vec<_> = DEVICE_PROFILES
                .iter()
                .map(|d| json!({ "key": d.key(), "skin": d.skin(), "properties": d.properties() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&devices)?);
        } else {
            for device in DEVICE_PROFILES {
                match device.skin() {
                    Some(skin) => println!("{} (skin {})", device, skin),
                    None => println!("{}", device),
                }
            }
        }
        Ok(())
    }
}
