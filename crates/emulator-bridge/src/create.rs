//! AVD Creation
//!
//! Makes sure the AVD a config describes exists on disk, creating it with
//! `avdmanager` (and its SD card with `mksdcard`) when it does not.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use avdkit_android_toolchain::{
    AndroidSdk, OsFamily, SdkToolLocator, Tool, ToolEnvironment, ToolLocator,
};
use avdkit_core::{AvdError, CreationSettings, Result};

use crate::avd::{AvdConfig, AvdLayout};
use crate::classify::classify;
use crate::config_ini;
use crate::patches;
use crate::process::{self, HandshakeStep, ToolOutput};
use crate::sdcard::create_sd_card;

/// Result of [`AvdCreator::ensure_exists`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationOutcome {
    /// The AVD was already there; at most its SD card was added
    AlreadyExisted,
    /// A new AVD was created
    Created,
}

impl CreationOutcome {
    pub fn already_existed(&self) -> bool {
        matches!(self, CreationOutcome::AlreadyExisted)
    }
}

/// Steps of a creation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    CheckExisting,
    NeedSdCard,
    CreateSdCard,
    PatchConfig,
    ValidateSdk,
    BuildArgs,
    Spawn,
    ProbeOutput,
    Respond,
    SkipRespond,
    Drain,
    AwaitExit,
    Verify,
    DoneReused,
    DoneCreated,
    Failed,
}

impl From<HandshakeStep> for CreationStage {
    fn from(step: HandshakeStep) -> Self {
        match step {
            HandshakeStep::ProbeOutput => CreationStage::ProbeOutput,
            HandshakeStep::Respond => CreationStage::Respond,
            HandshakeStep::SkipRespond => CreationStage::SkipRespond,
            HandshakeStep::Drain => CreationStage::Drain,
            HandshakeStep::AwaitExit => CreationStage::AwaitExit,
        }
    }
}

struct StageTracker {
    stage: CreationStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: CreationStage::CheckExisting,
        }
    }

    fn transition(&mut self, next: CreationStage) {
        debug!("State transition: {:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, error: AvdError) -> AvdError {
        self.transition(CreationStage::Failed);
        error
    }
}

/// Drives the SDK tools that create AVDs
pub struct AvdCreator {
    sdk: AndroidSdk,
    locator: Box<dyn ToolLocator>,
    settle_delay: Duration,
    os: OsFamily,
}

impl AvdCreator {
    pub fn new(sdk: AndroidSdk) -> Self {
        Self {
            sdk,
            locator: Box::new(SdkToolLocator),
            settle_delay: CreationSettings::default().settle_delay(),
            os: OsFamily::current(),
        }
    }

    pub fn with_settings(sdk: AndroidSdk, settings: &CreationSettings) -> Self {
        Self::new(sdk).with_settle_delay(settings.settle_delay())
    }

    pub fn with_locator(mut self, locator: impl ToolLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn sdk(&self) -> &AndroidSdk {
        &self.sdk
    }

    pub fn layout(&self, config: &AvdConfig) -> AvdLayout {
        config.layout(&self.sdk)
    }

    /// Create the AVD unless it already exists.
    ///
    /// Named AVDs are never created: a missing one is a discovery error.
    pub async fn ensure_exists(
        &self,
        config: &AvdConfig,
        cancel: &CancellationToken,
    ) -> Result<CreationOutcome> {
        let mut stages = StageTracker::new();
        let layout = self.layout(config);
        let config_file = layout.config_file();

        let exists = config_file.is_file();
        if !exists && config.is_named() {
            return Err(stages.fail(AvdError::Discovery {
                name: config.avd_name().to_string(),
                path: layout.avd_dir(),
            }));
        }

        if exists {
            let wanted_card = config
                .sd_card_size()
                .filter(|_| !layout.sd_card_image().exists());
            let Some(size) = wanted_card else {
                info!("Using existing AVD '{}'", config.avd_name());
                stages.transition(CreationStage::DoneReused);
                return Ok(CreationOutcome::AlreadyExisted);
            };

            stages.transition(CreationStage::NeedSdCard);
            return self
                .add_sd_card(config, &layout, size, &mut stages, cancel)
                .await
                .map_err(|e| stages.fail(e));
        }

        self.create(config, &layout, &mut stages, cancel)
            .await
            .map_err(|e| stages.fail(e))
    }

    async fn add_sd_card(
        &self,
        config: &AvdConfig,
        layout: &AvdLayout,
        size: &str,
        stages: &mut StageTracker,
        cancel: &CancellationToken,
    ) -> Result<CreationOutcome> {
        let sdk_root = self.require_sdk_root()?;

        stages.transition(CreationStage::CreateSdCard);
        let mksdcard = self.locator.locate(sdk_root, Tool::MkSdCard, self.os);
        let env = self.environment(layout);
        create_sd_card(&mksdcard, size, &layout.sd_card_image(), &env, cancel).await?;

        stages.transition(CreationStage::PatchConfig);
        let config_file = layout.config_file();
        config_ini::set_value(&config_file, "sdcard.size", size)
            .await
            .map_err(|source| AvdError::ConfigFile {
                path: config_file.clone(),
                source,
            })?;

        info!("Added SD card to existing AVD '{}'", config.avd_name());
        stages.transition(CreationStage::DoneReused);
        Ok(CreationOutcome::AlreadyExisted)
    }

    async fn create(
        &self,
        config: &AvdConfig,
        layout: &AvdLayout,
        stages: &mut StageTracker,
        cancel: &CancellationToken,
    ) -> Result<CreationOutcome> {
        stages.transition(CreationStage::ValidateSdk);
        let sdk_root = self.require_sdk_root()?;
        let version = config.version().ok_or_else(|| {
            AvdError::InvalidInput(format!("AVD '{}' has no system image", config.avd_name()))
        })?;
        let package = version.package_id();

        info!("Creating AVD '{}' from {}", config.avd_name(), package);

        stages.transition(CreationStage::BuildArgs);
        let avdmanager = self.locator.locate(sdk_root, Tool::AvdManager, self.os);
        let args = create_args(config, layout, &package);
        debug!("{} {}", avdmanager.display(), args.join(" "));

        if layout.has_custom_home() {
            tokio::fs::create_dir_all(layout.avd_home())
                .await
                .map_err(AvdError::CreationAborted)?;
        }

        let mut cmd = Command::new(&avdmanager);
        cmd.args(&args);
        self.environment(layout).apply(&mut cmd);

        stages.transition(CreationStage::Spawn);
        let output = process::converse(cmd, self.settle_delay, cancel, |step| {
            stages.transition(step.into())
        })
        .await?;

        debug!("avdmanager stdout: {}", output.stdout);
        debug!("avdmanager stderr: {}", output.stderr);

        if let Some(kind) = classify(&output.stdout, &output.stderr) {
            warn!("avdmanager rejected {}: {:?}", package, kind);
            return Err(kind.into_error(&package, &output.stdout, &output.stderr));
        }

        if !output.prompted && !output.status.success() {
            log_stderr(&output);
            return Err(AvdError::CreationFailed(format!(
                "avdmanager exited with {} without output",
                output.status
            )));
        }

        stages.transition(CreationStage::Verify);
        let config_file = layout.config_file();
        if !config_file.is_file() {
            log_stderr(&output);
            return Err(AvdError::CreationFailed(format!(
                "avdmanager finished but {} was not written",
                config_file.display()
            )));
        }
        if !output.status.success() {
            warn!(
                "avdmanager exited with {} but AVD '{}' was created",
                output.status,
                config.avd_name()
            );
        }

        patches::apply(&config_file, &version.platform).await?;

        info!("Created AVD '{}'", config.avd_name());
        stages.transition(CreationStage::DoneCreated);
        Ok(CreationOutcome::Created)
    }

    fn require_sdk_root(&self) -> Result<&Path> {
        match self.sdk.root() {
            None => Err(AvdError::Configuration("Android SDK root is not known".into())),
            Some(root) if !root.is_dir() => Err(AvdError::Configuration(format!(
                "Android SDK root {} does not exist",
                root.display()
            ))),
            Some(root) => Ok(root),
        }
    }

    fn environment(&self, layout: &AvdLayout) -> ToolEnvironment {
        let mut env = ToolEnvironment::for_sdk(&self.sdk);
        if layout.has_custom_home() {
            env.set("ANDROID_SDK_HOME", layout.home().to_string_lossy());
        }
        env
    }
}

fn log_stderr(output: &ToolOutput) {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        warn!("avdmanager: {}", stderr);
    }
}

/// `create avd -n <name> -k <package> [-p <dir>] [-c <size>] -f`
pub fn create_args(config: &AvdConfig, layout: &AvdLayout, package: &str) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "create".into(),
        "avd".into(),
        "-n".into(),
        config.avd_name().into(),
        "-k".into(),
        package.into(),
    ];

    if layout.has_custom_home() {
        args.push("-p".into());
        args.push(path_arg(layout.avd_dir()));
    }

    if let Some(size) = config.sd_card_size() {
        args.push("-c".into());
        args.push(size.into());
    }

    args.push("-f".into());
    args
}

fn path_arg(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avd::AvdRequest;
    use avdkit_android_toolchain::PlatformResolver;

    fn config(request: AvdRequest) -> AvdConfig {
        AvdConfig::from_request(&request, &PlatformResolver::new(), &CreationSettings::default())
            .unwrap()
    }

    fn generated() -> AvdRequest {
        AvdRequest {
            os_version: Some("4.4".into()),
            device: Some("NEXUS_7".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_args() {
        let config = config(generated());
        let layout = AvdLayout::new(PathBuf::from("/home/ci"), config.avd_name(), false);
        let args = create_args(&config, &layout, "system-images;android-19;default;x86");
        assert_eq!(
            args,
            vec![
                "create",
                "avd",
                "-n",
                "hudson_en-US_NEXUS_7_system-images_android-19_default_x86",
                "-k",
                "system-images;android-19;default;x86",
                "-f"
            ]
        );
    }

    #[test]
    fn test_create_args_custom_home_and_card() {
        let mut request = generated();
        request.sd_card_size = Some("128M".into());
        let config = config(request);
        let layout = AvdLayout::new(PathBuf::from("/job"), config.avd_name(), true);
        let args = create_args(&config, &layout, "pkg");

        let p = args.iter().position(|a| a == "-p").unwrap();
        assert_eq!(PathBuf::from(&args[p + 1]), layout.avd_dir());
        let c = args.iter().position(|a| a == "-c").unwrap();
        assert_eq!(args[c + 1], "128M");
        assert_eq!(args.last().unwrap(), "-f");
    }

    #[tokio::test]
    async fn test_named_missing_is_discovery_error() {
        let home = tempfile::tempdir().unwrap();
        let config = config(AvdRequest {
            avd_name: Some("absent".into()),
            sdk_home: Some(home.path().to_path_buf()),
            ..Default::default()
        });
        let creator = AvdCreator::new(AndroidSdk::default());
        let err = creator
            .ensure_exists(&config, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AvdError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_unknown_sdk_root() {
        let home = tempfile::tempdir().unwrap();
        let mut request = generated();
        request.sdk_home = Some(home.path().to_path_buf());
        let creator = AvdCreator::new(AndroidSdk::default());
        let err = creator
            .ensure_exists(&config(request), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AvdError::Configuration(_)));
    }
}
