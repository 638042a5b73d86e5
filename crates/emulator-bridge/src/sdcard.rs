//! SD card images via `mksdcard`

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use avdkit_android_toolchain::ToolEnvironment;
use avdkit_core::{AvdError, Result};

/// Run `mksdcard <size> <image>`. Only the exit status decides success.
pub async fn create_sd_card(
    mksdcard: &Path,
    size: &str,
    image: &Path,
    env: &ToolEnvironment,
    cancel: &CancellationToken,
) -> Result<()> {
    info!("Creating {} SD card at {:?}", size, image);

    let mut cmd = Command::new(mksdcard);
    cmd.arg(size)
        .arg(image)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    env.apply(&mut cmd);

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AvdError::CreationInterrupted),
        output = cmd.output() => output.map_err(AvdError::CreationAborted)?,
    };

    debug!("mksdcard stdout: {}", String::from_utf8_lossy(&output.stdout));

    if !output.status.success() {
        warn!(
            "mksdcard exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return Err(AvdError::CreationFailed(format!(
            "could not create {} SD card image {}",
            size,
            image.display()
        )));
    }

    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_tool(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("mksdcard");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_creates_image() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), r#"echo "$1" > "$2""#);
        let image = dir.path().join("sdcard.img");

        create_sd_card(&tool, "64M", &image, &ToolEnvironment::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&image).unwrap().trim(), "64M");
    }

    #[tokio::test]
    async fn test_exit_code_decides() {
        let dir = tempfile::tempdir().unwrap();
        // Writes the image but still reports failure
        let tool = fake_tool(dir.path(), r#"touch "$2"; exit 2"#);
        let image = dir.path().join("sdcard.img");

        let err = create_sd_card(&tool, "64M", &image, &ToolEnvironment::default(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AvdError::CreationFailed(_)));
    }
}
