//! AVD Deletion

use std::io;
use std::path::Path;
use tracing::{debug, info};

use avdkit_core::{AvdError, Result};

use crate::avd::{AvdConfig, AvdLayout};

/// Remove the AVD directory and its `<name>.ini` pointer file.
///
/// Returns `false` when there was nothing to delete.
pub async fn delete_avd(config: &AvdConfig, layout: &AvdLayout) -> Result<bool> {
    let avd_dir = layout.avd_dir();
    if !avd_dir.exists() {
        info!("AVD '{}' not found at {:?}, nothing to delete", config.avd_name(), avd_dir);
        return Ok(false);
    }

    info!("Deleting AVD '{}'", config.avd_name());
    tokio::fs::remove_dir_all(&avd_dir)
        .await
        .map_err(|source| deletion_failed(&avd_dir, source))?;

    let metadata = layout.metadata_file();
    match tokio::fs::remove_file(&metadata).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No metadata file at {:?}", metadata);
        }
        Err(source) => return Err(deletion_failed(&metadata, source)),
    }

    Ok(true)
}

fn deletion_failed(path: &Path, source: io::Error) -> AvdError {
    AvdError::DeletionFailed {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avd::AvdRequest;
    use avdkit_android_toolchain::{AndroidSdk, PlatformResolver};
    use avdkit_core::CreationSettings;

    fn named(home: &Path) -> (AvdConfig, AvdLayout) {
        let request = AvdRequest {
            avd_name: Some("doomed".into()),
            sdk_home: Some(home.to_path_buf()),
            ..Default::default()
        };
        let config =
            AvdConfig::from_request(&request, &PlatformResolver::new(), &CreationSettings::default())
                .unwrap();
        let layout = config.layout(&AndroidSdk::default());
        (config, layout)
    }

    #[tokio::test]
    async fn test_delete_present() {
        let home = tempfile::tempdir().unwrap();
        let (config, layout) = named(home.path());
        std::fs::create_dir_all(layout.avd_dir()).unwrap();
        std::fs::write(layout.config_file(), "hw.gps=yes\r\n").unwrap();
        std::fs::write(layout.metadata_file(), "path=x\r\n").unwrap();

        assert!(delete_avd(&config, &layout).await.unwrap());
        assert!(!layout.avd_dir().exists());
        assert!(!layout.metadata_file().exists());
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let home = tempfile::tempdir().unwrap();
        let (config, layout) = named(home.path());
        assert!(!delete_avd(&config, &layout).await.unwrap());
    }

    #[tokio::test]
    async fn test_metadata_optional() {
        let home = tempfile::tempdir().unwrap();
        let (config, layout) = named(home.path());
        std::fs::create_dir_all(layout.avd_dir()).unwrap();

        assert!(delete_avd(&config, &layout).await.unwrap());
        assert!(!layout.avd_dir().exists());
    }
}
