//! Filesystem helpers for publishing outputs and discarding partial files.
//!
//! The job workspace usually lives on a tmpfs while the output directory does
//! not, so publishing has to survive EXDEV.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Move a finished file from `src` to `dst`, handling cross-device moves.
///
/// Tries a rename first. On EXDEV the file is copied to a sibling temp file
/// next to `dst` and renamed into place, so `dst` only ever holds a complete file.
pub async fn publish_output(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename detected, falling back to copy: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_into_place(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is 18 on Linux and macOS
    e.raw_os_error() == Some(18)
}

async fn copy_into_place(src: &Path, dst: &Path) -> MediaResult<()> {
    let staging = dst.with_extension("partial");

    if let Err(e) = fs::copy(src, &staging).await {
        remove_if_exists(&staging).await;
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::rename(&staging, dst).await {
        remove_if_exists(&staging).await;
        return Err(MediaError::from(e));
    }

    // Source sits in the job workspace, which is removed anyway
    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!("Failed to remove {} after publishing: {}", src.display(), e);
    }

    Ok(())
}

/// Delete a file if present. Errors other than "not found" are logged.
///
/// Returns true when a file was removed.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_publish_same_filesystem() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("final.mp4");
        let dst = dir.path().join("out").join("job.mp4");

        fs::write(&src, b"video bytes").await.unwrap();
        publish_output(&src, &dst).await.unwrap();

        assert!(!src.exists(), "Source file should be moved");
        assert_eq!(fs::read(&dst).await.unwrap(), b"video bytes");
    }

    #[tokio::test]
    async fn test_publish_overwrites_destination() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("final.mp4");
        let dst = dir.path().join("job.mp4");

        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();
        publish_output(&src, &dst).await.unwrap();

        assert_eq!(fs::read_to_string(&dst).await.unwrap(), "new");
    }

    #[tokio::test]
    async fn test_publish_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = publish_output(dir.path().join("nope.mp4"), dir.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.mp4");
        fs::write(&path, b"x").await.unwrap();

        assert!(remove_if_exists(&path).await);
        assert!(!path.exists());
        assert!(!remove_if_exists(&path).await);
    }

    #[test]
    fn test_is_cross_device_error() {
        assert!(is_cross_device_error(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device_error(&std::io::Error::from_raw_os_error(2)));
    }
}
