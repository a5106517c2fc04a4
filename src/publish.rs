//! Canonical binaries link
//!
//! After every successful build, `<build root>/bin` is re-pointed at the
//! `bin` directory of the build that just finished, whatever its identity.
//! Each publish is a full overwrite: a fresh link is created beside the old
//! one and renamed over it, so readers never see a missing link.

use crate::build::BuildDirectory;
use crate::error::{KilnError, KilnResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Point `link` at `build_dir/bin`
///
/// Any existing link, file or directory at `link` is replaced. Failure is
/// reported as [`KilnError::StaleBinaryLink`]: the build itself succeeded but
/// the link may still point at an older build.
pub async fn publish(link: &Path, build_dir: &BuildDirectory) -> KilnResult<PathBuf> {
    let target = build_dir.bin_dir();

    replace_link(link, &target).await.map_err(|source| KilnError::StaleBinaryLink {
        link: link.to_path_buf(),
        target: target.clone(),
        source,
    })?;

    info!("{} -> {}", link.display(), target.display());
    Ok(target)
}

/// Where the canonical link currently points, if it exists
pub async fn current_target(link: &Path) -> Option<PathBuf> {
    fs::read_link(link).await.ok()
}

#[cfg(unix)]
async fn replace_link(link: &Path, target: &Path) -> std::io::Result<()> {
    let staging = staging_path(link);
    // Leftover from an interrupted publish
    let _ = fs::remove_file(&staging).await;
    fs::symlink(target, &staging).await?;

    // rename() cannot replace a real directory
    if let Ok(meta) = fs::symlink_metadata(link).await {
        if meta.is_dir() {
            debug!("Replacing directory {} with a link", link.display());
            fs::remove_dir_all(link).await?;
        }
    }

    if let Err(e) = fs::rename(&staging, link).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(not(unix))]
async fn replace_link(_link: &Path, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symbolic links are only supported on unix",
    ))
}

fn staging_path(link: &Path) -> PathBuf {
    let name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bin".to_string());
    link.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::build::{BuildIdentity, BuildType, IsolationMode};
    use tempfile::TempDir;

    fn built(root: &Path, identity: BuildIdentity) -> BuildDirectory {
        let dir = BuildDirectory::resolve(root, identity);
        std::fs::create_dir_all(dir.bin_dir()).unwrap();
        dir
    }

    #[tokio::test]
    async fn link_follows_latest_build() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("bin");
        let debug = built(
            temp.path(),
            BuildIdentity::new(BuildType::Debug, IsolationMode::Disabled),
        );
        let release = built(
            temp.path(),
            BuildIdentity::new(BuildType::Release, IsolationMode::Hardware),
        );

        publish(&link, &debug).await.unwrap();
        assert_eq!(current_target(&link).await, Some(debug.bin_dir()));

        publish(&link, &release).await.unwrap();
        assert_eq!(current_target(&link).await, Some(release.bin_dir()));
        assert_eq!(
            std::fs::canonicalize(&link).unwrap(),
            std::fs::canonicalize(release.bin_dir()).unwrap()
        );
    }

    #[tokio::test]
    async fn republishing_same_build_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("bin");
        let debug = built(
            temp.path(),
            BuildIdentity::new(BuildType::Debug, IsolationMode::Disabled),
        );

        publish(&link, &debug).await.unwrap();
        publish(&link, &debug).await.unwrap();
        assert_eq!(current_target(&link).await, Some(debug.bin_dir()));
        assert!(!staging_path(&link).exists());
    }

    #[tokio::test]
    async fn replaces_real_directory() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("bin");
        std::fs::create_dir_all(link.join("old")).unwrap();
        let debug = built(
            temp.path(),
            BuildIdentity::new(BuildType::Debug, IsolationMode::Simulation),
        );

        publish(&link, &debug).await.unwrap();
        assert_eq!(current_target(&link).await, Some(debug.bin_dir()));
    }

    #[tokio::test]
    async fn failure_is_reported_as_stale_link() {
        let temp = TempDir::new().unwrap();
        let link = temp.path().join("missing-parent").join("bin");
        let debug = built(
            temp.path(),
            BuildIdentity::new(BuildType::Debug, IsolationMode::Disabled),
        );

        let err = publish(&link, &debug).await.unwrap_err();
        assert!(matches!(err, KilnError::StaleBinaryLink { .. }));
    }
}
