//! Idempotent filesystem helpers
//!
//! Absence is never an error when deleting; presence is never an error when
//! creating.

use crate::error::{KilnError, KilnResult};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Create a directory and its parents
pub async fn ensure_dir(path: &Path) -> KilnResult<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| KilnError::io(format!("creating directory {}", path.display()), e))
}

/// Remove a file (or symlink); returns whether something was removed
pub async fn remove_file_if_exists(path: &Path) -> KilnResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(KilnError::io(format!("removing {}", path.display()), e)),
    }
}

/// Remove a directory tree; returns whether something was removed
pub async fn remove_dir_if_exists(path: &Path) -> KilnResult<bool> {
    match fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(KilnError::io(format!("removing {}", path.display()), e)),
    }
}
