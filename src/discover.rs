//! Build directory discovery
//!
//! Used when a command needs a configured tree but was not told which one:
//! the most recently modified `debug*`/`release*` entry under the build root
//! wins.

use crate::build::BuildDirectory;
use crate::error::{KilnError, KilnResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

const BUILD_PREFIXES: [&str; 2] = ["debug", "release"];

/// A build directory with its modification time
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// All build directories under `build_root`, in no particular order
pub async fn candidates(build_root: &Path) -> KilnResult<Vec<Candidate>> {
    let mut entries = match fs::read_dir(build_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(KilnError::io(
                format!("reading {}", build_root.display()),
                e,
            ))
        }
    };

    let mut found = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| KilnError::io(format!("reading {}", build_root.display()), e))?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !BUILD_PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }

        // The canonical link is never a candidate, even if renamed
        let meta = fs::symlink_metadata(entry.path())
            .await
            .map_err(|e| KilnError::io(format!("inspecting {}", entry.path().display()), e))?;
        if !meta.is_dir() {
            continue;
        }

        let modified = meta
            .modified()
            .map_err(|e| KilnError::io(format!("reading mtime of {}", entry.path().display()), e))?;
        found.push(Candidate {
            path: entry.path(),
            modified,
        });
    }

    Ok(found)
}

/// Pick the most recently modified candidate
pub fn latest(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by_key(|c| c.modified)
}

/// The build directory touched most recently
pub async fn discover_current(build_root: &Path) -> KilnResult<BuildDirectory> {
    let found = latest(candidates(build_root).await?).ok_or_else(|| KilnError::NoBuildDirectory {
        root: build_root.to_path_buf(),
    })?;

    debug!("Current build directory: {}", found.path.display());
    Ok(BuildDirectory::from_path(found.path))
}
