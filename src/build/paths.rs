//! Build directory path policy
//!
//! Pure mapping from a [`BuildIdentity`] to a location under the build root.
//! Nothing here touches the filesystem.

use super::BuildIdentity;
use std::path::{Path, PathBuf};

/// Name of the canonical binaries link under the build root
pub const BIN_DIR: &str = "bin";

/// Resolve the build directory for an identity
pub fn build_dir(build_root: &Path, identity: BuildIdentity) -> PathBuf {
    build_root.join(identity.dir_name())
}

/// A resolved build directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirectory {
    path: PathBuf,
    identity: Option<BuildIdentity>,
}

impl BuildDirectory {
    /// Directory for a known identity
    pub fn resolve(build_root: &Path, identity: BuildIdentity) -> Self {
        Self {
            path: build_dir(build_root, identity),
            identity: Some(identity),
        }
    }

    /// Directory found on disk; identity is recovered from its name when possible
    pub fn from_path(path: PathBuf) -> Self {
        let identity = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(BuildIdentity::from_dir_name);
        Self { path, identity }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> Option<BuildIdentity> {
        self.identity
    }

    /// Where the build places its binaries
    pub fn bin_dir(&self) -> PathBuf {
        self.path.join(BIN_DIR)
    }
}
