//! Resolved filesystem layout
//!
//! Built once per invocation from the configuration; every component takes
//! its paths from here.

use super::schema::Config;
use crate::build::paths::BIN_DIR;
use crate::build::{BuildDirectory, BuildIdentity, BuildType};
use std::path::{Path, PathBuf};

/// Absolute locations used by a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub project_root: PathBuf,
    pub build_root: PathBuf,
    pub install_dir: PathBuf,
    pub dependency_cache: PathBuf,
    pub profiles_dir: PathBuf,
}

impl Layout {
    /// Resolve the layout for one command line
    ///
    /// A relative `--project` is taken from `cwd` like any other path
    /// argument. Relative paths inside a local config file are anchored at
    /// that file's directory.
    pub fn for_invocation(
        config: &Config,
        project_arg: Option<&Path>,
        cwd: &Path,
        local_config: Option<&Path>,
    ) -> Self {
        let project_override = project_arg.map(|dir| absolute(cwd, dir));
        let base = local_config.and_then(Path::parent).unwrap_or(cwd);
        Self::resolve(config, project_override.as_deref(), base)
    }

    /// Resolve the layout
    ///
    /// Project root precedence: explicit override, `paths.project_root`
    /// (relative to `base`), then `base` itself.
    pub fn resolve(config: &Config, project_override: Option<&Path>, base: &Path) -> Self {
        let project_root = match (project_override, &config.paths.project_root) {
            (Some(dir), _) => absolute(base, dir),
            (None, Some(dir)) => absolute(base, dir),
            (None, None) => base.to_path_buf(),
        };

        Self {
            build_root: absolute(&project_root, &config.paths.build_root),
            install_dir: absolute(&project_root, &config.paths.install_dir),
            dependency_cache: absolute(&project_root, &config.paths.dependency_cache),
            profiles_dir: absolute(&project_root, &config.paths.profiles_dir),
            project_root,
        }
    }

    /// Build directory for an identity
    pub fn build_directory(&self, identity: BuildIdentity) -> BuildDirectory {
        BuildDirectory::resolve(&self.build_root, identity)
    }

    /// The canonical binaries link
    pub fn bin_link(&self) -> PathBuf {
        self.build_root.join(BIN_DIR)
    }

    /// Conan output folder for a build type
    pub fn cache_dir(&self, build_type: BuildType) -> PathBuf {
        self.dependency_cache.join(build_type.dir_name())
    }

    /// Lockfile for a build type, kept in the project for version control
    pub fn lockfile(&self, build_type: BuildType) -> PathBuf {
        self.project_root
            .join(format!("conan-{}.lock", build_type.dir_name()))
    }
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
