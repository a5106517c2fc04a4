//! Dependency cache lifecycle
//!
//! One Conan output folder and one lockfile per build type. The lockfile is
//! created once and then reused; the cache is refreshed on every run.

use super::lockfile::Profile;
use crate::build::{BuildType, Sanitiser};
use crate::config::Layout;
use crate::error::{KilnError, KilnResult};
use crate::fsops;
use crate::toolchain::{ToolCommand, ToolRunner};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File Conan generates for CMake inside the cache
pub const TOOLCHAIN_FILE: &str = "conan_toolchain.cmake";

/// Proof that the dependency cache for a build type exists on disk
///
/// Only obtainable from [`DependencyCacheManager::ensure`] or
/// [`DependencyCache::locate`], so configuring a build cannot skip the
/// dependency step. A cache counts as present only once the install step has
/// written its toolchain file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCache {
    build_type: BuildType,
    dir: PathBuf,
    lockfile: PathBuf,
}

impl DependencyCache {
    /// Find an already-prepared cache
    pub fn locate(layout: &Layout, build_type: BuildType) -> KilnResult<Self> {
        let dir = layout.cache_dir(build_type);
        if !is_populated(&dir) {
            return Err(KilnError::DependencyCacheMissing { path: dir });
        }

        Ok(Self {
            build_type,
            dir,
            lockfile: layout.lockfile(build_type),
        })
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lockfile(&self) -> &Path {
        &self.lockfile
    }

    /// CMake toolchain file generated by the install step
    pub fn toolchain_file(&self) -> PathBuf {
        self.dir.join(TOOLCHAIN_FILE)
    }
}

/// True once a completed install has left its toolchain file in `dir`
pub fn is_populated(dir: &Path) -> bool {
    dir.join(TOOLCHAIN_FILE).is_file()
}

/// Conan `--build` policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Rebuild every package (`*`)
    Everything,
    /// Only build packages absent from the cache (`missing`)
    Missing,
}

impl BuildPolicy {
    pub fn for_clean(clean: bool) -> Self {
        if clean {
            Self::Everything
        } else {
            Self::Missing
        }
    }

    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Everything => "*",
            Self::Missing => "missing",
        }
    }
}

/// Prepares the Conan lockfile and package cache
pub struct DependencyCacheManager<'a> {
    layout: &'a Layout,
    conan: &'a str,
    runner: &'a dyn ToolRunner,
    dry_run: bool,
}

impl<'a> DependencyCacheManager<'a> {
    pub fn new(layout: &'a Layout, conan: &'a str, runner: &'a dyn ToolRunner) -> Self {
        Self {
            layout,
            conan,
            runner,
            dry_run: false,
        }
    }

    /// Skip destructive clean steps
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Make sure the cache for `build_type` is populated
    ///
    /// With `clean`, the lockfile and cache are deleted first and every
    /// package is rebuilt. Any tool failure aborts before a token is handed
    /// out, and a failed install takes the cache directory with it.
    pub async fn ensure(
        &self,
        build_type: BuildType,
        sanitiser: Sanitiser,
        clean: bool,
    ) -> KilnResult<DependencyCache> {
        let profile = Profile::for_sanitiser(sanitiser);
        let profile_path = profile.path(&self.layout.profiles_dir);
        let lockfile = self.layout.lockfile(build_type);
        let cache_dir = self.layout.cache_dir(build_type);

        debug!(
            "Dependency cache for {}: profile={} lockfile={} cache={}",
            build_type,
            profile,
            lockfile.display(),
            cache_dir.display()
        );

        if clean {
            self.clean(&lockfile, &cache_dir).await?;
        }

        if lockfile.exists() {
            debug!("Reusing lockfile {}", lockfile.display());
        } else {
            info!("Creating lockfile {}", lockfile.display());
            self.runner
                .run(&ToolCommand::new(self.conan).args(["remote", "list"]))
                .await?;
            self.runner
                .run(&self.lock_create(build_type, &profile_path, &lockfile))
                .await?;
        }

        let install = self.install(
            build_type,
            &profile_path,
            &lockfile,
            &cache_dir,
            BuildPolicy::for_clean(clean),
        );
        if let Err(e) = self.runner.run(&install).await {
            self.discard(&cache_dir).await?;
            return Err(e);
        }

        Ok(DependencyCache {
            build_type,
            dir: cache_dir,
            lockfile,
        })
    }

    async fn clean(&self, lockfile: &Path, cache_dir: &Path) -> KilnResult<()> {
        if self.dry_run {
            info!(
                "dry-run: would remove {} and {}",
                lockfile.display(),
                cache_dir.display()
            );
            return Ok(());
        }

        fsops::remove_file_if_exists(lockfile).await?;
        fsops::remove_dir_if_exists(cache_dir).await?;
        Ok(())
    }

    async fn discard(&self, cache_dir: &Path) -> KilnResult<()> {
        if self.dry_run {
            return Ok(());
        }

        warn!("Install failed, removing {}", cache_dir.display());
        fsops::remove_dir_if_exists(cache_dir).await?;
        Ok(())
    }

    fn profile_args(&self, build_type: BuildType, profile: &Path) -> Vec<String> {
        vec![
            format!("-pr:h={}", profile.display()),
            format!("-pr:b={}", profile.display()),
            "-s".to_string(),
            format!("build_type={}", build_type),
        ]
    }

    fn lock_create(&self, build_type: BuildType, profile: &Path, lockfile: &Path) -> ToolCommand {
        ToolCommand::new(self.conan)
            .args(["lock", "create"])
            .arg(self.layout.project_root.to_string_lossy())
            .args(self.profile_args(build_type, profile))
            .arg(format!("--lockfile-out={}", lockfile.display()))
    }

    fn install(
        &self,
        build_type: BuildType,
        profile: &Path,
        lockfile: &Path,
        cache_dir: &Path,
        policy: BuildPolicy,
    ) -> ToolCommand {
        ToolCommand::new(self.conan)
            .arg("install")
            .arg(self.layout.project_root.to_string_lossy())
            .args(self.profile_args(build_type, profile))
            .arg("-of")
            .arg(cache_dir.to_string_lossy())
            .arg(format!("--build={}", policy.as_arg()))
            .arg(format!("--lockfile={}", lockfile.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::toolchain::DryRunRunner;
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn layout(temp: &TempDir) -> Layout {
        Layout::resolve(&Config::default(), None, temp.path())
    }

    fn lock_creates(runner: &DryRunRunner) -> usize {
        runner
            .recorded_for("conan")
            .iter()
            .filter(|c| c.args.first().map(String::as_str) == Some("lock"))
            .count()
    }

    #[tokio::test]
    async fn creates_lockfile_when_missing() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let runner = DryRunRunner::quiet();

        let cache = DependencyCacheManager::new(&layout, "conan", &runner)
            .ensure(BuildType::Debug, Sanitiser::None, false)
            .await
            .unwrap();

        let recorded = runner.recorded();
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].args, vec!["remote", "list"]);
        assert!(recorded[1].has_arg("create"));
        assert!(recorded[1]
            .args
            .contains(&format!("--lockfile-out={}", layout.lockfile(BuildType::Debug).display())));
        assert!(recorded[2].has_arg("--build=missing"));
        assert_eq!(cache.dir(), layout.cache_dir(BuildType::Debug));
        assert_eq!(recorded[2].arg_after("-of"), Some(cache.dir().to_str().unwrap()));
    }

    #[tokio::test]
    async fn existing_lockfile_is_reused() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        std::fs::write(layout.lockfile(BuildType::Release), "{}").unwrap();
        let runner = DryRunRunner::quiet();

        DependencyCacheManager::new(&layout, "conan", &runner)
            .ensure(BuildType::Release, Sanitiser::None, false)
            .await
            .unwrap();

        assert_eq!(lock_creates(&runner), 0);
        let install = &runner.recorded()[0];
        assert_eq!(install.args[0], "install");
        assert!(install.has_arg("build_type=Release"));
    }

    #[tokio::test]
    async fn clean_removes_lockfile_and_cache_then_relocks() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let lockfile = layout.lockfile(BuildType::Debug);
        let cache_dir = layout.cache_dir(BuildType::Debug);
        std::fs::write(&lockfile, "{}").unwrap();
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join("stale-package"), "").unwrap();
        let runner = DryRunRunner::quiet();

        DependencyCacheManager::new(&layout, "conan", &runner)
            .ensure(BuildType::Debug, Sanitiser::None, true)
            .await
            .unwrap();

        // The runner doesn't write files, so the old lockfile must be gone
        assert!(!lockfile.exists());
        assert!(!cache_dir.join("stale-package").exists());
        assert_eq!(lock_creates(&runner), 1);
        assert!(runner.recorded().last().unwrap().has_arg("--build=*"));
    }

    #[tokio::test]
    async fn clean_on_empty_state_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let runner = DryRunRunner::quiet();

        let result = DependencyCacheManager::new(&layout, "conan", &runner)
            .ensure(BuildType::Debug, Sanitiser::None, true)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn dry_run_keeps_existing_state() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let lockfile = layout.lockfile(BuildType::Debug);
        std::fs::write(&lockfile, "{}").unwrap();
        let runner = DryRunRunner::quiet();

        DependencyCacheManager::new(&layout, "conan", &runner)
            .dry_run(true)
            .ensure(BuildType::Debug, Sanitiser::None, true)
            .await
            .unwrap();

        assert!(lockfile.exists());
    }

    #[tokio::test]
    async fn sanitiser_selects_profile() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let runner = DryRunRunner::quiet();

        DependencyCacheManager::new(&layout, "conan", &runner)
            .ensure(BuildType::Debug, Sanitiser::Thread, false)
            .await
            .unwrap();

        let tsan = layout.profiles_dir.join("tsan.txt");
        let install = runner.recorded().pop().unwrap();
        assert!(install.has_arg(&format!("-pr:h={}", tsan.display())));
        assert!(install.has_arg(&format!("-pr:b={}", tsan.display())));
    }

    struct FailingConan;

    #[async_trait]
    impl ToolRunner for FailingConan {
        async fn run(&self, command: &ToolCommand) -> KilnResult<()> {
            Err(KilnError::ToolFailed {
                command: command.to_string(),
                code: 1,
                output: None,
            })
        }
    }

    #[tokio::test]
    async fn tool_failure_aborts() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let err = DependencyCacheManager::new(&layout, "conan", &FailingConan)
            .ensure(BuildType::Debug, Sanitiser::None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::ToolFailed { .. }));
    }

    /// Locks fine, then fails on `conan install`
    struct InstallFails;

    #[async_trait]
    impl ToolRunner for InstallFails {
        async fn run(&self, command: &ToolCommand) -> KilnResult<()> {
            if command.args.first().map(String::as_str) != Some("install") {
                return Ok(());
            }
            // Conan has already started writing into the output folder
            if let Some(out) = command.arg_after("-of") {
                std::fs::create_dir_all(out).unwrap();
                std::fs::write(Path::new(out).join("partial.cmake"), "").unwrap();
            }
            Err(KilnError::ToolFailed {
                command: command.to_string(),
                code: 6,
                output: None,
            })
        }
    }

    #[tokio::test]
    async fn failed_install_leaves_no_usable_cache() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);

        let err = DependencyCacheManager::new(&layout, "conan", &InstallFails)
            .ensure(BuildType::Debug, Sanitiser::None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, KilnError::ToolFailed { code: 6, .. }));

        assert!(!layout.cache_dir(BuildType::Debug).exists());
        let err = DependencyCache::locate(&layout, BuildType::Debug).unwrap_err();
        assert!(matches!(err, KilnError::DependencyCacheMissing { .. }));
    }

    #[tokio::test]
    async fn failed_reinstall_discards_previous_cache() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let cache_dir = layout.cache_dir(BuildType::Release);
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(cache_dir.join(TOOLCHAIN_FILE), "").unwrap();
        std::fs::write(layout.lockfile(BuildType::Release), "{}").unwrap();

        DependencyCacheManager::new(&layout, "conan", &InstallFails)
            .ensure(BuildType::Release, Sanitiser::None, false)
            .await
            .unwrap_err();

        assert!(DependencyCache::locate(&layout, BuildType::Release).is_err());
        // The lockfile is still valid and is reused next time
        assert!(layout.lockfile(BuildType::Release).exists());
    }

    #[test]
    fn locate_requires_toolchain_file() {
        let temp = TempDir::new().unwrap();
        let layout = layout(&temp);
        let cache_dir = layout.cache_dir(BuildType::Debug);

        let err = DependencyCache::locate(&layout, BuildType::Debug).unwrap_err();
        assert!(matches!(err, KilnError::DependencyCacheMissing { .. }));

        // An empty directory is what an interrupted install leaves behind
        std::fs::create_dir_all(&cache_dir).unwrap();
        let err = DependencyCache::locate(&layout, BuildType::Debug).unwrap_err();
        assert!(matches!(err, KilnError::DependencyCacheMissing { .. }));

        std::fs::write(cache_dir.join(TOOLCHAIN_FILE), "").unwrap();
        let cache = DependencyCache::locate(&layout, BuildType::Debug).unwrap();
        assert_eq!(cache.toolchain_file(), cache_dir.join(TOOLCHAIN_FILE));
    }
}
