//! CMake configure and compile steps

use super::{ToolCommand, ToolRunner};
use crate::build::{BuildDirectory, BuildIdentity, BuildToggles, CompileTargets};
use crate::cache::{self, DependencyCache};
use crate::config::schema::{CmakeConfig, ToolchainConfig};
use crate::config::Layout;
use crate::error::{KilnError, KilnResult};
use crate::fsops;
use tracing::{debug, info};

/// Drives CMake for one project layout
pub struct BuildInvoker<'a> {
    layout: &'a Layout,
    toolchain: &'a ToolchainConfig,
    cmake: &'a CmakeConfig,
    runner: &'a dyn ToolRunner,
    dry_run: bool,
}

impl<'a> BuildInvoker<'a> {
    pub fn new(
        layout: &'a Layout,
        toolchain: &'a ToolchainConfig,
        cmake: &'a CmakeConfig,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            layout,
            toolchain,
            cmake,
            runner,
            dry_run: false,
        }
    }

    /// Skip destructive clean steps
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Configure the build directory for `identity`
    ///
    /// `cache` must belong to the same build type and still hold its
    /// toolchain file (not checked on a dry run, where nothing was installed).
    /// With `clean`, the build
    /// directory is wiped and the canonical `bin` link dropped first, since
    /// it may point into the wiped tree.
    pub async fn configure(
        &self,
        identity: BuildIdentity,
        cache: &DependencyCache,
        toggles: &BuildToggles,
        clean: bool,
    ) -> KilnResult<BuildDirectory> {
        let populated = self.dry_run || cache::is_populated(cache.dir());
        if cache.build_type() != identity.build_type || !populated {
            return Err(KilnError::DependencyCacheMissing {
                path: self.layout.cache_dir(identity.build_type),
            });
        }

        let build_dir = self.layout.build_directory(identity);

        if clean {
            self.wipe(&build_dir).await?;
        }

        fsops::ensure_dir(build_dir.path()).await?;
        fsops::ensure_dir(&self.layout.install_dir).await?;

        info!("Configuring {} in {}", identity, build_dir.path().display());
        let command = self.configure_command(identity, cache, toggles, &build_dir);
        self.runner.run(&command).await?;

        Ok(build_dir)
    }

    async fn wipe(&self, build_dir: &BuildDirectory) -> KilnResult<()> {
        let link = self.layout.bin_link();
        if self.dry_run {
            info!(
                "dry-run: would remove {} and {}",
                build_dir.path().display(),
                link.display()
            );
            return Ok(());
        }

        fsops::remove_dir_if_exists(build_dir.path()).await?;
        fsops::remove_file_if_exists(&link).await?;
        Ok(())
    }

    /// The full configure command line
    pub fn configure_command(
        &self,
        identity: BuildIdentity,
        cache: &DependencyCache,
        toggles: &BuildToggles,
        build_dir: &BuildDirectory,
    ) -> ToolCommand {
        let llvm = self.toolchain.llvm_major_version;
        let project = &self.cmake.project_prefix;
        let subproject = &self.cmake.subproject_prefix;

        let mut args = vec![
            format!("-G{}", self.toolchain.generator),
            format!("-DCMAKE_TOOLCHAIN_FILE={}", cache.toolchain_file().display()),
            format!("-DCMAKE_BUILD_TYPE={}", identity.build_type),
            format!(
                "-DCMAKE_CXX_COMPILER={}",
                self.toolchain.compiler_dir.join(format!("clang++-{llvm}")).display()
            ),
            format!(
                "-DCMAKE_C_COMPILER={}",
                self.toolchain.compiler_dir.join(format!("clang-{llvm}")).display()
            ),
            format!("-DCMAKE_INSTALL_PREFIX={}", self.layout.install_dir.display()),
        ];

        if toggles.perf {
            args.push(format!("-D{project}_PERF_PROFILING=ON"));
        }
        if toggles.coverage {
            args.push(format!("-D{project}_CODE_COVERAGE=ON"));
        }
        args.push(format!("-D{project}_LLVM_MAJOR_VERSION={llvm}"));
        if toggles.prof {
            args.push(format!("-D{project}_SELF_TRACING=ON"));
            args.push(format!("-D{subproject}_SELF_TRACING=ON"));
        }
        if toggles.sanitiser.is_enabled() {
            args.push(format!("-D{project}_USE_SANITISER={}", toggles.sanitiser));
            args.push(format!("-D{subproject}_USE_SANITISER={}", toggles.sanitiser));
        }
        if toggles.disable_spinlock {
            args.push(format!("-D{subproject}_USE_SPINLOCK=OFF"));
        }
        if identity.isolation.is_enabled() {
            args.push(format!("-D{project}_SGX_MODE={}", identity.isolation));
        }
        if let Some(ref cpu) = toggles.cpu {
            args.push(format!("-D{project}_TARGET_CPU={cpu}"));
        }
        args.extend(
            self.cmake
                .variables
                .iter()
                .map(|(key, value)| format!("-D{key}={value}")),
        );

        ToolCommand::new(&self.toolchain.cmake)
            .args(args)
            .arg(self.layout.project_root.to_string_lossy())
            .current_dir(build_dir.path())
    }

    /// Build `targets` in an already-configured directory
    ///
    /// A `parallelism` of zero or less leaves the job count to the generator.
    /// With `on_line`, tool output is streamed to the callback instead of the
    /// terminal.
    pub async fn compile(
        &self,
        build_dir: &BuildDirectory,
        targets: &CompileTargets,
        parallelism: i32,
        on_line: Option<&(dyn Fn(String) + Send + Sync)>,
    ) -> KilnResult<()> {
        let command = self.compile_command(build_dir, targets, parallelism);
        debug!("Compiling in {}", build_dir.path().display());

        match on_line {
            Some(on_line) => self.runner.run_streaming(&command, on_line).await,
            None => self.runner.run(&command).await,
        }
    }

    /// The compile command line
    pub fn compile_command(
        &self,
        build_dir: &BuildDirectory,
        targets: &CompileTargets,
        parallelism: i32,
    ) -> ToolCommand {
        let mut command = ToolCommand::new(&self.toolchain.cmake).args(["--build", "."]);

        if let CompileTargets::Named(names) = targets {
            command = command.arg("--target").args(names.iter().cloned());
        }
        if parallelism > 0 {
            command = command.arg("--parallel").arg(parallelism.to_string());
        }

        command.current_dir(build_dir.path())
    }
}
