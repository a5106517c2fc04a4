//! Coverage report rendering
//!
//! `llvm-profdata merge` folds raw profiles into one intermediate file, then
//! `llvm-cov show` renders a text report against the debug test binary.

use super::{ToolCommand, ToolRunner};
use crate::build::{BuildIdentity, BuildType, IsolationMode};
use crate::config::schema::CoverageConfig;
use crate::config::Layout;
use crate::error::KilnResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Two-step coverage report
pub struct CoverageReport<'a> {
    layout: &'a Layout,
    config: &'a CoverageConfig,
    llvm_major_version: u32,
    runner: &'a dyn ToolRunner,
    dry_run: bool,
}

impl<'a> CoverageReport<'a> {
    pub fn new(
        layout: &'a Layout,
        config: &'a CoverageConfig,
        llvm_major_version: u32,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            layout,
            config,
            llvm_major_version,
            runner,
            dry_run: false,
        }
    }

    /// Leave any existing intermediate file alone
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Merged profile data location
    pub fn intermediate_path(&self) -> PathBuf {
        self.layout.project_root.join(&self.config.intermediate)
    }

    /// Test binary of the plain debug build
    pub fn test_binary(&self) -> PathBuf {
        self.layout
            .build_directory(BuildIdentity::new(BuildType::Debug, IsolationMode::Disabled))
            .bin_dir()
            .join(&self.config.test_binary)
    }

    /// Merge `raw_profile` and write the rendered report to `output`
    ///
    /// The intermediate file is removed afterwards, on success or failure,
    /// unless `keep_intermediate` is set or this is a dry run.
    pub async fn render(&self, raw_profile: &Path, output: &Path) -> KilnResult<()> {
        let intermediate = self.intermediate_path();
        let _guard = IntermediateGuard {
            path: &intermediate,
            keep: self.config.keep_intermediate || self.dry_run,
        };

        info!("Merging raw profile data from {}", raw_profile.display());
        self.runner
            .run(&self.merge_command(raw_profile, &intermediate))
            .await?;

        info!("Rendering coverage report to {}", output.display());
        self.runner
            .run(&self.show_command(&intermediate, output))
            .await?;

        Ok(())
    }

    pub fn merge_command(&self, raw_profile: &Path, intermediate: &Path) -> ToolCommand {
        ToolCommand::new(format!("llvm-profdata-{}", self.llvm_major_version))
            .args(["merge", "-sparse"])
            .arg(raw_profile.to_string_lossy())
            .arg("-o")
            .arg(intermediate.to_string_lossy())
            .current_dir(&self.layout.project_root)
    }

    pub fn show_command(&self, intermediate: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(format!("llvm-cov-{}", self.llvm_major_version))
            .arg("show")
            .arg(format!("--ignore-filename-regex={}", self.config.exclude_regex))
            .arg(self.test_binary().to_string_lossy())
            .arg(format!("-instr-profile={}", intermediate.display()))
            .current_dir(&self.layout.project_root)
            .stdout_to(output)
    }
}

/// Removes the merged profile when the report step is over
struct IntermediateGuard<'a> {
    path: &'a Path,
    keep: bool,
}

impl Drop for IntermediateGuard<'_> {
    fn drop(&mut self) {
        if self.keep {
            debug!("Keeping {}", self.path.display());
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
