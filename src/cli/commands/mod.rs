//! CLI command implementations

pub mod cc;
pub mod completions;
pub mod config;
pub mod configure;
pub mod coverage;
pub mod deps;
pub mod status;
pub mod tools;

pub use cc::execute as cc;
pub use completions::execute as completions;
pub use config::execute as config;
pub use configure::execute as configure;
pub use coverage::execute as coverage;
pub use deps::execute as deps;
pub use status::execute as status;
pub use tools::execute as tools;

use crate::build::{BuildDirectory, CompileTargets};
use crate::cache::DependencyCacheManager;
use crate::config::{Config, Layout};
use crate::error::KilnResult;
use crate::history::{BuildEvent, BuildHistory};
use crate::publish;
use crate::toolchain::{BuildInvoker, DryRunRunner, SystemRunner, ToolRunner};
use crate::ui::{self, BuildProgress, UiContext};
use std::sync::Arc;
use tracing::info;

/// Everything a build command needs, resolved once per invocation
pub struct CommandContext {
    pub config: Config,
    pub layout: Layout,
    pub runner: Arc<dyn ToolRunner>,
    pub dry_run: bool,
    pub history: BuildHistory,
    pub ui: UiContext,
}

impl CommandContext {
    pub fn new(config: Config, layout: Layout, dry_run: bool) -> Self {
        let runner: Arc<dyn ToolRunner> = if dry_run {
            Arc::new(DryRunRunner::new())
        } else {
            Arc::new(SystemRunner::new())
        };
        let history = if dry_run {
            BuildHistory::disabled()
        } else {
            BuildHistory::new(&config)
        };
        let ui = if dry_run {
            UiContext::non_interactive()
        } else {
            UiContext::detect()
        };

        Self {
            config,
            layout,
            runner,
            dry_run,
            history,
            ui,
        }
    }

    pub fn cache_manager(&self) -> DependencyCacheManager<'_> {
        DependencyCacheManager::new(&self.layout, &self.config.toolchain.conan, self.runner.as_ref())
            .dry_run(self.dry_run)
    }

    pub fn invoker(&self) -> BuildInvoker<'_> {
        BuildInvoker::new(
            &self.layout,
            &self.config.toolchain,
            &self.config.cmake,
            self.runner.as_ref(),
        )
        .dry_run(self.dry_run)
    }

    /// Compile, with a progress bar when attached to a terminal
    pub async fn compile(
        &self,
        build_dir: &BuildDirectory,
        targets: &CompileTargets,
        parallelism: i32,
    ) -> KilnResult<()> {
        let invoker = self.invoker();

        if !self.ui.use_fancy_output() {
            return invoker.compile(build_dir, targets, parallelism, None).await;
        }

        let label = build_dir
            .identity()
            .map(|identity| identity.to_string())
            .unwrap_or_else(|| "build".to_string());
        let progress = BuildProgress::new(&label);
        let on_line = |line: String| progress.on_line(line);
        let result = invoker
            .compile(build_dir, targets, parallelism, Some(&on_line))
            .await;
        progress.finish();
        result
    }

    /// Re-point the canonical `bin` link at `build_dir`
    pub async fn publish(&self, build_dir: &BuildDirectory) -> KilnResult<()> {
        let link = self.layout.bin_link();

        if self.dry_run {
            info!("dry-run: would link {} -> {}", link.display(), build_dir.bin_dir().display());
            ui::note(
                &self.ui,
                &format!("Would link {} -> {}", link.display(), build_dir.bin_dir().display()),
            );
            return Ok(());
        }

        let target = publish::publish(&link, build_dir).await?;
        ui::done_detail(&self.ui, "Published bin", &target.display().to_string());
        self.history
            .record(BuildEvent::Published {
                link,
                target,
                identity: build_dir.identity().map(|i| i.to_string()),
            })
            .await;
        Ok(())
    }
}
