//! Tools command - dependencies, configure and the developer targets in one go

use super::CommandContext;
use crate::build::{self, BuildIdentity, CompileTargets};
use crate::cli::args::ToolsArgs;
use crate::error::KilnResult;
use crate::history::BuildEvent;
use crate::ui;

/// Execute the tools command
pub async fn execute(args: ToolsArgs, ctx: &CommandContext) -> KilnResult<()> {
    let options = &args.options;
    build::validate(options.build, options.isolation, options.sanitiser)?;

    let identity = BuildIdentity::new(options.build, options.isolation);
    ui::intro(&ctx.ui, &format!("kiln tools ({})", identity));

    ui::section(&ctx.ui, "Dependencies");
    let cache = ctx
        .cache_manager()
        .ensure(options.build, options.sanitiser, options.clean)
        .await?;
    ui::done_detail(&ctx.ui, "Dependency cache ready", &cache.dir().display().to_string());

    ui::section(&ctx.ui, "Configure");
    let build_dir = ctx
        .invoker()
        .configure(identity, &cache, &args.toggles(), options.clean)
        .await?;
    ui::done_detail(&ctx.ui, "Configured", &build_dir.path().display().to_string());

    ui::section(&ctx.ui, "Compile");
    let targets = CompileTargets::from_names(ctx.config.build.dev_targets.iter().cloned());
    ctx.compile(&build_dir, &targets, args.parallel).await?;
    ui::done(&ctx.ui, "Developer targets built");
    ctx.history
        .record(BuildEvent::Compiled {
            identity: identity.to_string(),
            dir: build_dir.path().to_path_buf(),
            targets: ctx.config.build.dev_targets.clone(),
        })
        .await;

    ctx.publish(&build_dir).await?;

    ui::outro(&ctx.ui, "Tools built");
    Ok(())
}
