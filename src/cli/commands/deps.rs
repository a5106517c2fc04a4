//! Deps command - prepare the dependency lockfile and package cache

use super::CommandContext;
use crate::cli::args::DepsArgs;
use crate::error::KilnResult;
use crate::history::BuildEvent;
use crate::ui;

/// Execute the deps command
pub async fn execute(args: DepsArgs, ctx: &CommandContext) -> KilnResult<()> {
    ui::intro(&ctx.ui, &format!("kiln deps ({})", args.build));

    let cache = ctx
        .cache_manager()
        .ensure(args.build, args.sanitiser, args.clean)
        .await?;

    ui::done_detail(
        &ctx.ui,
        "Dependency cache ready",
        &cache.dir().display().to_string(),
    );
    ctx.history
        .record(BuildEvent::DepsEnsured {
            build_type: args.build.to_string(),
            sanitiser: args.sanitiser.to_string(),
            clean: args.clean,
            lockfile: cache.lockfile().to_path_buf(),
        })
        .await;

    ui::outro(&ctx.ui, "Dependencies prepared");
    Ok(())
}
