//! Cc command - compile targets in the current build directory

use super::CommandContext;
use crate::build::{BuildToggles, CompileTargets};
use crate::cache::DependencyCache;
use crate::cli::args::CcArgs;
use crate::discover;
use crate::error::KilnResult;
use crate::history::BuildEvent;
use crate::ui;
use tracing::debug;

/// Execute the cc command
///
/// The build directory is whichever one was touched last. `--clean`
/// reconfigures it from scratch with default toggles first.
pub async fn execute(args: CcArgs, ctx: &CommandContext) -> KilnResult<()> {
    let mut build_dir = discover::discover_current(&ctx.layout.build_root).await?;
    let label = build_dir
        .identity()
        .map(|identity| identity.to_string())
        .unwrap_or_else(|| build_dir.path().display().to_string());
    ui::intro(&ctx.ui, &format!("kiln cc ({})", label));
    if build_dir.identity().is_none() {
        ui::warn(&ctx.ui, "Build directory name does not match any build identity", None);
    }

    if args.clean {
        let identity = build_dir.identity().unwrap_or_default();
        debug!("Reconfiguring {} from scratch", identity);
        let cache = DependencyCache::locate(&ctx.layout, identity.build_type)?;
        build_dir = ctx
            .invoker()
            .configure(identity, &cache, &BuildToggles::default(), true)
            .await?;
        ui::done_detail(&ctx.ui, "Reconfigured", &build_dir.path().display().to_string());
    }

    let targets = CompileTargets::from_names(args.targets.iter().cloned());
    ctx.compile(&build_dir, &targets, args.parallel).await?;
    ui::done(&ctx.ui, &format!("Built {}", args.targets.join(" ")));
    ctx.history
        .record(BuildEvent::Compiled {
            identity: label,
            dir: build_dir.path().to_path_buf(),
            targets: args.targets.clone(),
        })
        .await;

    ctx.publish(&build_dir).await?;

    ui::outro(&ctx.ui, "Compile finished");
    Ok(())
}
