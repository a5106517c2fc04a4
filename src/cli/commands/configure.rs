//! Configure command - run CMake for one build identity

use super::CommandContext;
use crate::build::{self, BuildIdentity};
use crate::cache::DependencyCache;
use crate::cli::args::ConfigureArgs;
use crate::error::KilnResult;
use crate::history::BuildEvent;
use crate::ui;

/// Execute the configure command
///
/// The dependency cache must already exist; it is never created here.
pub async fn execute(args: ConfigureArgs, ctx: &CommandContext) -> KilnResult<()> {
    let options = &args.options;
    build::validate(options.build, options.isolation, options.sanitiser)?;

    let identity = BuildIdentity::new(options.build, options.isolation);
    ui::intro(&ctx.ui, &format!("kiln configure ({})", identity));

    let cache = DependencyCache::locate(&ctx.layout, identity.build_type)?;
    let build_dir = ctx
        .invoker()
        .configure(identity, &cache, &args.toggles(), options.clean)
        .await?;

    ui::done_detail(
        &ctx.ui,
        "Configured",
        &build_dir.path().display().to_string(),
    );
    ctx.history
        .record(BuildEvent::Configured {
            identity: identity.to_string(),
            dir: build_dir.path().to_path_buf(),
            clean: options.clean,
        })
        .await;

    ctx.publish(&build_dir).await?;

    ui::outro(&ctx.ui, "Build configured");
    Ok(())
}
