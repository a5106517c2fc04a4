//! Coverage command - merge raw profile data and render a report

use super::CommandContext;
use crate::cli::args::CoverageArgs;
use crate::error::KilnResult;
use crate::history::BuildEvent;
use crate::toolchain::CoverageReport;
use crate::ui::{self, TaskSpinner};

/// Execute the coverage command
pub async fn execute(args: CoverageArgs, ctx: &CommandContext) -> KilnResult<()> {
    ui::intro(&ctx.ui, "kiln coverage");

    let report = CoverageReport::new(
        &ctx.layout,
        &ctx.config.coverage,
        ctx.config.toolchain.llvm_major_version,
        ctx.runner.as_ref(),
    )
    .dry_run(ctx.dry_run);
    // Both tools run from the project root
    let file_in = ctx.layout.project_root.join(&args.file_in);
    let file_out = ctx.layout.project_root.join(&args.file_out);

    let mut spinner = TaskSpinner::new(&ctx.ui);
    spinner.start("Rendering coverage report...");
    if let Err(e) = report.render(&file_in, &file_out).await {
        spinner.stop_error("Coverage report failed");
        return Err(e);
    }
    spinner.stop(&format!("Report written to {}", file_out.display()));

    ctx.history
        .record(BuildEvent::CoverageRendered {
            binary: report.test_binary(),
            input: file_in,
            output: file_out,
        })
        .await;

    ui::outro(&ctx.ui, "Coverage report ready");
    Ok(())
}
