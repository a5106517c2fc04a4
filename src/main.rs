//! Kiln - build configuration and invocation engine
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kiln::cli::{commands, Cli, Commands};
use kiln::config::{Config, ConfigManager, Layout, LOCAL_CONFIG_FILE};
use kiln::error::{KilnError, KilnResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(kind = ?e.kind(), "command failed");
            if let Some(output) = e.tool_output() {
                eprintln!("{}", style(output).dim());
            }
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> KilnResult<()> {
    let cli = Cli::parse();

    // Completions need neither config nor logging
    if let Commands::Completions(args) = cli.command {
        return commands::completions(args);
    }

    let cwd = std::env::current_dir().map_err(|e| KilnError::io("getting current directory", e))?;

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&cwd)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    kiln::ui::init_theme();

    match local_config_path {
        Some(ref path) => debug!("Using local config: {}", path.display()),
        None if cli.no_local => debug!("Local config discovery disabled (--no-local)"),
        None => debug!("No local config found"),
    }

    if let Commands::Config(args) = cli.command {
        let local_path = local_config_path.unwrap_or_else(|| cwd.join(LOCAL_CONFIG_FILE));
        return commands::config(args, &config, &config_manager, &local_path).await;
    }

    let layout = Layout::for_invocation(
        &config,
        cli.project.as_deref(),
        &cwd,
        local_config_path.as_deref(),
    );
    debug!("Project root: {}", layout.project_root.display());
    let ctx = commands::CommandContext::new(config, layout, cli.dry_run);

    match cli.command {
        Commands::Deps(args) => commands::deps(args, &ctx).await,
        Commands::Configure(args) => commands::configure(args, &ctx).await,
        Commands::Tools(args) => commands::tools(args, &ctx).await,
        Commands::Cc(args) => commands::cc(args, &ctx).await,
        Commands::Coverage(args) => commands::coverage(args, &ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Config(_) | Commands::Completions(_) => {
            Err(KilnError::Internal("command already dispatched".to_string()))
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUST_LOG` wins when set
fn init_logging(verbose: u8, config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("kiln=warn"),
        1 => EnvFilter::new("kiln=info"),
        _ => EnvFilter::new("kiln=debug"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
