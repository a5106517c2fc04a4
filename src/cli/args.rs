//! CLI argument definitions using clap derive

use crate::build::{BuildToggles, BuildType, IsolationMode, Sanitiser};
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Kiln - build configuration and invocation for CMake + Conan projects
///
/// Resolves build options into a build directory, prepares the dependency
/// cache, drives CMake and keeps `<build root>/bin` pointing at the last
/// successful build.
#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KILN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .kiln.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Project root (overrides paths.project_root)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Print external commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare the dependency lockfile and package cache
    Deps(DepsArgs),

    /// Configure a build directory
    Configure(ConfigureArgs),

    /// Build the standard developer targets
    Tools(ToolsArgs),

    /// Compile targets in the most recently used build directory
    Cc(CcArgs),

    /// Render a coverage report from raw profile data
    Coverage(CoverageArgs),

    /// Show build directories, caches and the current bin link
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the deps command
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Build type (Debug or Release)
    #[arg(short, long, default_value = "Debug")]
    pub build: BuildType,

    /// Sanitiser, selects the dependency profile
    #[arg(short, long, default_value = "None")]
    pub sanitiser: Sanitiser,

    /// Delete lockfile and cache, then rebuild every package
    #[arg(long)]
    pub clean: bool,
}

/// Build axes and toggles shared by configure and tools
#[derive(Args, Debug, Clone)]
pub struct BuildOptions {
    /// Build type (Debug or Release)
    #[arg(short, long, default_value = "Debug")]
    pub build: BuildType,

    /// Hardware isolation mode (Disabled, Simulation, Hardware)
    #[arg(short, long, default_value = "Disabled")]
    pub isolation: IsolationMode,

    /// Compiler sanitiser (None, Address, Thread, Undefined, Leak, Memory)
    #[arg(short, long, default_value = "None")]
    pub sanitiser: Sanitiser,

    /// Enable code coverage instrumentation
    #[arg(long)]
    pub coverage: bool,

    /// Use the alternative to spinlocks
    #[arg(long)]
    pub disable_spinlock: bool,

    /// Wipe the build directory (and dependency cache, for tools) first
    #[arg(long)]
    pub clean: bool,
}

/// Arguments for the configure command
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub options: BuildOptions,

    /// Enable performance profiling
    #[arg(long)]
    pub perf: bool,

    /// Enable self-tracing
    #[arg(long)]
    pub prof: bool,

    /// Target CPU override
    #[arg(long)]
    pub cpu: Option<String>,
}

impl ConfigureArgs {
    pub fn toggles(&self) -> BuildToggles {
        BuildToggles {
            perf: self.perf,
            prof: self.prof,
            coverage: self.options.coverage,
            sanitiser: self.options.sanitiser,
            disable_spinlock: self.options.disable_spinlock,
            cpu: self.cpu.clone(),
        }
    }
}

/// Arguments for the tools command
#[derive(Args, Debug)]
pub struct ToolsArgs {
    #[command(flatten)]
    pub options: BuildOptions,

    /// Parallel jobs (0 = generator default)
    #[arg(short = 'j', long, default_value = "0", allow_negative_numbers = true)]
    pub parallel: i32,
}

impl ToolsArgs {
    pub fn toggles(&self) -> BuildToggles {
        BuildToggles {
            coverage: self.options.coverage,
            sanitiser: self.options.sanitiser,
            disable_spinlock: self.options.disable_spinlock,
            ..BuildToggles::default()
        }
    }
}

/// Arguments for the cc command
#[derive(Args, Debug)]
pub struct CcArgs {
    /// Targets to build ("all" builds everything)
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Reconfigure the build directory from scratch first
    #[arg(long)]
    pub clean: bool,

    /// Parallel jobs (0 = generator default)
    #[arg(short = 'j', long, default_value = "0", allow_negative_numbers = true)]
    pub parallel: i32,
}

/// Arguments for the coverage command
#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Raw profile data to merge (relative to the project root)
    pub file_in: PathBuf,

    /// Where to write the rendered report (relative to the project root)
    pub file_out: PathBuf,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., toolchain.llvm_major_version)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .kiln.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Arguments for the completions command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_deps_defaults() {
        let cli = Cli::parse_from(["kiln", "deps"]);
        match cli.command {
            Commands::Deps(args) => {
                assert_eq!(args.build, BuildType::Debug);
                assert_eq!(args.sanitiser, Sanitiser::None);
                assert!(!args.clean);
            }
            _ => panic!("expected Deps command"),
        }
    }

    #[test]
    fn cli_parses_configure_axes() {
        let cli = Cli::parse_from([
            "kiln",
            "configure",
            "--build",
            "Release",
            "--isolation",
            "sim",
            "--perf",
            "--cpu",
            "znver3",
        ]);
        match cli.command {
            Commands::Configure(args) => {
                assert_eq!(args.options.build, BuildType::Release);
                assert_eq!(args.options.isolation, IsolationMode::Simulation);
                let toggles = args.toggles();
                assert!(toggles.perf);
                assert!(!toggles.prof);
                assert_eq!(toggles.cpu.as_deref(), Some("znver3"));
            }
            _ => panic!("expected Configure command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_build_type() {
        let result = Cli::try_parse_from(["kiln", "configure", "--build", "Fast"]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unrecognised build type: Fast"));
    }

    #[test]
    fn cli_rejects_unknown_isolation_mode() {
        assert!(Cli::try_parse_from(["kiln", "tools", "--isolation", "Partial"]).is_err());
    }

    #[test]
    fn cli_parses_tools_parallel() {
        let cli = Cli::parse_from(["kiln", "tools", "-j", "8", "--sanitiser", "Thread"]);
        match cli.command {
            Commands::Tools(args) => {
                assert_eq!(args.parallel, 8);
                assert_eq!(args.toggles().sanitiser, Sanitiser::Thread);
                assert!(!args.toggles().perf);
            }
            _ => panic!("expected Tools command"),
        }
    }

    #[test]
    fn cli_parses_cc_targets() {
        let cli = Cli::parse_from(["kiln", "cc", "tests", "func_runner", "--parallel", "-1"]);
        match cli.command {
            Commands::Cc(args) => {
                assert_eq!(args.targets, vec!["tests", "func_runner"]);
                assert_eq!(args.parallel, -1);
                assert!(!args.clean);
            }
            _ => panic!("expected Cc command"),
        }
    }

    #[test]
    fn cli_requires_cc_target() {
        assert!(Cli::try_parse_from(["kiln", "cc"]).is_err());
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["kiln", "status", "--dry-run", "-vv", "--project", "/code"]);
        assert!(matches!(cli.command, Commands::Status));
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.project, Some(PathBuf::from("/code")));
    }

    #[test]
    fn cli_parses_config_set_local() {
        let cli = Cli::parse_from(["kiln", "config", "set", "toolchain.generator", "Ninja", "--local"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Set { key, value, local }),
            }) => {
                assert_eq!(key, "toolchain.generator");
                assert_eq!(value, "Ninja");
                assert!(local);
            }
            _ => panic!("expected Config Set command"),
        }
    }

    #[test]
    fn cli_parses_completions() {
        let cli = Cli::parse_from(["kiln", "completions", "zsh"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(CompletionsArgs { shell: Shell::Zsh })
        ));
    }

    #[test]
    fn cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
