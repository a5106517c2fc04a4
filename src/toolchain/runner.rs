//! External command execution
//!
//! Every call out to Conan, CMake or LLVM goes through [`ToolRunner`], so the
//! orchestration logic can be driven without spawning anything.

use super::{build_error_output, stream_child_output};
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{debug, info};

/// A fully-resolved external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Redirect stdout into this file
    pub stdout_file: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            stdout_file: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self
    }

    /// True if `flag` appears as an argument
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }

    /// Value following `flag`, if present
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        if let Some(ref out) = self.stdout_file {
            write!(f, " > {}", shell_quote(&out.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars().all(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ',' | '+')
        });
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Executes external commands
///
/// Every call blocks the pipeline until the tool exits. A non-zero exit is
/// returned as [`KilnError::ToolFailed`] and never retried.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run with output passed straight through to the terminal
    async fn run(&self, command: &ToolCommand) -> KilnResult<()>;

    /// Run, handing each output line to `on_line`
    async fn run_streaming(
        &self,
        command: &ToolCommand,
        on_line: &(dyn Fn(String) + Send + Sync),
    ) -> KilnResult<()> {
        let _ = on_line;
        self.run(command).await
    }
}

/// Runs commands as child processes
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(tool: &ToolCommand) -> Command {
        let mut cmd = Command::new(&tool.program);
        cmd.args(&tool.args);
        if let Some(ref cwd) = tool.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    async fn stdout_target(tool: &ToolCommand) -> KilnResult<Stdio> {
        match tool.stdout_file {
            Some(ref path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .map_err(|e| KilnError::io(format!("creating {}", path.display()), e))?;
                Ok(Stdio::from(file.into_std().await))
            }
            None => Ok(Stdio::inherit()),
        }
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand) -> KilnResult<()> {
        info!("{}", command);

        let stdout = Self::stdout_target(command).await?;
        let status = Self::command(command)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| KilnError::command_failed(command.to_string(), e))?;

        check_status(command, status, None)
    }

    async fn run_streaming(
        &self,
        command: &ToolCommand,
        on_line: &(dyn Fn(String) + Send + Sync),
    ) -> KilnResult<()> {
        info!("{}", command);

        let mut child = Self::command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| KilnError::command_failed(command.to_string(), e))?;

        let lines = stream_child_output(&mut child, on_line).await?;
        let status = child
            .wait()
            .await
            .map_err(|e| KilnError::command_failed(command.to_string(), e))?;

        check_status(command, status, Some(build_error_output(&lines)))
    }
}

fn check_status(
    command: &ToolCommand,
    status: ExitStatus,
    output: Option<String>,
) -> KilnResult<()> {
    if status.success() {
        return Ok(());
    }

    match status.code() {
        Some(code) => Err(KilnError::ToolFailed {
            command: command.to_string(),
            code,
            output,
        }),
        None => Err(KilnError::ToolSignaled {
            command: command.to_string(),
        }),
    }
}

/// Prints and records commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunRunner {
    recorded: Mutex<Vec<ToolCommand>>,
    quiet: bool,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record without printing
    pub fn quiet() -> Self {
        Self {
            recorded: Mutex::default(),
            quiet: true,
        }
    }

    /// Commands seen so far, in order
    pub fn recorded(&self) -> Vec<ToolCommand> {
        self.recorded
            .lock()
            .map(|cmds| cmds.clone())
            .unwrap_or_default()
    }

    /// Commands whose program matches `program`
    pub fn recorded_for(&self, program: &str) -> Vec<ToolCommand> {
        self.recorded()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

#[async_trait]
impl ToolRunner for DryRunRunner {
    async fn run(&self, command: &ToolCommand) -> KilnResult<()> {
        debug!("dry-run: {}", command);
        if !self.quiet {
            match command.cwd {
                Some(ref cwd) => println!("(cd {} && {})", display(cwd), command),
                None => println!("{}", command),
            }
        }
        if let Ok(mut cmds) = self.recorded.lock() {
            cmds.push(command.clone());
        }
        Ok(())
    }
}

fn display(path: &Path) -> String {
    shell_quote(&path.to_string_lossy())
}
