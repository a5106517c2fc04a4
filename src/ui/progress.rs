//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for compile steps.
///
/// Parses Ninja `[N/M] <description>` lines. Only created in interactive
/// mode; in CI the tool writes straight to the terminal instead.
pub struct BuildProgress {
    bar: ProgressBar,
}

impl BuildProgress {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar().template(
            "  {spinner:.yellow} {prefix}  {bar:20.yellow/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}",
        ) {
            bar.set_style(
                bar_style
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
        }
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }

    /// Process a build output line
    pub fn on_line(&self, line: String) {
        match parse_ninja_line(&line) {
            Some((n, total, description)) => {
                self.bar.set_length(total);
                self.bar.set_position(n);
                self.bar.set_message(truncate(description));
            }
            None => {
                let trimmed = line.trim();
                // Compiler diagnostics interrupt the bar rather than vanish
                if is_diagnostic(trimmed) {
                    self.bar.println(trimmed);
                }
            }
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > 60 {
        let head: String = text.chars().take(57).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn is_diagnostic(line: &str) -> bool {
    line.contains("error:") || line.contains("warning:") || line.starts_with("FAILED:")
}

/// Parse a Ninja status line like `[12/345] Building CXX object ...`
fn parse_ninja_line(line: &str) -> Option<(u64, u64, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (n, total) = rest[..close].split_once('/')?;
    let n: u64 = n.trim().parse().ok()?;
    let total: u64 = total.trim().parse().ok()?;
    Some((n, total, rest[close + 1..].trim()))
}
