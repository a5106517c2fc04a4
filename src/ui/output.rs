//! Step-by-step build output
//!
//! Interactive runs go through cliclack with an amber palette; CI and dry
//! runs get one bracket-tagged line per step so logs stay greppable.

use super::context::UiContext;
use cliclack::ThemeState;
use console::{style, Style};

/// Amber while a step runs, green once it lands
struct KilnTheme;

impl KilnTheme {
    fn amber() -> Style {
        Style::new().color256(214)
    }
}

impl cliclack::Theme for KilnTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Submit => Self::amber().dim(),
            _ => self.state_symbol_color(state),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Self::amber(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the cliclack theme; call once at startup
pub fn init_theme() {
    cliclack::set_theme(KilnTheme);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Done,
    Warn,
    Note,
}

impl Mark {
    fn tag(self) -> String {
        match self {
            Mark::Done => style("[OK]").green().to_string(),
            Mark::Warn => style("[WARN]").yellow().to_string(),
            Mark::Note => style("[INFO]").dim().to_string(),
        }
    }
}

fn step(ctx: &UiContext, mark: Mark, line: &str) {
    if !ctx.use_fancy_output() {
        println!("  {} {}", mark.tag(), line);
        return;
    }

    let _ = match mark {
        Mark::Done => cliclack::log::success(line),
        Mark::Warn => cliclack::log::warning(line),
        Mark::Note => cliclack::log::info(line),
    };
}

fn with_detail(ctx: &UiContext, message: &str, detail: &str, separator: &str) -> String {
    if ctx.use_fancy_output() {
        format!("{}{}{}", message, separator, style(detail).dim())
    } else {
        format!("{}{}{}", message, separator, detail)
    }
}

/// Banner naming the command and the build it acts on
pub fn intro(ctx: &UiContext, title: &str) {
    let title = style(title).yellow().bold();
    if ctx.use_fancy_output() {
        let _ = cliclack::intro(title);
    } else {
        println!("{}\n", title);
    }
}

pub fn outro(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::outro(style(message).green().bold());
    } else {
        println!("\n{} {}", Mark::Done.tag(), message);
    }
}

/// Pipeline stage header (Dependencies, Configure, Compile)
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        let _ = cliclack::log::step(style(title).bold());
    } else {
        println!("{}", style(title).bold());
    }
}

/// A finished step
pub fn done(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Done, message);
}

/// A finished step and the path or value it produced
pub fn done_detail(ctx: &UiContext, message: &str, detail: &str) {
    step(ctx, Mark::Done, &with_detail(ctx, message, detail, ": "));
}

/// Something off that does not stop the build, with an optional next step
pub fn warn(ctx: &UiContext, message: &str, hint: Option<&str>) {
    match hint {
        Some(hint) => step(ctx, Mark::Warn, &with_detail(ctx, message, hint, " - ")),
        None => step(ctx, Mark::Warn, message),
    }
}

/// Informational line, e.g. what a dry run would have done
pub fn note(ctx: &UiContext, message: &str) {
    step(ctx, Mark::Note, message);
}

pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        let _ = cliclack::log::remark(message);
    } else {
        println!("  {}", style(message).dim());
    }
}

/// `key: value` row in a status listing
pub fn field(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Status row coloured (or tagged, in CI) by whether it is healthy
pub fn field_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    if !ctx.use_fancy_output() {
        let mark = if ok { Mark::Done } else { Mark::Warn };
        println!("  {} {}: {}", mark.tag(), key, value);
        return;
    }

    let value = if ok {
        style(value).green()
    } else {
        style(value).yellow()
    };
    println!("  {}: {}", style(key).dim(), value);
}
