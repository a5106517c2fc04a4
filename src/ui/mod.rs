//! Terminal output with CI fallback
//!
//! Uses `cliclack` for step logging and spinners and `indicatif` for the
//! compile progress bar, falling back to plain lines when stdout is not a
//! terminal or a CI environment is detected.

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    done, done_detail, field, field_status, init_theme, intro, note, outro, remark, section, warn,
};
pub use progress::{BuildProgress, TaskSpinner};
