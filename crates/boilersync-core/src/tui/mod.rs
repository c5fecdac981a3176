//! CLI prompts using cliclack (Charm-style inline prompts)
//!
//! This module is optional and only available when the `tui` feature is enabled.

#[cfg(feature = "tui")]
mod prompts;

#[cfg(feature = "tui")]
pub use prompts::{
    list_templates, run_diff, run_init, run_pull, ClackPrompter, DiffArgs, InitArgs, PullArgs,
};
