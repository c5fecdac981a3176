//! BoilerSync Core - template expansion and project synchronization
//!
//! This library expands a directory of `$${name}` templates into a project,
//! records what it used in a `.boilersync` manifest at the project root, and
//! can later re-pull the template over the project without asking the same
//! questions again.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Name normalization, the interpolation context,
//!   template syntax, directory processing, manifest I/O and the project registry
//! - **Layer 2: Workflow Orchestration** - `workflow::{init, pull, sync}` and
//!   `diff::stage`, driven through the `Prompter` trait so any UI can answer questions
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use boilersync_core::{workflow, NonInteractive, PullOptions, TemplateLibrary};
//!
//! let library = TemplateLibrary::new("/home/ada/boilerplate");
//! let options = PullOptions::new("./my-app").template("hello");
//! let outcome = workflow::init(&library, &options, &mut NonInteractive::new())?;
//! println!("wrote {} files", outcome.pull.report.file_count());
//! ```

pub mod config;
pub mod context;
pub mod diff;
pub mod error;
pub mod names;
pub mod project;
pub mod prompt;
pub mod templates;
pub mod workflow;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::Settings;
pub use context::{InterpolationContext, Scalar};
pub use error::{Error, Result};
pub use names::ProjectNames;
pub use project::Manifest;
pub use prompt::{NonInteractive, Prompter};
pub use templates::TemplateLibrary;
pub use workflow::{PullOptions, PullOutcome};
