//! Template discovery, token scanning, and expansion
//!
//! This module provides:
//! - The template library (listing and resolving template ids)
//! - The `$${name}` token grammar shared by scanning and substitution
//! - Variable collection for tokens the context cannot resolve
//! - Recursive expansion of a template tree into a target directory

pub mod collector;
pub mod library;
pub mod processor;
pub mod syntax;

pub use collector::{collect_missing, extract_tokens, prompt_label};
pub use library::TemplateLibrary;
pub use processor::{process_template_directory, ProcessReport};
pub use syntax::{interpolate, Template};
