//! Prompting seam between the core and whatever renders questions
//!
//! The core only needs the answers. The cliclack implementation lives in
//! `tui`; `NonInteractive` answers from defaults and presets.

use crate::error::{Error, Result};
use crate::names::ProjectNames;
use std::collections::BTreeMap;

/// Source of answers for project names and template variables
pub trait Prompter {
    /// Ask for the project names, offering `default` (derived from the directory name)
    fn project_names(&mut self, default: &ProjectNames) -> Result<ProjectNames>;

    /// Ask for the raw value of a template variable
    fn variable(&mut self, name: &str, label: &str) -> Result<String>;
}

/// Answers without asking: default names and preset variable values
#[derive(Debug, Clone, Default)]
pub struct NonInteractive {
    presets: BTreeMap<String, String>,
}

impl NonInteractive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers for variables, keyed by token name
    pub fn with_presets(presets: BTreeMap<String, String>) -> Self {
        Self { presets }
    }
}

impl Prompter for NonInteractive {
    fn project_names(&mut self, default: &ProjectNames) -> Result<ProjectNames> {
        Ok(default.clone())
    }

    fn variable(&mut self, name: &str, _label: &str) -> Result<String> {
        self.presets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::missing_variable(name))
    }
}

/// Parse `KEY=VALUE` pairs as given on the command line
pub fn parse_assignments<I, S>(pairs: I) -> Result<BTreeMap<String, String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut presets = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        match pair.split_once('=') {
            Some((key, value)) if crate::templates::syntax::is_identifier(key.trim()) => {
                presets.insert(key.trim().to_string(), value.to_string());
            }
            _ => {
                return Err(Error::InvalidAssignment {
                    pair: pair.to_string(),
                })
            }
        }
    }
    Ok(presets)
}
