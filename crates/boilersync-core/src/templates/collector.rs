//! Token discovery and collection of missing variable values

use super::syntax::Template;
use crate::context::{is_builtin, InterpolationContext};
use crate::error::Result;
use crate::prompt::Prompter;
use std::collections::BTreeSet;
use tracing::debug;

/// Identifiers referenced by `text`
///
/// Template sources may contain look-alike sequences that were never meant as
/// tokens, so text that does not parse references nothing.
pub fn extract_tokens(text: &str) -> BTreeSet<String> {
    match Template::parse(text) {
        Ok(template) => template.tokens().into_iter().map(str::to_string).collect(),
        Err(e) => {
            debug!(error = %e, "text is not a template, skipping token scan");
            BTreeSet::new()
        }
    }
}

/// Prompt for every token the context cannot resolve yet, in ascending order
///
/// Built-in names are never prompted for here; they come from the project
/// names. Returns the names that were collected by this call.
pub fn collect_missing<P>(
    tokens: &BTreeSet<String>,
    ctx: &mut InterpolationContext,
    prompter: &mut P,
) -> Result<Vec<String>>
where
    P: Prompter + ?Sized,
{
    let mut collected = Vec::new();

    for name in tokens {
        if is_builtin(name) || ctx.has_variable(name) {
            continue;
        }

        let raw = prompter.variable(name, &prompt_label(name))?;
        ctx.collect_raw(name.as_str(), &raw)?;
        debug!(variable = %name, "collected variable");
        collected.push(name.clone());
    }

    Ok(collected)
}

/// Human-friendly prompt text, hinted by the name's suffix
pub fn prompt_label(name: &str) -> String {
    let lower = name.to_lowercase();
    let hint = [
        ("_name", "name"),
        ("_url", "URL"),
        ("_email", "email address"),
        ("_version", "version number"),
        ("_description", "description"),
    ]
    .iter()
    .find(|(suffix, _)| lower.ends_with(suffix))
    .map(|(_, hint)| *hint);

    match hint {
        Some(hint) => format!("Enter value for '{}' ({})", name, hint),
        None => format!("Enter value for '{}'", name),
    }
}
