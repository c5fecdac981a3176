//! Interpolation context: project names plus collected variables
//!
//! A context is owned by exactly one pull. It is seeded from a previously
//! persisted manifest (if any), grows as the collector resolves new tokens,
//! and is projected back into a manifest once the walk completes.

use crate::error::{Error, Result};
use crate::names::ProjectNames;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Built-in token bound to the snake_case project name
pub const PROJECT_NAME_SNAKE: &str = "project_name_snake";

/// Built-in token bound to the display project name
pub const PROJECT_NAME_PRETTY: &str = "project_name_pretty";

/// Whether a token name is one of the built-in project names
pub fn is_builtin(name: &str) -> bool {
    name == PROJECT_NAME_SNAKE || name == PROJECT_NAME_PRETTY
}

/// A collected variable value
///
/// Untagged so that the manifest stores plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Infer the narrowest scalar type for a raw answer
    ///
    /// Tries boolean (case-insensitive), then integer, then finite float.
    /// A number is only converted when substituting it back reproduces the
    /// answer exactly: a leading `+`, a redundant leading zero, exponent
    /// notation, or an integer too large for `i64` all stay strings.
    pub fn infer(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            return Scalar::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Scalar::Bool(false);
        }

        if is_plain_number(raw) {
            if let Ok(i) = raw.parse::<i64>() {
                return Scalar::Int(i);
            }
            if let Ok(f) = raw.parse::<f64>() {
                if f.is_finite() && format!("{:?}", f) == raw {
                    return Scalar::Float(f);
                }
            }
        }

        Scalar::String(raw.to_string())
    }

    /// Text substituted into templates
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            // Debug keeps the fractional part ("1.0" rather than "1")
            Scalar::Float(x) => write!(f, "{:?}", x),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number or string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Int(v))
    }

    // Integers past i64 keep their digits as text
    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Scalar, E> {
        Ok(i64::try_from(v)
            .map(Scalar::Int)
            .unwrap_or_else(|_| Scalar::String(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Scalar, E> {
        Ok(Scalar::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Scalar, E> {
        Ok(Scalar::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Scalar, E> {
        Ok(Scalar::String(v))
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

fn is_plain_number(raw: &str) -> bool {
    let unsigned = raw.strip_prefix('-').unwrap_or(raw);
    let mut chars = unsigned.chars();
    let leading_zero = matches!(
        (chars.next(), chars.next()),
        (Some('0'), Some(c)) if c.is_ascii_digit()
    );

    unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && unsigned.chars().any(|c| c.is_ascii_digit())
        && unsigned
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && !leading_zero
}

/// How a token resolves against the context
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    BuiltIn(&'a str),
    Variable(&'a Scalar),
    Missing,
}

impl<'a> Resolution<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolution::Missing)
    }

    /// Substitution text, `None` when missing
    pub fn as_text(&self) -> Option<Cow<'a, str>> {
        match self {
            Resolution::BuiltIn(s) => Some(Cow::Borrowed(s)),
            Resolution::Variable(v) => Some(v.as_text()),
            Resolution::Missing => None,
        }
    }
}

/// Names and variables available for substitution during one pull
#[derive(Debug, Clone, Default)]
pub struct InterpolationContext {
    names: Option<ProjectNames>,
    variables: BTreeMap<String, Scalar>,
}

impl InterpolationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project names; they are fixed for the rest of the run
    pub fn set_project_names(&mut self, names: ProjectNames) -> Result<()> {
        match &self.names {
            Some(existing) if *existing == names => Ok(()),
            Some(existing) => Err(Error::ContextReinitialized {
                existing: existing.to_string(),
                attempted: names.to_string(),
            }),
            None => {
                self.names = Some(names);
                Ok(())
            }
        }
    }

    pub fn project_names(&self) -> Option<&ProjectNames> {
        self.names.as_ref()
    }

    /// Seed variables, typically from a persisted manifest
    pub fn set_collected_variables<I>(&mut self, variables: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, Scalar)>,
    {
        for (name, value) in variables {
            self.set_collected_variable(name, value)?;
        }
        Ok(())
    }

    /// Bind a variable; rebinding to a different value is a conflict
    pub fn set_collected_variable(&mut self, name: impl Into<String>, value: Scalar) -> Result<()> {
        let name = name.into();
        match self.variables.get(&name) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(Error::VariableConflict {
                existing: existing.to_string(),
                attempted: value.to_string(),
                name,
            }),
            None => {
                self.variables.insert(name, value);
                Ok(())
            }
        }
    }

    /// Bind a variable from a raw answer, inferring its scalar type
    pub fn collect_raw(&mut self, name: impl Into<String>, raw: &str) -> Result<()> {
        self.set_collected_variable(name, Scalar::infer(raw))
    }

    /// Whether `name` resolves to anything
    pub fn has_variable(&self, name: &str) -> bool {
        !self.resolve(name).is_missing()
    }

    /// Resolve a token; built-ins never consult the variable map
    pub fn resolve(&self, name: &str) -> Resolution<'_> {
        if is_builtin(name) {
            return match &self.names {
                Some(names) if name == PROJECT_NAME_SNAKE => Resolution::BuiltIn(&names.snake),
                Some(names) => Resolution::BuiltIn(&names.pretty),
                None => Resolution::Missing,
            };
        }

        match self.variables.get(name) {
            Some(value) => Resolution::Variable(value),
            None => Resolution::Missing,
        }
    }

    /// Snapshot of collected variables, excluding built-ins
    pub fn collected_variables(&self) -> BTreeMap<String, Scalar> {
        self.variables.clone()
    }
}
