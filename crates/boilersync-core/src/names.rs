//! Project name normalization

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix given to normalized names that would otherwise start with a digit
const DIGIT_PREFIX: &str = "p_";

/// Convert an arbitrary string (usually a directory name) into a snake_case identifier
///
/// Runs of characters other than ASCII letters and digits collapse into a single
/// underscore; leading and trailing underscores are dropped. The result is
/// idempotent under repeated normalization.
pub fn normalize_to_snake(raw: &str) -> Result<String> {
    let mut snake = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !snake.is_empty() {
                snake.push('_');
            }
            pending_separator = false;
            snake.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    if snake.is_empty() {
        return Err(Error::invalid_name(raw));
    }

    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        snake.insert_str(0, DIGIT_PREFIX);
    }

    Ok(snake)
}

/// Convert a snake_case identifier into a human-readable title ("my_app" -> "My App")
pub fn snake_to_pretty(snake: &str) -> String {
    snake
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// The two built-in project names, always set together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNames {
    pub snake: String,
    pub pretty: String,
}

impl ProjectNames {
    pub fn new(snake: impl Into<String>, pretty: impl Into<String>) -> Self {
        Self {
            snake: snake.into(),
            pretty: pretty.into(),
        }
    }

    /// Both names from a directory name; `pretty` follows from `snake`
    pub fn from_dir_name(raw: &str) -> Result<Self> {
        let snake = normalize_to_snake(raw)?;
        let pretty = snake_to_pretty(&snake);
        Ok(Self { snake, pretty })
    }
}

impl fmt::Display for ProjectNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.snake, self.pretty)
    }
}
