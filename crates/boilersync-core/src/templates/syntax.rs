//! Token grammar shared by the scanner and the substitutor
//!
//! Templates use `$${name}` for substitution so they can carry `${...}` and
//! `{{ ... }}` syntax of their own (shell, build tools, other template engines)
//! without escaping. `$${# ... #}` is a comment and is dropped from output.
//! Block tags (`$${% ... %}`) are not supported: text containing one does not
//! parse, and is therefore neither scanned nor substituted.

use crate::context::InterpolationContext;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Opens a variable tag
pub const TAG_OPEN: &str = "$${";
/// Closes a variable tag
pub const TAG_CLOSE: &str = "}";

const COMMENT_OPEN: &str = "$${#";
const COMMENT_CLOSE: &str = "#}";
const BLOCK_OPEN: &str = "$${%";

/// One piece of parsed template text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Variable(&'a str),
}

/// Why a piece of text is not a well-formed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    Unterminated,
    UnsupportedBlock,
    InvalidExpression(String),
}

/// Parse failure with the byte offset of the offending tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::Unterminated => write!(f, "unterminated tag at byte {}", self.offset),
            ParseErrorKind::UnsupportedBlock => {
                write!(f, "unsupported block tag at byte {}", self.offset)
            }
            ParseErrorKind::InvalidExpression(expr) => write!(
                f,
                "tag at byte {} is not a plain identifier: '{}'",
                self.offset, expr
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parsed template text, borrowing from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'a> {
    segments: Vec<Segment<'a>>,
}

/// Result of substituting a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Tokens that had no value and were left verbatim
    pub unresolved: BTreeSet<String>,
}

impl<'a> Template<'a> {
    pub fn parse(text: &'a str) -> Result<Self, ParseError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find(TAG_OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(&rest[..start]));
            }

            let tag = &rest[start..];
            let tag_offset = offset + start;
            let error = |kind| ParseError {
                offset: tag_offset,
                kind,
            };

            let consumed = if tag.starts_with(COMMENT_OPEN) {
                let body = &tag[COMMENT_OPEN.len()..];
                let end = body
                    .find(COMMENT_CLOSE)
                    .ok_or_else(|| error(ParseErrorKind::Unterminated))?;
                COMMENT_OPEN.len() + end + COMMENT_CLOSE.len()
            } else if tag.starts_with(BLOCK_OPEN) {
                return Err(error(ParseErrorKind::UnsupportedBlock));
            } else {
                let body = &tag[TAG_OPEN.len()..];
                let end = body
                    .find(TAG_CLOSE)
                    .ok_or_else(|| error(ParseErrorKind::Unterminated))?;
                let expr = body[..end].trim();
                if !is_identifier(expr) {
                    return Err(error(ParseErrorKind::InvalidExpression(expr.to_string())));
                }
                segments.push(Segment::Variable(expr));
                TAG_OPEN.len() + end + TAG_CLOSE.len()
            };

            rest = &tag[consumed..];
            offset = tag_offset + consumed;
        }

        if !rest.is_empty() {
            segments.push(Segment::Literal(rest));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Identifiers referenced by variable tags
    pub fn tokens(&self) -> BTreeSet<&'a str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Variable(name) => Some(*name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute resolved values; values are inserted literally, never re-expanded
    pub fn render(&self, ctx: &InterpolationContext) -> Rendered {
        let mut text = String::new();
        let mut unresolved = BTreeSet::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Variable(name) => match ctx.resolve(name).as_text() {
                    Some(value) => text.push_str(&value),
                    None => {
                        text.push_str(TAG_OPEN);
                        text.push_str(name);
                        text.push_str(TAG_CLOSE);
                        unresolved.insert(name.to_string());
                    }
                },
            }
        }

        Rendered { text, unresolved }
    }
}

/// Substitute tokens in `text`; text that does not parse is returned unchanged
pub fn interpolate<'t>(text: &'t str, ctx: &InterpolationContext) -> Cow<'t, str> {
    match Template::parse(text) {
        Ok(template) => {
            let rendered = template.render(ctx);
            if !rendered.unresolved.is_empty() {
                warn!(tokens = ?rendered.unresolved, "leaving unresolved tokens in place");
            }
            Cow::Owned(rendered.text)
        }
        Err(_) => Cow::Borrowed(text),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
