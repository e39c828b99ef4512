//! Variable interpolation for rendered metadata.
//!
//! Directives take the form `$( variable "KEY" )`. The `$( )` delimiters are
//! kept apart from the `(( ))` expressions that Ops Manager evaluates later,
//! so those pass through untouched.
//!
//! The whole text is parsed before anything is substituted: malformed
//! directives surface as [`InterpolationError::Parse`] and unknown keys as
//! [`InterpolationError::MissingVariable`].

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::{InterpolationError, InterpolationResult};

const OPEN: &str = "$(";

/// A parsed piece of the input text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Variable(String),
}

/// Substitutes `$( variable "KEY" )` directives.
pub struct Interpolator {
    variable_pattern: Regex,
    function_pattern: Regex,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpolator {
    pub fn new() -> Self {
        Self {
            // variable "key", with \" and \\ escapes inside the key
            variable_pattern: Regex::new(r#"^\s*variable\s+"((?:[^"\\]|\\.)*)"\s*$"#).unwrap(),
            function_pattern: Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap(),
        }
    }

    /// Replace every directive in `text` with its value from `variables`.
    pub fn interpolate(
        &self,
        text: &str,
        variables: &HashMap<String, String>,
    ) -> InterpolationResult<String> {
        let segments = self.parse(text)?;
        debug!("Interpolating {} template segments", segments.len());

        let mut output = String::with_capacity(text.len());
        for segment in segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Variable(key) => match variables.get(&key) {
                    Some(value) => output.push_str(value),
                    None => return Err(InterpolationError::MissingVariable(key)),
                },
            }
        }

        Ok(output)
    }

    fn parse<'a>(&self, text: &'a str) -> InterpolationResult<Vec<Segment<'a>>> {
        let mut segments = Vec::new();
        let mut position = 0;

        while let Some(found) = text[position..].find(OPEN) {
            let start = position + found;
            if start > position {
                segments.push(Segment::Text(&text[position..start]));
            }

            let body_start = start + OPEN.len();
            let Some(length) = action_length(&text[body_start..]) else {
                return Err(InterpolationError::Parse(format!(
                    "line {}: unclosed action",
                    line_of(text, start)
                )));
            };

            let action = &text[body_start..body_start + length];
            segments.push(self.parse_action(action, line_of(text, start))?);
            position = body_start + length + 1;
        }

        if position < text.len() {
            segments.push(Segment::Text(&text[position..]));
        }

        Ok(segments)
    }

    fn parse_action(&self, action: &str, line: usize) -> InterpolationResult<Segment<'static>> {
        if let Some(caps) = self.variable_pattern.captures(action) {
            return Ok(Segment::Variable(unescape(&caps[1])));
        }

        match self.function_pattern.captures(action) {
            Some(caps) if &caps[1] != "variable" => Err(InterpolationError::Parse(format!(
                "line {}: function {:?} not defined",
                line, &caps[1]
            ))),
            _ => Err(InterpolationError::Parse(format!(
                "line {}: malformed action {:?}",
                line,
                format!("{}{})", OPEN, action)
            ))),
        }
    }
}

/// Interpolate with a default [`Interpolator`].
pub fn interpolate(text: &str, variables: &HashMap<String, String>) -> InterpolationResult<String> {
    Interpolator::new().interpolate(text, variables)
}

/// Length of the action body up to its closing `)`, skipping quoted strings.
fn action_length(body: &str) -> Option<usize> {
    let mut in_quote = false;
    let mut escaped = false;

    for (index, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quote => escaped = true,
            '"' => in_quote = !in_quote,
            ')' if !in_quote => return Some(index),
            _ => {}
        }
    }

    None
}

fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
