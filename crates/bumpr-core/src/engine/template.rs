//! Printf-style version templates for the generic engine.
//!
//! A template is literal text with exactly three `%d` placeholders for
//! major, minor and patch (`%%` is a literal percent sign). Matching
//! follows scanf rules: the input is trimmed, matching is anchored at the
//! start, trailing input is ignored, whitespace in the template matches
//! any run of blanks, and each number may be preceded by blanks.

use std::fmt::Write as _;

use regex::Regex;
use semver::Version;

use super::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Number,
}

/// A compiled version template.
#[derive(Debug, Clone)]
pub struct VersionTemplate {
    raw: String,
    segments: Vec<Segment>,
    pattern: Regex,
}

impl VersionTemplate {
    /// Compile `raw`, failing unless it has exactly three `%d` verbs.
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidTemplate(raw.to_string());

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match chars.next() {
                Some('%') => literal.push('%'),
                Some('d') => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Number);
                }
                _ => return Err(invalid()),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let placeholders = segments.iter().filter(|s| **s == Segment::Number).count();
        if placeholders != 3 {
            return Err(invalid());
        }

        let mut pattern = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Number => pattern.push_str(r"[ \t]*(\d+)"),
                Segment::Literal(text) => push_literal(&mut pattern, text),
            }
        }
        let pattern = Regex::new(&pattern).map_err(|_| invalid())?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
            pattern,
        })
    }

    /// The template as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Scan a version out of `text`, or `None` if it does not match.
    pub fn extract(&self, text: &str) -> Option<Version> {
        let caps = self.pattern.captures(text.trim())?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = caps.get(3)?.as_str().parse().ok()?;
        Some(Version::new(major, minor, patch))
    }

    /// Substitute major, minor and patch into the placeholders.
    pub fn render(&self, version: &Version) -> String {
        let mut numbers = [version.major, version.minor, version.patch].into_iter();
        let mut out = String::with_capacity(self.raw.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Number => {
                    if let Some(n) = numbers.next() {
                        let _ = write!(out, "{n}");
                    }
                }
            }
        }
        out
    }
}

/// Append `text` to a regex, letting blank runs match any blank run.
fn push_literal(pattern: &mut String, text: &str) {
    let mut pending = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' => {
                while chars.next_if(|c| matches!(c, ' ' | '\t')).is_some() {}
                pattern.push_str(&regex::escape(&std::mem::take(&mut pending)));
                pattern.push_str(r"[ \t]*");
            }
            '\n' => {
                pattern.push_str(&regex::escape(&std::mem::take(&mut pending)));
                pattern.push_str(r"[ \t]*\r?\n");
            }
            _ => pending.push(c),
        }
    }
    pattern.push_str(&regex::escape(&pending));
}
