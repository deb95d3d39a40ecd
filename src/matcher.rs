//! # Matcher
//!
//! Locates `{{name::args}}` calls for a single macro name.

use crate::common::FsvResult;
use crate::consts::{READ_MACROS, WRITE_MACROS};
use crate::error::FsvError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matchers for the write family, applied in registry order
pub(crate) static WRITE_MATCHERS: Lazy<Vec<MacroMatcher>> = Lazy::new(|| {
    WRITE_MACROS
        .iter()
        .map(|name| MacroMatcher::new(name).expect("Failed to create write macro regex"))
        .collect()
});

/// Matchers for the read family
pub(crate) static READ_MATCHERS: Lazy<Vec<MacroMatcher>> = Lazy::new(|| {
    READ_MACROS
        .iter()
        .map(|name| MacroMatcher::new(name).expect("Failed to create read macro regex"))
        .collect()
});

/// A single macro invocation found inside text
///
/// Offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroCall<'a> {
    pub start: usize,
    pub end: usize,
    /// Macro name as written, case untouched
    pub name: &'a str,
    pub args: &'a str,
    pub args_start: usize,
    pub args_end: usize,
}

impl<'a> MacroCall<'a> {
    /// Whole call text including braces
    pub fn whole<'b>(&self, text: &'b str) -> &'b str {
        &text[self.start..self.end]
    }
}

/// Case insensitive matcher for one macro name
#[derive(Debug, Clone)]
pub struct MacroMatcher {
    name: String,
    regex: Regex,
}

impl MacroMatcher {
    /// Create a new matcher
    ///
    /// The name is escaped before it is embedded, so any text is accepted as long as it is not
    /// empty.
    pub fn new(name: &str) -> FsvResult<Self> {
        if name.is_empty() {
            return Err(FsvError::InvalidMacroName(
                "Macro name cannot be empty".to_string(),
            ));
        }
        // A body is any run without "}}". A lone '}' must be followed by something other than
        // '}', which is the look-ahead free form of `(?:[^}]|}(?!}))*`.
        let pattern = format!(
            r"\{{\{{({})::((?:[^}}]|\}}[^}}])*)\}}\}}",
            fold_ascii_case(name)
        );
        Ok(Self {
            name: name.to_lowercase(),
            regex: Regex::new(&pattern)?,
        })
    }

    /// Lowercase macro name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate non overlapping calls from left to right
    pub fn find_calls<'a>(&'a self, text: &'a str) -> impl Iterator<Item = MacroCall<'a>> + 'a {
        self.regex.captures_iter(text).filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            let args = caps.get(2)?;
            Some(MacroCall {
                start: whole.start(),
                end: whole.end(),
                name: name.as_str(),
                args: args.as_str(),
                args_start: args.start(),
                args_end: args.end(),
            })
        })
    }

    /// Check if text contains at least one call
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Escape name and let only ascii letters match either case
///
/// Unicode case folding would make "ſetvar" a setvar call.
fn fold_ascii_case(name: &str) -> String {
    let mut buf = [0u8; 4];
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphabetic() {
                format!("[{}{}]", ch.to_ascii_lowercase(), ch.to_ascii_uppercase())
            } else {
                regex::escape(ch.encode_utf8(&mut buf))
            }
        })
        .collect()
}
