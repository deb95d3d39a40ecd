//! # Restorer
//!
//! Turns neutralized pipes back into literal ones after macro expansion.

use crate::common::{Encoding, FixStats};
use crate::consts::{ESCAPE_CHAR_U8, PIPE_CHAR_U8, PIPE_MARKER, PIPE_STR};
use crate::logger::Logger;
use crate::matcher::{MacroMatcher, READ_MATCHERS};
use crate::settings::Settings;
use std::borrow::Cow;

/// Post transform applied after macro expansion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Restorer {
    encoding: Encoding,
}

impl Restorer {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Restore literal pipes
    ///
    /// Returns borrowed text when disabled or when there was nothing to restore.
    pub fn restore<'a>(&self, text: &'a str, settings: &Settings, logger: &Logger) -> Cow<'a, str> {
        self.restore_with_stats(text, settings, logger).0
    }

    pub fn restore_with_stats<'a>(
        &self,
        text: &'a str,
        settings: &Settings,
        logger: &Logger,
    ) -> (Cow<'a, str>, FixStats) {
        if !settings.enabled {
            return (Cow::Borrowed(text), FixStats::default());
        }
        match self.encoding {
            Encoding::Marker => restore_markers(text, logger),
            Encoding::Backslash => restore_scoped(text, logger),
        }
    }
}

/// Replace every marker in the whole text
fn restore_markers<'a>(text: &'a str, logger: &Logger) -> (Cow<'a, str>, FixStats) {
    if !text.contains(PIPE_MARKER) {
        return (Cow::Borrowed(text), FixStats::default());
    }
    let pipes = text.matches(PIPE_MARKER).count();
    logger.dlog(&format!("[PostProcessor] Restored {} pipe(s)", pipes));
    (
        Cow::Owned(text.replace(PIPE_MARKER, PIPE_STR)),
        FixStats { calls: 0, pipes },
    )
}

/// Undo backslash escapes inside read family calls only
fn restore_scoped<'a>(text: &'a str, logger: &Logger) -> (Cow<'a, str>, FixStats) {
    let mut stats = FixStats::default();
    let mut result = Cow::Borrowed(text);
    for matcher in READ_MATCHERS.iter() {
        if let Some(restored) = restore_calls(&result, matcher, &mut stats) {
            result = Cow::Owned(restored);
        }
    }
    if stats.pipes > 0 {
        logger.dlog(&format!(
            "[PostProcessor] Restored {} pipe(s) in {} macro(s)",
            stats.pipes, stats.calls
        ));
    }
    (result, stats)
}

fn restore_calls(text: &str, matcher: &MacroMatcher, stats: &mut FixStats) -> Option<String> {
    let mut restored: Option<String> = None;
    let mut last = 0;
    for call in matcher.find_calls(text) {
        let Some((args, pipes)) = unescape_args(call.args) else {
            continue;
        };
        let out = restored.get_or_insert_with(|| String::with_capacity(text.len()));
        out.push_str(&text[last..call.args_start]);
        out.push_str(&args);
        last = call.args_end;
        stats.calls += 1;
        stats.pipes += pipes;
    }
    let mut out = restored?;
    out.push_str(&text[last..]);
    Some(out)
}

/// Drop one backslash before every escaped pipe
///
/// Exact inverse of backslash escaping: a pipe preceded by an odd backslash run loses one
/// backslash. Returns none if no pipe was escaped.
pub fn unescape_args(args: &str) -> Option<(String, usize)> {
    let mut out: Option<String> = None;
    let mut last = 0;
    let mut backslashes = 0usize;
    let mut pipes = 0usize;

    for (idx, &ch) in args.as_bytes().iter().enumerate() {
        if ch == ESCAPE_CHAR_U8 {
            backslashes += 1;
            continue;
        }
        if ch == PIPE_CHAR_U8 && backslashes % 2 == 1 {
            let buf = out.get_or_insert_with(|| String::with_capacity(args.len()));
            // idx - 1 is the closest backslash
            buf.push_str(&args[last..idx - 1]);
            last = idx;
            pipes += 1;
        }
        backslashes = 0;
    }

    let mut out = out?;
    out.push_str(&args[last..]);
    Some((out, pipes))
}
