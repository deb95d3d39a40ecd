//! # Escaper
//!
//! Neutralizes structural pipes inside write family macro calls so the macro engine doesn't
//! split a variable value into several arguments.

use crate::common::{Encoding, FixStats};
use crate::consts::{ESCAPE_CHAR_U8, PIPE_CHAR_U8};
use crate::logger::Logger;
use crate::matcher::{MacroMatcher, WRITE_MATCHERS};
use crate::settings::Settings;
use std::borrow::Cow;
use std::time::Instant;

/// Pre transform applied before macro expansion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Escaper {
    encoding: Encoding,
}

impl Escaper {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Escape every write family call inside text
    ///
    /// Returns borrowed text when disabled or when nothing needed a fix.
    pub fn escape<'a>(&self, text: &'a str, settings: &Settings, logger: &Logger) -> Cow<'a, str> {
        self.escape_with_stats(text, settings, logger).0
    }

    /// Same as escape but also returns counts
    pub fn escape_with_stats<'a>(
        &self,
        text: &'a str,
        settings: &Settings,
        logger: &Logger,
    ) -> (Cow<'a, str>, FixStats) {
        let mut stats = FixStats::default();
        if !settings.enabled {
            return (Cow::Borrowed(text), stats);
        }

        let started = Instant::now();
        let mut result = Cow::Borrowed(text);

        // Each name scans the output of the previous one
        for matcher in WRITE_MATCHERS.iter() {
            if let Some(fixed) = self.escape_calls(&result, matcher, logger, &mut stats) {
                result = Cow::Owned(fixed);
            }
        }

        if stats.calls > 0 {
            logger.dlog(&format!(
                "[PreProcessor] Fixed {} macro(s) in {:.2}ms",
                stats.calls,
                started.elapsed().as_secs_f64() * 1000.0
            ));
        }

        (result, stats)
    }

    /// Rewrite calls of a single macro
    ///
    /// Only argument spans are replaced, so braces and the macro name keep their original text.
    fn escape_calls(
        &self,
        text: &str,
        matcher: &MacroMatcher,
        logger: &Logger,
        stats: &mut FixStats,
    ) -> Option<String> {
        if !matcher.is_match(text) {
            return None;
        }
        let mut fixed: Option<String> = None;
        let mut last = 0;

        for call in matcher.find_calls(text) {
            let Some((args, pipes)) = self.escape_args(call.args) else {
                continue;
            };
            let out = fixed.get_or_insert_with(|| String::with_capacity(text.len() + args.len()));
            out.push_str(&text[last..call.args_start]);
            out.push_str(&args);
            last = call.args_end;

            stats.calls += 1;
            stats.pipes += pipes;

            if logger.is_debug() {
                logger.dlog(&format!(
                    "[PreProcessor] Fixed {} at position {}",
                    call.name, call.start
                ));
                logger.dlog(&format!("  Original: {}", call.whole(text)));
                logger.dlog(&format!(
                    "  Fixed:    {}{}{}",
                    &text[call.start..call.args_start],
                    args,
                    &text[call.args_end..call.end]
                ));
                logger.dlog(&format!("  Pipes escaped: {}", pipes));
            }
        }

        let mut out = fixed?;
        out.push_str(&text[last..]);
        Some(out)
    }

    /// Escape structural pipes inside a raw argument string
    ///
    /// A pipe is structural when the run of backslashes right before it has an even length,
    /// zero included. Returns none if there was nothing to escape, otherwise the escaped
    /// arguments with the count of escaped pipes.
    pub fn escape_args(&self, args: &str) -> Option<(String, usize)> {
        let token = self.encoding.pipe_token();
        let mut out: Option<String> = None;
        let mut last = 0;
        let mut backslashes = 0usize;
        let mut pipes = 0usize;

        // Both delimiters are ASCII which never appear inside a multibyte sequence
        for (idx, &ch) in args.as_bytes().iter().enumerate() {
            if ch == ESCAPE_CHAR_U8 {
                backslashes += 1;
                continue;
            }
            if ch == PIPE_CHAR_U8 && backslashes % 2 == 0 {
                let buf = out.get_or_insert_with(|| String::with_capacity(args.len() + token.len()));
                buf.push_str(&args[last..idx]);
                buf.push_str(token);
                last = idx + 1;
                pipes += 1;
            }
            backslashes = 0;
        }

        let mut out = out?;
        out.push_str(&args[last..]);
        Some((out, pipes))
    }
}
