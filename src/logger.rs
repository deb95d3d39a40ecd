//! # Logger
//!
//! Logger handles all kinds of logging logics. Such log can be debug, info, warning or error
//! logs. Every line carries a "FSM:*" prompt so that host consoles can filter on it.

use crate::consts::*;
use crate::env::PROC_ENV;
#[cfg(feature = "color")]
use colored::*;
use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::io::Write as _;

/// Destination of log lines
///
/// - File       : Append to a file
/// - Variable   : Capture inside logger, read back with [Logger::captured]
/// - Terminal   : Print to stderr
/// - Discard    : Do nothing
#[derive(Debug)]
pub enum WriteOption {
    File(std::fs::File),
    Variable(String),
    Terminal,
    Discard,
}

type ColorDisplayFunc = fn(string: &str, to_file: bool) -> Box<dyn std::fmt::Display>;

/// Logger that controls logging
///
/// Logger is shared between an orchestrator and the transforms it installs, thus every method
/// takes a shared reference. Write failures are swallowed.
#[derive(Debug)]
pub struct Logger {
    debug: Cell<bool>,
    write_option: RefCell<WriteOption>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    /// Create a logger that prints to terminal
    pub fn new() -> Self {
        Self::with_write_option(WriteOption::Terminal)
    }

    pub fn with_write_option(write_option: WriteOption) -> Self {
        Self {
            debug: Cell::new(false),
            write_option: RefCell::new(write_option),
        }
    }

    /// Logger that captures every line
    #[cfg(test)]
    pub(crate) fn capture() -> Self {
        Self::with_write_option(WriteOption::Variable(String::new()))
    }

    pub fn set_write_option(&self, write_option: WriteOption) {
        self.write_option.replace(write_option);
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.set(debug);
    }

    /// Whether debug lines are emitted
    pub fn is_debug(&self) -> bool {
        self.debug.get() || PROC_ENV.force_debug
    }

    /// Get captured text
    ///
    /// Empty if logger doesn't write into a variable
    pub fn captured(&self) -> String {
        match &*self.write_option.borrow() {
            WriteOption::Variable(var) => var.clone(),
            _ => String::new(),
        }
    }

    fn is_logging_to_file(&self) -> bool {
        matches!(&*self.write_option.borrow(), WriteOption::File(_))
    }

    fn write_formatted_log_msg(&self, prompt: &str, log_msg: &str, color_func: ColorDisplayFunc) {
        let to_file = self.is_logging_to_file();
        let mut option = self.write_option.borrow_mut();
        match &mut *option {
            WriteOption::File(file) => {
                let _ = write!(file, "{} {}{}", prompt, log_msg, LINE_ENDING);
            }
            WriteOption::Terminal => {
                let _ = write!(
                    std::io::stderr(),
                    "{} {}{}",
                    color_func(prompt, to_file),
                    log_msg,
                    LINE_ENDING
                );
            }
            WriteOption::Variable(var) => {
                let _ = write!(var, "{} {}{}", prompt, log_msg, LINE_ENDING);
            }
            WriteOption::Discard => (),
        }
    }

    /// Log debug message, only when debug is enabled
    pub fn dlog(&self, log_msg: &str) {
        if self.is_debug() {
            self.write_formatted_log_msg(DEBUG_PREFIX, log_msg, blue);
        }
    }

    /// Log informative message
    pub fn log(&self, log_msg: &str) {
        self.write_formatted_log_msg(INFO_PREFIX, log_msg, green);
    }

    /// Log warning
    pub fn wlog(&self, log_msg: &str) {
        self.write_formatted_log_msg(WARN_PREFIX, log_msg, yellow);
    }

    /// Log error
    pub fn elog(&self, log_msg: &str) {
        self.write_formatted_log_msg(ERROR_PREFIX, log_msg, red);
    }

    /// Print a block of debug lines framed by rules
    pub fn debug_banner(&self, lines: &[String]) {
        if !self.is_debug() {
            return;
        }
        self.dlog(BANNER_RULE);
        for line in lines {
            self.dlog(line);
        }
        self.dlog(BANNER_RULE);
    }
}

// ----------
// Color helpers

#[cfg(feature = "color")]
fn can_color(to_file: bool) -> bool {
    !to_file && !PROC_ENV.no_color_print && atty::is(atty::Stream::Stderr)
}

/// Print text as green if possible
#[allow(unused_variables)]
fn green(string: &str, to_file: bool) -> Box<dyn std::fmt::Display> {
    #[cfg(feature = "color")]
    if can_color(to_file) {
        return Box::new(string.green());
    }
    Box::new(string.to_owned())
}

/// Print text as red if possible
#[allow(unused_variables)]
fn red(string: &str, to_file: bool) -> Box<dyn std::fmt::Display> {
    #[cfg(feature = "color")]
    if can_color(to_file) {
        return Box::new(string.red());
    }
    Box::new(string.to_owned())
}

/// Print text as yellow if possible
#[allow(unused_variables)]
fn yellow(string: &str, to_file: bool) -> Box<dyn std::fmt::Display> {
    #[cfg(feature = "color")]
    if can_color(to_file) {
        return Box::new(string.yellow());
    }
    Box::new(string.to_owned())
}

/// Print text as blue if possible
#[allow(unused_variables)]
fn blue(string: &str, to_file: bool) -> Box<dyn std::fmt::Display> {
    #[cfg(feature = "color")]
    if can_color(to_file) {
        return Box::new(string.blue());
    }
    Box::new(string.to_owned())
}
