// Platform agonistic consts
pub const MODULE_NAME: &str = "third-party/SillyTavern-Fix-Setvar-Macro";
pub const ESCAPE_CHAR_U8: u8 = b'\\';
pub const PIPE_CHAR_U8: u8 = b'|';
pub const PIPE_STR: &str = "|";
pub const ESCAPED_PIPE: &str = "\\|";

/// Private use placeholder standing in for a literal pipe
///
/// Both delimiters are private use code points so user input and other macros never produce it.
pub const PIPE_MARKER: &str = "\u{E000}FSM:PIPE\u{E001}";

// Macro registries
pub const WRITE_MACROS: [&str; 4] = ["setvar", "setglobalvar", "addvar", "addglobalvar"];
pub const READ_MACROS: [&str; 2] = ["getvar", "getglobalvar"];

// Hook priorities. Lower runs earlier.
pub const PRE_PROCESSOR_PRIORITY: i32 = 0;
pub const POST_PROCESSOR_PRIORITY: i32 = 1000;

// Log prompts
pub const DEBUG_PREFIX: &str = "🔍 FSM:DEBUG";
pub const INFO_PREFIX: &str = "✓ FSM:INFO";
pub const WARN_PREFIX: &str = "⚠ FSM:WARN";
pub const ERROR_PREFIX: &str = "✗ FSM:ERROR";
pub const BANNER_RULE: &str = "========================================";

// Platform specific consts

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";
