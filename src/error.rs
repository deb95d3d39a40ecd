use thiserror::Error;

/// Fsv's error type
///
/// Text transforms never fail. Errors only come from the edges: settings
/// persistence, chat files and command line options.
#[derive(Error, Debug)]
pub enum FsvError {
    #[error("Invalid conversion \n= {0}")]
    InvalidConversion(String),
    #[error("Invalid command option\n= {0}")]
    InvalidCommandOption(String),
    #[error("Invalid macro name\n= {0}")]
    InvalidMacroName(String),
    #[error("Failed regex operation\n= {0}")]
    InvalidRegex(regex::Error),
    #[error("File,\"{0}\", does not exist")]
    InvalidFile(String),
    #[error("Invalid chat record at line {0}\n= {1}")]
    InvalidChat(usize, String),
    #[error("Invalid settings\n= {0}")]
    InvalidSettings(String),
    #[error("Standard IO error\n= {0}")]
    StdIo(std::io::Error),
    #[error("Failed json operation\n= {0}")]
    Json(serde_json::Error),
}

// ==========
// Start of Convert variations
// <CONVERT>
impl From<regex::Error> for FsvError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidRegex(err)
    }
}

impl From<std::io::Error> for FsvError {
    fn from(err: std::io::Error) -> Self {
        Self::StdIo(err)
    }
}

impl From<serde_json::Error> for FsvError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
// End of convert variations
// </CONVERT>
// ----------
