use crate::consts::{ESCAPED_PIPE, PIPE_MARKER};
use crate::error::FsvError;

/// Genenric result type for every fsv operations
///
/// FsvResult is a genric result type of T and error of [FsvError](FsvError)
pub type FsvResult<T> = Result<T, FsvError>;

/// How a structural pipe is neutralized
///
/// - Backslash : Prepend a backslash, "a|b" becomes "a\|b"
/// - Marker    : Substitute a private use marker which is swapped back after expansion
///
/// Only one encoding is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    Backslash,
    #[default]
    Marker,
}

impl Encoding {
    /// Text that replaces a structural pipe
    pub(crate) fn pipe_token(&self) -> &'static str {
        match self {
            Self::Backslash => ESCAPED_PIPE,
            Self::Marker => PIPE_MARKER,
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = FsvError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "backslash" | "a" => Self::Backslash,
            "marker" | "b" => Self::Marker,
            _ => {
                return Err(FsvError::InvalidConversion(format!(
                    "Invalid encoding \"{}\"",
                    s
                )))
            }
        })
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backslash => write!(f, "backslash"),
            Self::Marker => write!(f, "marker"),
        }
    }
}

/// Counts gathered during a single transform pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FixStats {
    /// Macro calls that were rewritten
    pub calls: usize,
    /// Pipes escaped or restored
    pub pipes: usize,
}
