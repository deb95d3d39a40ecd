use once_cell::sync::Lazy;
use std::env;

pub static PROC_ENV: Lazy<ProcEnv> = Lazy::new(ProcEnv::new);

/// Process wide switches read once from environment variables
#[derive(Debug)]
pub struct ProcEnv {
    pub(crate) no_color_print: bool,
    pub(crate) force_debug: bool,
}

impl ProcEnv {
    pub fn new() -> Self {
        Self {
            no_color_print: set_env_safely("FSV_NO_COLOR"),
            force_debug: set_env_safely("FSV_DEBUG"),
        }
    }
}

/// Check if given text reads as a truthy value
pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Get env value as boolean with failing
fn set_env_safely(name: &str) -> bool {
    env::var(name)
        .ok()
        .map(|s| is_truthy(&s))
        .unwrap_or(false)
}
