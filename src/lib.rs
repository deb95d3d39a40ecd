//! # fix_setvar
//!
//! Text filter that keeps pipes inside `{{setvar::name|value}}` style calls from being split
//! into extra arguments by a macro engine.
//!
//! Two transforms do the work. [Escaper] neutralizes structural pipes of write family calls
//! before expansion and [Restorer] turns them back into literal pipes afterwards.
//! [PipeFixer] wires both into a host, either as pipeline hooks or as an in place scan of
//! stored chat messages.

mod common;
mod error;
mod escaper;
mod fixer;
mod hook;
mod logger;
mod matcher;
mod restorer;
mod scan;
mod settings;

pub(crate) mod consts;
pub(crate) mod env;

pub use common::{Encoding, FixStats, FsvResult};
pub use consts::{MODULE_NAME, PIPE_MARKER, READ_MACROS, WRITE_MACROS};
pub use error::FsvError;
pub use escaper::Escaper;
pub use fixer::{DeployMode, PipeFixer};
pub use hook::{
    HookConfig, HookHandle, HookInstaller, MacroEnv, MacroPipeline, SharedPipeline, TransformFn,
};
pub use logger::{Logger, WriteOption};
pub use matcher::{MacroCall, MacroMatcher};
pub use restorer::{unescape_args, Restorer};
pub use scan::{
    ChatMessage, ContextAccessor, EventBus, EventHandler, EventScanner, HostContext,
    LifecycleEvent, ScanReport, ScanSubscriber, SharedBus, SharedContext,
};
pub use settings::{load_settings, JsonFileStore, MemoryStore, Settings, SettingsStore};

// Binary option
#[cfg(feature = "clap")]
mod cli;
#[cfg(feature = "clap")]
pub use cli::FsvCli;
