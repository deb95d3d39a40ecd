//! # Fixer
//!
//! Orchestrator which owns settings and logger, and drives exactly one deployment mode.
//!
//! ```
//! use fix_setvar::{Encoding, MemoryStore, PipeFixer, WriteOption};
//!
//! let mut fixer = PipeFixer::new()
//!     .encoding(Encoding::Backslash)
//!     .settings_store(MemoryStore::default())
//!     .write_option(WriteOption::Discard);
//! fixer.startup();
//!
//! assert_eq!(fixer.escape("{{setvar::a|b}}"), "{{setvar::a\\|b}}");
//! ```

use crate::common::Encoding;
use crate::consts::{DEBUG_PREFIX, WRITE_MACROS};
use crate::escaper::Escaper;
use crate::hook::{HookInstaller, SharedPipeline};
use crate::logger::{Logger, WriteOption};
use crate::restorer::Restorer;
use crate::scan::{
    ChatMessage, ContextAccessor, LifecycleEvent, ScanReport, ScanSubscriber, SharedBus,
};
use crate::settings::{load_settings, MemoryStore, Settings, SettingsStore};
use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;

/// Deployment mode, only one is active at a time
pub enum DeployMode {
    /// Transforms are installed into a macro pipeline
    Hook(HookInstaller),
    /// Stored messages are fixed on lifecycle events
    EventScan(ScanSubscriber),
}

/// Pipe fixer
///
/// Builder style construction mirrors how hosts configure it once at startup. Settings are
/// shared by handle with installed transforms and only changed through
/// [set_enabled](PipeFixer::set_enabled) and [set_debug](PipeFixer::set_debug).
pub struct PipeFixer {
    settings: Rc<Cell<Settings>>,
    logger: Rc<Logger>,
    store: Box<dyn SettingsStore>,
    encoding: Encoding,
    mode: DeployMode,
}

impl Default for PipeFixer {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeFixer {
    /// Create a new instance
    ///
    /// Defaults to hook mode without a pipeline, marker encoding, in memory store and
    /// terminal logging.
    pub fn new() -> Self {
        let encoding = Encoding::default();
        Self {
            settings: Rc::new(Cell::new(Settings::default())),
            logger: Rc::new(Logger::new()),
            store: Box::new(MemoryStore::default()),
            encoding,
            mode: DeployMode::Hook(HookInstaller::new(None, encoding)),
        }
    }

    // ----------
    // Builder methods

    /// Set encoding used by hook mode
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        if let DeployMode::Hook(installer) = &mut self.mode {
            installer.set_encoding(encoding);
        }
        self
    }

    /// Set where settings are persisted
    pub fn settings_store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Set log destination
    pub fn write_option(self, write_option: WriteOption) -> Self {
        self.logger.set_write_option(write_option);
        self
    }

    /// Use hook mode with given pipeline
    pub fn hook_mode(mut self, pipeline: Option<SharedPipeline>) -> Self {
        self.mode = DeployMode::Hook(HookInstaller::new(pipeline, self.encoding));
        self
    }

    /// Use event scan mode
    pub fn event_scan_mode(mut self, bus: Option<SharedBus>, accessor: ContextAccessor) -> Self {
        self.mode = DeployMode::EventScan(ScanSubscriber::new(bus, accessor));
        self
    }

    // ----------
    // Lifecycle

    /// Load settings and install into host when enabled
    pub fn startup(&mut self) {
        self.logger.log("Extension loading...");
        self.load_settings();

        if self.settings().enabled {
            self.install();
        }

        match self.mode {
            DeployMode::Hook(_) => self
                .logger
                .log("Extension ready! Using MacroEngine PreProcessor hook."),
            DeployMode::EventScan(_) => self.logger.log("Extension ready! Using chat event scan."),
        }

        self.logger.debug_banner(&[
            "Debug mode is active".to_string(),
            format!("Filter console with: \"{}\"", filter_hint()),
        ]);
    }

    /// Load settings from store, merged onto defaults
    pub fn load_settings(&mut self) {
        let settings = load_settings(self.store.as_ref(), &self.logger);
        self.apply(settings);
        self.logger.dlog(&format!("[Settings] Loaded: {:?}", settings));
    }

    /// Handle change of enabled flag
    pub fn set_enabled(&mut self, enabled: bool) {
        let mut settings = self.settings();
        settings.enabled = enabled;
        self.apply(settings);
        self.persist();

        if enabled {
            self.install();
            self.logger.log("Extension enabled");
        } else {
            self.uninstall();
            self.logger.log("Extension disabled");
        }
    }

    /// Handle change of debug flag
    pub fn set_debug(&mut self, debug: bool) {
        let mut settings = self.settings();
        settings.debug = debug;
        self.apply(settings);
        self.persist();

        self.logger.log(&format!(
            "Debug mode {}",
            if debug { "enabled" } else { "disabled" }
        ));
        self.logger.debug_banner(&[
            "Debug mode activated!".to_string(),
            format!("Filter console with: \"{}\"", filter_hint()),
            format!("Current settings: {:?}", settings),
            format!("Supported macros: {:?}", WRITE_MACROS),
        ]);
    }

    fn apply(&self, settings: Settings) {
        self.settings.set(settings);
        self.logger.set_debug(settings.debug);
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.settings.get()) {
            self.logger
                .wlog(&format!("[Settings] Failed to save settings: {}", err));
        }
    }

    fn install(&mut self) {
        match &mut self.mode {
            DeployMode::Hook(installer) => installer.register(&self.settings, &self.logger),
            DeployMode::EventScan(subscriber) => subscriber.attach(&self.settings, &self.logger),
        }
    }

    fn uninstall(&mut self) {
        match &mut self.mode {
            DeployMode::Hook(installer) => installer.unregister(&self.logger),
            // Subscriptions stay, handlers check the flag on every event
            DeployMode::EventScan(_) => (),
        }
    }

    // ----------
    // Transforms

    /// Escape text with the active encoding
    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Escaper::new(self.active_encoding()).escape(text, &self.settings.get(), &self.logger)
    }

    /// Restore text with the active encoding
    pub fn restore<'a>(&self, text: &'a str) -> Cow<'a, str> {
        Restorer::new(self.active_encoding()).restore(text, &self.settings.get(), &self.logger)
    }

    /// Scan given chat in place
    pub fn scan_chat(&self, chat: &mut [ChatMessage]) -> ScanReport {
        let scanner = match &self.mode {
            DeployMode::EventScan(subscriber) => *subscriber.scanner(),
            DeployMode::Hook(_) => Default::default(),
        };
        scanner.scan_chat(chat, &self.settings.get(), &self.logger)
    }

    /// Handle an event immediately
    ///
    /// Only meaningful in event scan mode, otherwise logged and ignored.
    pub fn on_event(&self, event: LifecycleEvent) -> Option<ScanReport> {
        match &self.mode {
            DeployMode::EventScan(subscriber) => {
                subscriber.trigger(event, &self.settings.get(), &self.logger)
            }
            DeployMode::Hook(_) => {
                self.logger
                    .dlog(&format!("[Scan] Hook mode ignores {}", event));
                None
            }
        }
    }

    // ----------
    // Getters

    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn mode(&self) -> &DeployMode {
        &self.mode
    }

    /// Whether transforms are installed, subscribed in case of event scan
    pub fn is_installed(&self) -> bool {
        match &self.mode {
            DeployMode::Hook(installer) => installer.is_registered(),
            DeployMode::EventScan(subscriber) => subscriber.is_attached(),
        }
    }

    /// Encoding in effect
    ///
    /// Event scan always writes backslashes into stored messages.
    pub fn active_encoding(&self) -> Encoding {
        match &self.mode {
            DeployMode::Hook(installer) => installer.encoding(),
            DeployMode::EventScan(_) => Encoding::Backslash,
        }
    }
}

fn filter_hint() -> &'static str {
    DEBUG_PREFIX.rsplit(' ').next().unwrap_or(DEBUG_PREFIX)
}
