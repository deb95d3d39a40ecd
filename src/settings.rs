//! # Settings
//!
//! Two process wide flags and the stores they are persisted into.

use crate::common::FsvResult;
use crate::consts::MODULE_NAME;
use crate::error::FsvError;
use crate::logger::Logger;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Filter settings
///
/// Deserializing a partial object keeps defaults for the absent keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
        }
    }
}

impl Settings {
    /// Merge a persisted object onto current values
    ///
    /// Keys override one by one. Absent keys and values that are not booleans keep the current
    /// value. Returns how many keys were applied.
    pub fn merge_from(&mut self, persisted: &Value) -> usize {
        let Some(object) = persisted.as_object() else {
            return 0;
        };
        let mut merged = 0;
        if let Some(enabled) = object.get("enabled").and_then(Value::as_bool) {
            self.enabled = enabled;
            merged += 1;
        }
        if let Some(debug) = object.get("debug").and_then(Value::as_bool) {
            self.debug = debug;
            merged += 1;
        }
        merged
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("enabled".to_string(), Value::Bool(self.enabled));
        object.insert("debug".to_string(), Value::Bool(self.debug));
        Value::Object(object)
    }
}

/// Triat for settings persistence
///
/// A store keeps the raw persisted object for this filter. The object may be partial or
/// absent, merging onto defaults is done by the caller.
pub trait SettingsStore {
    /// Load persisted object, none if nothing was saved yet
    fn load(&self) -> FsvResult<Option<Value>>;
    /// Persist settings
    fn save(&mut self, settings: &Settings) -> FsvResult<()>;
}

/// In memory store, handy for hosts that persist by themselves
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    value: Option<Value>,
}

impl MemoryStore {
    pub fn new(value: Option<Value>) -> Self {
        Self { value }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> FsvResult<Option<Value>> {
        Ok(self.value.clone())
    }

    fn save(&mut self, settings: &Settings) -> FsvResult<()> {
        self.value.replace(settings.to_value());
        Ok(())
    }
}

/// Json file shaped like a host's extension settings
///
/// The file holds an object keyed by module name. Only this filter's key is read and written,
/// other keys are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_root(&self) -> FsvResult<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(root) => Ok(Some(root)),
            _ => Err(FsvError::InvalidSettings(format!(
                "\"{}\" is not a json object",
                self.path.display()
            ))),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> FsvResult<Option<Value>> {
        Ok(self
            .read_root()?
            .and_then(|mut root| root.remove(MODULE_NAME)))
    }

    fn save(&mut self, settings: &Settings) -> FsvResult<()> {
        let mut root = self.read_root()?.unwrap_or_default();
        root.insert(MODULE_NAME.to_string(), settings.to_value());
        let content = serde_json::to_string_pretty(&Value::Object(root))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Load settings from store, merged onto defaults
///
/// A failing store is not fatal, defaults are used instead.
pub fn load_settings(store: &dyn SettingsStore, logger: &Logger) -> Settings {
    let mut settings = Settings::default();
    match store.load() {
        Ok(Some(persisted)) => {
            let merged = settings.merge_from(&persisted);
            logger.dlog(&format!("[Settings] Merged {} persisted key(s)", merged));
        }
        Ok(None) => logger.dlog("[Settings] Nothing persisted, using defaults"),
        Err(err) => logger.wlog(&format!("[Settings] Failed to load, using defaults: {}", err)),
    }
    settings
}
