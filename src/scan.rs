//! Event scan mode
//!
//! Instead of hooking a macro pipeline, stored message bodies are fixed in place whenever the
//! host reports a chat lifecycle event.

use crate::common::Encoding;
use crate::escaper::Escaper;
use crate::logger::Logger;
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

/// A chat message as stored by the host
///
/// Unknown fields are carried along untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mes: Option<String>,
    /// Alternate texts of the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swipes: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(is_user: bool, mes: &str) -> Self {
        Self {
            is_user,
            mes: Some(mes.to_string()),
            ..Default::default()
        }
    }

    pub fn with_swipes(mut self, swipes: &[&str]) -> Self {
        self.swipes
            .replace(swipes.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Host lifecycle events that trigger a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    GenerationStarted,
    MessageReceived,
    MessageEdited,
    ChatChanged,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 4] = [
        Self::GenerationStarted,
        Self::MessageReceived,
        Self::MessageEdited,
        Self::ChatChanged,
    ];

    /// Event name on the host bus
    pub fn name(&self) -> &'static str {
        match self {
            Self::GenerationStarted => "generation_started",
            Self::MessageReceived => "message_received",
            Self::MessageEdited => "message_edited",
            Self::ChatChanged => "chat_id_changed",
        }
    }
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Host state reachable from an event handler
pub trait HostContext {
    /// Current chat history, none when no chat is loaded
    fn chat_mut(&mut self) -> Option<&mut [ChatMessage]>;
}

pub type SharedContext = Rc<RefCell<dyn HostContext>>;

/// Accessor to fetch current host context, none if the host has no context yet
pub type ContextAccessor = Rc<dyn Fn() -> Option<SharedContext>>;

/// Handlers get no payload and must re-fetch state through an accessor
pub type EventHandler = Box<dyn FnMut()>;

/// Event bus of a host
pub trait EventBus {
    fn subscribe(&mut self, event: LifecycleEvent, handler: EventHandler);
}

pub type SharedBus = Rc<RefCell<dyn EventBus>>;

/// Result of a single scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Messages visited
    pub messages: usize,
    /// Indices of messages with at least one fixed field
    pub changed: Vec<usize>,
    /// Count of fixed fields, swipes included
    pub fields: usize,
}

/// Escapes message bodies in place
///
/// Scanned text is persisted with no post transform to undo it, therefore the scanner always
/// writes backslash escapes.
#[derive(Debug, Clone, Copy)]
pub struct EventScanner {
    escaper: Escaper,
}

impl Default for EventScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl EventScanner {
    pub fn new() -> Self {
        Self {
            escaper: Escaper::new(Encoding::Backslash),
        }
    }

    /// Fix every message body and swipe
    ///
    /// Only fields that needed a fix are assigned, every other string keeps its buffer.
    pub fn scan_chat(
        &self,
        chat: &mut [ChatMessage],
        settings: &Settings,
        logger: &Logger,
    ) -> ScanReport {
        let mut report = ScanReport::default();
        if !settings.enabled {
            logger.dlog("[Scan] Disabled, skipping");
            return report;
        }

        let started = Instant::now();
        for (index, message) in chat.iter_mut().enumerate() {
            report.messages += 1;
            let mut fixed = 0;

            match message.mes.as_mut() {
                Some(mes) => fixed += self.fix_field(mes, settings, logger) as usize,
                None => logger.dlog(&format!("[Scan] Message {} has no text, skipping", index)),
            }
            if let Some(swipes) = message.swipes.as_mut() {
                for swipe in swipes.iter_mut() {
                    fixed += self.fix_field(swipe, settings, logger) as usize;
                }
            }

            if fixed > 0 {
                report.fields += fixed;
                report.changed.push(index);
            }
        }

        if report.fields > 0 {
            logger.dlog(&format!(
                "[Scan] Fixed {} field(s) in {} message(s) in {:.2}ms",
                report.fields,
                report.changed.len(),
                started.elapsed().as_secs_f64() * 1000.0
            ));
        } else {
            logger.dlog("[Scan] Nothing to fix");
        }
        report
    }

    /// Fetch host context and scan its chat
    ///
    /// Missing context, busy context or missing chat is not an error, a warning is logged and
    /// none returned.
    pub fn scan_context(
        &self,
        accessor: &ContextAccessor,
        event: LifecycleEvent,
        settings: &Settings,
        logger: &Logger,
    ) -> Option<ScanReport> {
        if !settings.enabled {
            logger.dlog(&format!("[Scan] Disabled, ignoring {}", event));
            return None;
        }
        let Some(context) = accessor() else {
            logger.wlog(&format!("[Scan] No context available on {}", event));
            return None;
        };
        let Ok(mut context) = context.try_borrow_mut() else {
            logger.wlog(&format!("[Scan] Host context busy on {}, skipping", event));
            return None;
        };
        let Some(chat) = context.chat_mut() else {
            logger.wlog(&format!("[Scan] No chat loaded on {}", event));
            return None;
        };
        logger.dlog(&format!("[Scan] {} triggered, {} message(s)", event, chat.len()));
        Some(self.scan_chat(chat, settings, logger))
    }

    fn fix_field(&self, field: &mut String, settings: &Settings, logger: &Logger) -> bool {
        let fixed = match self.escaper.escape(field, settings, logger) {
            Cow::Owned(fixed) => fixed,
            Cow::Borrowed(_) => return false,
        };
        *field = fixed;
        true
    }
}

/// Subscribes a scanner to host events
pub struct ScanSubscriber {
    bus: Option<SharedBus>,
    accessor: ContextAccessor,
    scanner: EventScanner,
    attached: bool,
}

impl ScanSubscriber {
    pub fn new(bus: Option<SharedBus>, accessor: ContextAccessor) -> Self {
        Self {
            bus,
            accessor,
            scanner: EventScanner::new(),
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn scanner(&self) -> &EventScanner {
        &self.scanner
    }

    /// Subscribe to every lifecycle event once
    pub fn attach(&mut self, settings: &Rc<Cell<Settings>>, logger: &Rc<Logger>) {
        if self.attached {
            logger.dlog("[Scan] Already subscribed, skipping");
            return;
        }
        let Some(bus) = self.bus.as_ref() else {
            logger.wlog("[Scan] Event bus not available, cannot subscribe");
            return;
        };

        let Ok(mut bus) = bus.try_borrow_mut() else {
            logger.wlog("[Scan] Event bus busy, cannot subscribe");
            return;
        };
        for event in LifecycleEvent::ALL {
            let settings = Rc::clone(settings);
            let logger = Rc::clone(logger);
            let accessor = Rc::clone(&self.accessor);
            let scanner = self.scanner;
            bus.subscribe(
                event,
                Box::new(move || {
                    scanner.scan_context(&accessor, event, &settings.get(), &logger);
                }),
            );
        }
        self.attached = true;
        logger.log("[Scan] Subscribed to chat events");
    }

    /// Run a scan right away as if event was fired
    pub fn trigger(
        &self,
        event: LifecycleEvent,
        settings: &Settings,
        logger: &Logger,
    ) -> Option<ScanReport> {
        self.scanner
            .scan_context(&self.accessor, event, settings, logger)
    }
}
