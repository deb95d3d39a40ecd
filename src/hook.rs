//! Hook mode
//!
//! Installs the escaper and the restorer as transforms of an external macro pipeline.

use crate::common::Encoding;
use crate::consts::{MODULE_NAME, POST_PROCESSOR_PRIORITY, PRE_PROCESSOR_PRIORITY};
use crate::escaper::Escaper;
use crate::logger::Logger;
use crate::restorer::Restorer;
use crate::settings::Settings;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Environment values a pipeline hands to its transforms
pub type MacroEnv = HashMap<String, String>;

/// Transform signature, text in and text out
pub type TransformFn = Box<dyn Fn(&str, &MacroEnv) -> String>;

/// Pipeline shared with the host
pub type SharedPipeline = Rc<RefCell<dyn MacroPipeline>>;

/// Registration options of a transform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Lower runs earlier
    pub priority: i32,
    /// Identifier of the registering module
    pub source: String,
}

impl HookConfig {
    pub fn new(priority: i32, source: &str) -> Self {
        Self {
            priority,
            source: source.to_string(),
        }
    }
}

/// Opaque handle given by a pipeline on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

impl HookHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Macro processing pipeline of a host
///
/// Pre processors run before the engine splits macro arguments, post processors run after
/// expansion produced its output.
pub trait MacroPipeline {
    fn add_pre_processor(&mut self, transform: TransformFn, config: HookConfig) -> HookHandle;
    fn add_post_processor(&mut self, transform: TransformFn, config: HookConfig) -> HookHandle;
    /// Returns whether a transform was actually removed
    fn remove_pre_processor(&mut self, handle: HookHandle) -> bool;
    /// Returns whether a transform was actually removed
    fn remove_post_processor(&mut self, handle: HookHandle) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    pre: HookHandle,
    post: HookHandle,
}

/// Keeps track of installed transforms
///
/// Both register and unregister are idempotent and never fail.
pub struct HookInstaller {
    pipeline: Option<SharedPipeline>,
    registration: Option<Registration>,
    escaper: Escaper,
    restorer: Restorer,
}

impl HookInstaller {
    pub fn new(pipeline: Option<SharedPipeline>, encoding: Encoding) -> Self {
        Self {
            pipeline,
            registration: None,
            escaper: Escaper::new(encoding),
            restorer: Restorer::new(encoding),
        }
    }

    pub(crate) fn set_encoding(&mut self, encoding: Encoding) {
        self.escaper = Escaper::new(encoding);
        self.restorer = Restorer::new(encoding);
    }

    pub fn encoding(&self) -> Encoding {
        self.escaper.encoding()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// Register both transforms
    ///
    /// Transforms read settings on every call, so later flag changes apply without
    /// re-registration.
    pub fn register(&mut self, settings: &Rc<Cell<Settings>>, logger: &Rc<Logger>) {
        if self.registration.is_some() {
            logger.dlog("[PreProcessor] Already registered, skipping");
            return;
        }
        let Some(pipeline) = self.pipeline.as_ref() else {
            logger.wlog("[PreProcessor] MacroEngine not available, cannot register");
            return;
        };

        let pre: TransformFn = {
            let settings = Rc::clone(settings);
            let logger = Rc::clone(logger);
            let escaper = self.escaper;
            Box::new(move |text: &str, _env: &MacroEnv| {
                escaper.escape(text, &settings.get(), &logger).into_owned()
            })
        };
        let post: TransformFn = {
            let settings = Rc::clone(settings);
            let logger = Rc::clone(logger);
            let restorer = self.restorer;
            Box::new(move |text: &str, _env: &MacroEnv| {
                restorer
                    .restore(text, &settings.get(), &logger)
                    .into_owned()
            })
        };

        let Ok(mut pipeline) = pipeline.try_borrow_mut() else {
            logger.wlog("[PreProcessor] MacroEngine busy, cannot register");
            return;
        };
        let pre =
            pipeline.add_pre_processor(pre, HookConfig::new(PRE_PROCESSOR_PRIORITY, MODULE_NAME));
        let post = pipeline
            .add_post_processor(post, HookConfig::new(POST_PROCESSOR_PRIORITY, MODULE_NAME));
        self.registration.replace(Registration { pre, post });

        logger.log(&format!(
            "[PreProcessor] Registered with MacroEngine (priority={})",
            PRE_PROCESSOR_PRIORITY
        ));
        logger.log(&format!(
            "[PostProcessor] Registered with MacroEngine (priority={})",
            POST_PROCESSOR_PRIORITY
        ));
    }

    /// Remove both transforms
    ///
    /// Local registration is cleared even when the pipeline didn't know the handles.
    pub fn unregister(&mut self, logger: &Logger) {
        let Some(registration) = self.registration else {
            logger.dlog("[PreProcessor] Not registered, skipping");
            return;
        };
        let Some(pipeline) = self.pipeline.as_ref() else {
            logger.wlog("[PreProcessor] MacroEngine not available, cannot unregister");
            return;
        };

        // Keep the handles so a later call can retry
        let Ok(mut pipeline) = pipeline.try_borrow_mut() else {
            logger.wlog("[PreProcessor] MacroEngine busy, cannot unregister");
            return;
        };
        if pipeline.remove_pre_processor(registration.pre) {
            logger.log("[PreProcessor] Unregistered from MacroEngine");
        } else {
            logger.wlog("[PreProcessor] Failed to unregister (not found in MacroEngine)");
        }
        if pipeline.remove_post_processor(registration.post) {
            logger.log("[PostProcessor] Unregistered from MacroEngine");
        } else {
            logger.wlog("[PostProcessor] Failed to unregister (not found in MacroEngine)");
        }

        self.registration = None;
    }
}
