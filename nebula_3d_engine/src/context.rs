//! Explicit engine context shared by the render core components
//!
//! The context replaces global singletons (engine state, logger, console
//! variables): every core component receives a reference to an
//! [`EngineContext`] at construction time, which makes dependencies visible
//! and lets tests inject capturing loggers or custom cvar values.

use std::sync::RwLock;
use std::time::SystemTime;

use crate::cvar::CvarStore;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

/// Shared services for the render core: logging and console variables.
///
/// Thread-safe (`RwLock` inside) so it can sit behind an `Arc` and be read
/// from the render thread while tooling swaps the logger or tweaks cvars.
pub struct EngineContext {
    /// Active logger (replaceable at runtime)
    logger: RwLock<Box<dyn Logger>>,

    /// Console-variable store (runtime-tunable values)
    cvars: RwLock<CvarStore>,
}

impl EngineContext {
    /// Create a context with the default colored console logger and the
    /// default cvar values
    pub fn new() -> Self {
        Self {
            logger: RwLock::new(Box::new(DefaultLogger)),
            cvars: RwLock::new(CvarStore::new()),
        }
    }

    /// Create a context with a custom logger
    ///
    /// # Arguments
    ///
    /// * `logger` - Any type implementing the Logger trait
    pub fn with_logger<L: Logger + 'static>(logger: L) -> Self {
        Self {
            logger: RwLock::new(Box::new(logger)),
            cvars: RwLock::new(CvarStore::new()),
        }
    }

    /// Replace the active logger
    pub fn set_logger<L: Logger + 'static>(&self, logger: L) {
        if let Ok(mut lock) = self.logger.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset the logger to the default colored console logger
    pub fn reset_logger(&self) {
        if let Ok(mut lock) = self.logger.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Log a message without file:line information
    ///
    /// Used by the `engine_trace!` / `engine_debug!` / `engine_info!` /
    /// `engine_warn!` macros.
    pub fn log(&self, severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = self.logger.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log a message with file:line information
    ///
    /// Used by the `engine_error!` / `engine_err!` / `engine_bail!` macros.
    pub fn log_detailed(
        &self,
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = self.logger.read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }

    /// Read a cvar snapshot value through a closure
    ///
    /// The lock is held only for the duration of the closure; the frame loop
    /// reads its tunables once per frame this way.
    pub fn with_cvars<T>(&self, f: impl FnOnce(&CvarStore) -> T) -> T {
        let guard = self.cvars.read().expect("cvar store lock poisoned");
        f(&guard)
    }

    /// Mutate the cvar store (console / tooling side)
    pub fn with_cvars_mut<T>(&self, f: impl FnOnce(&mut CvarStore) -> T) -> T {
        let mut guard = self.cvars.write().expect("cvar store lock poisoned");
        f(&mut guard)
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
