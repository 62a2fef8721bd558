//! Unit tests for context.rs

use super::*;
use crate::cvar::CvarValue;
use crate::log::{LogEntry, LogSeverity, Logger};
use std::sync::{Arc, Mutex};

/// Logger that records every entry for assertions
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn capturing_context() -> (EngineContext, Arc<Mutex<Vec<LogEntry>>>) {
    let entries = Arc::new(Mutex::new(Vec::new()));
    let ctx = EngineContext::with_logger(CaptureLogger {
        entries: Arc::clone(&entries),
    });
    (ctx, entries)
}

// ============================================================================
// Logging through the context
// ============================================================================

#[test]
fn test_log_routes_to_installed_logger() {
    let (ctx, entries) = capturing_context();

    ctx.log(LogSeverity::Info, "nebula3d::Test", "hello".to_string());

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].source, "nebula3d::Test");
    assert_eq!(captured[0].message, "hello");
    assert!(captured[0].file.is_none());
}

#[test]
fn test_log_detailed_carries_location() {
    let (ctx, entries) = capturing_context();

    ctx.log_detailed(
        LogSeverity::Error,
        "nebula3d::Test",
        "boom".to_string(),
        "src/context.rs",
        7,
    );

    let captured = entries.lock().unwrap();
    assert_eq!(captured[0].file, Some("src/context.rs"));
    assert_eq!(captured[0].line, Some(7));
}

#[test]
fn test_set_logger_replaces_active_logger() {
    let (ctx, first_entries) = {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let ctx = EngineContext::with_logger(CaptureLogger {
            entries: Arc::clone(&entries),
        });
        (ctx, entries)
    };

    let second_entries = Arc::new(Mutex::new(Vec::new()));
    ctx.set_logger(CaptureLogger {
        entries: Arc::clone(&second_entries),
    });

    ctx.log(LogSeverity::Info, "src", "after swap".to_string());

    assert!(first_entries.lock().unwrap().is_empty());
    assert_eq!(second_entries.lock().unwrap().len(), 1);
}

// ============================================================================
// Macros route through the context
// ============================================================================

#[test]
fn test_engine_info_macro() {
    let (ctx, entries) = capturing_context();

    crate::engine_info!(ctx, "nebula3d::Test", "value is {}", 42);

    let captured = entries.lock().unwrap();
    assert_eq!(captured[0].severity, LogSeverity::Info);
    assert_eq!(captured[0].message, "value is 42");
}

#[test]
fn test_engine_err_macro_logs_and_builds_error() {
    let (ctx, entries) = capturing_context();

    let err = crate::engine_err!(ctx, "nebula3d::Test", "failed with code {}", -3);

    assert!(matches!(err, crate::Error::BackendError(_)));
    assert!(format!("{}", err).contains("failed with code -3"));

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].severity, LogSeverity::Error);
    assert!(captured[0].file.is_some());
}

#[test]
fn test_engine_bail_macro_returns_early() {
    let (ctx, entries) = capturing_context();

    fn failing(ctx: &EngineContext) -> crate::Result<i32> {
        crate::engine_bail!(ctx, "nebula3d::Test", "bailing out");
    }

    let result = failing(&ctx);
    assert!(result.is_err());
    assert_eq!(entries.lock().unwrap().len(), 1);
}

// ============================================================================
// Cvar access through the context
// ============================================================================

#[test]
fn test_cvars_read_and_write() {
    let ctx = EngineContext::new();

    ctx.with_cvars_mut(|cvars| cvars.set("render.debug_wireframe", CvarValue::Bool(true)));

    let wireframe = ctx.with_cvars(|cvars| cvars.get_bool_or("render.debug_wireframe", false));
    assert!(wireframe);
}

#[test]
fn test_default_context_has_seeded_cvars() {
    let ctx = EngineContext::new();
    let has_clear_color = ctx.with_cvars(|cvars| cvars.get("render.clear_color").is_some());
    assert!(has_clear_color);
}
