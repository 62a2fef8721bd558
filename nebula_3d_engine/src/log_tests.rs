//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, and DefaultLogger.

use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
use std::time::SystemTime;

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_equality() {
    assert_eq!(LogSeverity::Info, LogSeverity::Info);
    assert_ne!(LogSeverity::Trace, LogSeverity::Debug);
    assert_ne!(LogSeverity::Info, LogSeverity::Error);
}

#[test]
fn test_log_severity_debug_format() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Error), "Error");
}

// ============================================================================
// LOG ENTRY TESTS
// ============================================================================

#[test]
fn test_log_entry_construction() {
    let entry = LogEntry {
        severity: LogSeverity::Warn,
        timestamp: SystemTime::now(),
        source: "nebula3d::Test".to_string(),
        message: "hello".to_string(),
        file: None,
        line: None,
    };

    assert_eq!(entry.severity, LogSeverity::Warn);
    assert_eq!(entry.source, "nebula3d::Test");
    assert_eq!(entry.message, "hello");
    assert!(entry.file.is_none());
}

#[test]
fn test_log_entry_with_location() {
    let entry = LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "nebula3d::Test".to_string(),
        message: "boom".to_string(),
        file: Some("src/lib.rs"),
        line: Some(42),
    };

    assert_eq!(entry.file, Some("src/lib.rs"));
    assert_eq!(entry.line, Some(42));
}

#[test]
fn test_log_entry_clone() {
    let entry = LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "src".to_string(),
        message: "msg".to_string(),
        file: None,
        line: None,
    };
    let cloned = entry.clone();
    assert_eq!(cloned.source, entry.source);
    assert_eq!(cloned.message, entry.message);
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_accepts_entries() {
    // DefaultLogger writes to stdout; just verify it doesn't panic on both
    // entry shapes.
    let logger = DefaultLogger;
    logger.log(&LogEntry {
        severity: LogSeverity::Info,
        timestamp: SystemTime::now(),
        source: "nebula3d::Test".to_string(),
        message: "plain entry".to_string(),
        file: None,
        line: None,
    });
    logger.log(&LogEntry {
        severity: LogSeverity::Error,
        timestamp: SystemTime::now(),
        source: "nebula3d::Test".to_string(),
        message: "detailed entry".to_string(),
        file: Some("src/log.rs"),
        line: Some(1),
    });
}

// ============================================================================
// CUSTOM LOGGER TESTS
// ============================================================================

#[test]
fn test_custom_logger_receives_entries() {
    use std::sync::{Arc, Mutex};

    struct CaptureLogger {
        entries: Arc<Mutex<Vec<LogEntry>>>,
    }

    impl Logger for CaptureLogger {
        fn log(&self, entry: &LogEntry) {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }

    let entries = Arc::new(Mutex::new(Vec::new()));
    let logger = CaptureLogger {
        entries: Arc::clone(&entries),
    };

    logger.log(&LogEntry {
        severity: LogSeverity::Debug,
        timestamp: SystemTime::now(),
        source: "nebula3d::Custom".to_string(),
        message: "captured".to_string(),
        file: None,
        line: None,
    });

    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].message, "captured");
}
