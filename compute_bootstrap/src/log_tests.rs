//! Unit tests for log.rs
//!
//! Tests Logger trait, LogEntry, LogSeverity, DefaultLogger and the logging
//! macros routed through the global registry.

use crate::error::Error;
use crate::log::{self, DefaultLogger, LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "bootstrap::Test".to_string(),
        message: "message".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_severity_threshold_comparison() {
    let mut severities = vec![LogSeverity::Error, LogSeverity::Trace, LogSeverity::Warn, LogSeverity::Info, LogSeverity::Debug];
    severities.sort();
    assert_eq!(
        severities,
        vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error]
    );
    assert_eq!(severities.iter().filter(|&&s| s >= LogSeverity::Warn).count(), 2);
}

// ============================================================================
// LOG ENTRY / DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_severity_labels_are_fixed_width() {
    for severity in [LogSeverity::Trace, LogSeverity::Info, LogSeverity::Error] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Warn.label(), "WARN ");
}

#[test]
fn test_entry_location_needs_file_and_line() {
    assert_eq!(entry(LogSeverity::Error, Some("a.rs"), Some(3)).location(), Some(("a.rs", 3)));
    assert_eq!(entry(LogSeverity::Error, Some("a.rs"), None).location(), None);
}

#[test]
fn test_format_plain_without_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Info, None, None));
    assert!(text.contains("[INFO ]"));
    assert!(text.contains("[bootstrap::Test] message"));
    assert!(!text.contains(".rs:"));
}

#[test]
fn test_format_plain_with_location() {
    let text = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("session.rs"), Some(42)));
    assert!(text.contains("[ERROR]"));
    assert!(text.ends_with("message (session.rs:42)"));
}

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("log_tests.rs"), Some(1)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// GLOBAL REGISTRY TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Entries logged from `source` while `f` runs with a capture logger
fn capture(source: &str, f: impl FnOnce()) -> Vec<LogEntry> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger {
        entries: Arc::clone(&entries),
    });
    f();
    log::reset_logger();

    let captured = entries.lock().unwrap();
    captured.iter().filter(|e| e.source == source).cloned().collect()
}

#[test]
#[serial]
fn test_macros_route_through_custom_logger() {
    let entries = capture("test::macros", || {
        crate::boot_trace!("test::macros", "trace {}", 1);
        crate::boot_debug!("test::macros", "debug {}", 2);
        crate::boot_info!("test::macros", "info {}", 3);
        crate::boot_warn!("test::macros", "warn {}", 4);
    });

    let severities: Vec<LogSeverity> = entries.iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn]
    );
    assert_eq!(entries[2].message, "info 3");
    assert!(entries.iter().all(|e| e.file.is_none() && e.line.is_none()));
}

#[test]
#[serial]
fn test_boot_error_carries_location() {
    let entries = capture("test::error", || {
        crate::boot_error!("test::error", "pipeline rejected");
    });

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some_and(|f| f.ends_with("log_tests.rs")));
    assert!(entries[0].line.is_some());
}

#[test]
#[serial]
fn test_boot_err_logs_and_yields_error() {
    let mut yielded = None;
    let entries = capture("test::err", || {
        yielded = Some(crate::boot_err!("test::err", Error::AdapterNotFound(3)));
    });

    assert!(matches!(yielded, Some(Error::AdapterNotFound(3))));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "Adapter not found: invalid adapter index 3");
}

#[test]
#[serial]
fn test_reset_logger_restores_default() {
    let entries = Arc::new(Mutex::new(Vec::new()));
    log::set_logger(CaptureLogger {
        entries: Arc::clone(&entries),
    });
    log::reset_logger();

    crate::boot_info!("test::reset", "after reset");
    assert!(entries.lock().unwrap().iter().all(|e| e.source != "test::reset"));
}
