//! Bootstrap logging
//!
//! Every stage reports through one process-wide `Logger`. The default one
//! prints colored lines with local timestamps; tests and embedders swap it
//! with `set_logger`. Error entries carry the `file:line` of the call site.

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use std::fmt::Display;
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;

static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Sink for log entries
///
/// ```no_run
/// use compute_bootstrap::bootstrap::log::{Logger, LogEntry, LogSeverity};
///
/// struct StderrWarnings;
///
/// impl Logger for StderrWarnings {
///     fn log(&self, entry: &LogEntry) {
///         if entry.severity >= LogSeverity::Warn {
///             eprintln!("{}: {}", entry.source, entry.message);
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Component namespace, e.g. `bootstrap::PipelineBuilder`
    pub source: String,
    pub message: String,
    /// Call site, set by `boot_error!` and `boot_err!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// Call site as `(file, line)` when both are known
    pub fn location(&self) -> Option<(&'static str, u32)> {
        self.file.zip(self.line)
    }
}

/// Ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    /// Fixed-width label used in the line prefix
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console logger: `[timestamp] [SEVERITY] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Line without color codes, for files and assertions
    pub fn format_plain(entry: &LogEntry) -> String {
        Self::render(entry, entry.severity.label(), &entry.source)
    }

    fn render(entry: &LogEntry, severity: impl Display, source: impl Display) -> String {
        let timestamp: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            timestamp.format(TIMESTAMP_FORMAT),
            severity,
            source,
            entry.message
        );
        if let Some((file, number)) = entry.location() {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        println!(
            "{}",
            Self::render(entry, entry.severity.colored_label(), entry.source.bright_blue())
        );
    }
}

// ============================================================================
// Registry
// ============================================================================

fn registry() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

fn install(logger: Box<dyn Logger>) {
    if let Ok(mut slot) = registry().write() {
        *slot = logger;
    }
}

fn dispatch(severity: LogSeverity, source: &str, message: String, location: Option<(&'static str, u32)>) {
    if let Ok(logger) = registry().read() {
        logger.log(&LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: location.map(|(file, _)| file),
            line: location.map(|(_, line)| line),
        });
    }
}

/// Route every subsequent entry to `logger`
///
/// ```no_run
/// use compute_bootstrap::bootstrap::log::{self, Logger, LogEntry};
///
/// struct Silent;
/// impl Logger for Silent {
///     fn log(&self, _entry: &LogEntry) {}
/// }
///
/// log::set_logger(Silent);
/// ```
pub fn set_logger<L: Logger + 'static>(logger: L) {
    install(Box::new(logger));
}

/// Go back to `DefaultLogger`
pub fn reset_logger() {
    install(Box::new(DefaultLogger));
}

/// Backing call of the `boot_*!` macros
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(severity, source, message, None);
}

/// Backing call of `boot_error!` and `boot_err!`
pub fn log_detailed(severity: LogSeverity, source: &str, message: String, file: &'static str, line: u32) {
    dispatch(severity, source, message, Some((file, line)));
}

// ============================================================================
// Macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __boot_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::$severity, $source, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! boot_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__boot_log!(Trace, $source, $($arg)*) };
}

#[macro_export]
macro_rules! boot_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__boot_log!(Debug, $source, $($arg)*) };
}

/// ```no_run
/// compute_bootstrap::boot_info!("bootstrap::DeviceContext", "Device created on adapter {}", 0);
/// ```
#[macro_export]
macro_rules! boot_info {
    ($source:expr, $($arg:tt)*) => { $crate::__boot_log!(Info, $source, $($arg)*) };
}

#[macro_export]
macro_rules! boot_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__boot_log!(Warn, $source, $($arg)*) };
}

/// Error entry tagged with the call site
#[macro_export]
macro_rules! boot_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed($crate::log::LogSeverity::Error, $source, format!($($arg)*), file!(), line!())
    };
}

/// Log an `Error` value at the call site and evaluate to it
///
/// ```no_run
/// use compute_bootstrap::bootstrap::Error;
///
/// fn create_device() -> Result<(), Error> {
///     Err(compute_bootstrap::boot_err!("bootstrap::vulkan", Error::BackendError("vkCreateDevice failed".to_string())))
/// }
/// ```
#[macro_export]
macro_rules! boot_err {
    ($source:expr, $err:expr) => {{
        let error: $crate::bootstrap::Error = $err;
        $crate::boot_error!($source, "{}", error);
        error
    }};
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
