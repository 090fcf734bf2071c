/// Vulkan Debug Messenger - stores validation layer messages for the diagnostic drain
///
/// The messenger callback appends every warning and error to a `MessageStore`
/// (the device's diagnostic queue) and echoes messages to the console and/or a
/// log file according to the configured filters.

use ash::vk;
use colored::*;
use compute_bootstrap::bootstrap::{DebugMessageFilter, DebugOutput, DebugSeverity, Error, Result};
use compute_bootstrap::bootstrap::device::DiagnosticQueue;
use std::ffi::CStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Echo configuration for the callback
#[derive(Debug, Clone)]
pub struct EchoConfig {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
}

// ============================================================================
// MessageStore
// ============================================================================

/// Driver message store, filled by the debug messenger
///
/// Messages are stored NUL-terminated, the way the drain expects them from a
/// driver queue.
pub struct MessageStore {
    messages: Mutex<Vec<Vec<u8>>>,
    errors: AtomicU32,
    echo: Option<EchoConfig>,
}

impl MessageStore {
    /// Store that echoes nothing
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            errors: AtomicU32::new(0),
            echo: None,
        }
    }

    /// Store that echoes according to `echo`
    pub fn with_echo(echo: EchoConfig) -> Self {
        Self {
            echo: Some(echo),
            ..Self::new()
        }
    }

    /// Append a message
    pub fn push(&self, message: &str, is_error: bool) {
        let mut bytes = Vec::with_capacity(message.len() + 1);
        bytes.extend_from_slice(message.as_bytes());
        bytes.push(0);
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(bytes);
        }
        if is_error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Errors stored since the store was created (not reset by `clear`)
    pub fn error_count(&self) -> u32 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn echo(&self) -> Option<&EchoConfig> {
        self.echo.as_ref()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue for MessageStore {
    fn stored_message_count(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn message_size(&self, index: usize) -> Result<usize> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| Error::BackendError("message store poisoned".to_string()))?;
        messages
            .get(index)
            .map(Vec::len)
            .ok_or_else(|| Error::BackendError(format!("no stored message at index {}", index)))
    }

    fn fetch_message(&self, index: usize, buffer: &mut [u8]) -> Result<usize> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| Error::BackendError("message store poisoned".to_string()))?;
        let message = messages
            .get(index)
            .ok_or_else(|| Error::BackendError(format!("no stored message at index {}", index)))?;
        if buffer.len() < message.len() {
            return Err(Error::BackendError(format!(
                "buffer of {} bytes too small for message of {}",
                buffer.len(),
                message.len()
            )));
        }
        buffer[..message.len()].copy_from_slice(message);
        Ok(message.len())
    }

    fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

// ============================================================================
// Filters and formatting
// ============================================================================

/// Messenger severities for a configured echo severity
///
/// Warnings and errors are always requested: they feed the store even when
/// the echo shows less.
pub fn messenger_severity(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    let stored = vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING;
    match severity {
        DebugSeverity::All => {
            stored | vk::DebugUtilsMessageSeverityFlagsEXT::INFO | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
        DebugSeverity::ErrorsOnly | DebugSeverity::ErrorsAndWarnings => stored,
    }
}

/// Whether a message of `message_severity` passes the echo filter
pub fn passes_severity(severity: DebugSeverity, message_severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> bool {
    match severity {
        DebugSeverity::ErrorsOnly => message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
        DebugSeverity::ErrorsAndWarnings => {
            message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR)
                || message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING)
        }
        DebugSeverity::All => true,
    }
}

/// Whether a message of `message_type` passes the category filter
pub fn passes_category(filter: &DebugMessageFilter, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> bool {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        filter.show_validation
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        filter.show_performance
    } else {
        filter.show_general
    }
}

fn severity_name(message_severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &'static str {
    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        "ERROR"
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        "WARNING"
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        "INFO"
    } else {
        "VERBOSE"
    }
}

fn type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// One-line form stored in the message queue
pub fn format_stored(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id_name: &str,
    message: &str,
) -> String {
    format!(
        "{} [{}] {}: {}",
        severity_name(message_severity),
        type_name(message_type),
        message_id_name,
        message
    )
}

// ============================================================================
// Callback
// ============================================================================

/// Vulkan debug messenger callback
///
/// `user_data` must point to the `MessageStore` owned by the instance that
/// registered the messenger.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || user_data.is_null() {
        return vk::FALSE;
    }
    let store = &*(user_data as *const MessageStore);

    let callback_data = *p_callback_data;
    let message_id_name = c_text(callback_data.p_message_id_name, "Unknown");
    let message = c_text(callback_data.p_message, "No message");

    let is_error = message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    if is_error || message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        store.push(
            &format_stored(message_severity, message_type, message_id_name, message),
            is_error,
        );
    }

    if let Some(echo) = store.echo() {
        if passes_severity(echo.severity, message_severity) && passes_category(&echo.message_filter, message_type) {
            echo_message(echo, message_severity, message_type, message_id_name, message);
        }
    }

    vk::FALSE
}

/// Borrow a driver-owned C string, or `fallback` when absent or not UTF-8
unsafe fn c_text<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        return fallback;
    }
    CStr::from_ptr(ptr).to_str().unwrap_or(fallback)
}

fn echo_message(
    echo: &EchoConfig,
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    message_id_name: &str,
    message: &str,
) {
    let line = format_stored(message_severity, message_type, message_id_name, message);
    let (console, path) = match &echo.output {
        DebugOutput::Console => (true, None),
        DebugOutput::File(path) => (false, Some(path)),
        DebugOutput::Both(path) => (true, Some(path)),
    };

    if console {
        let name = severity_name(message_severity);
        let highlighted = match name {
            "ERROR" => line.as_str().red().bold(),
            "WARNING" => line.as_str().yellow(),
            _ => line.as_str().bright_black(),
        };
        eprintln!("{} {}", "[vulkan]".bright_blue().bold(), highlighted);
    }
    if let Some(path) = path {
        append_line(path, &format!("[vulkan] {}", line));
    }
}

fn append_line(path: &str, line: &str) {
    let appended = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| writeln!(file, "{}", line));
    if appended.is_err() {
        eprintln!("[vulkan] cannot append to debug log '{}'", path);
    }
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
