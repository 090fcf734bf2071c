/// DiagnosticReporter - drains the driver message queue

use crate::boot_warn;
use crate::device::DiagnosticQueue;

const SOURCE: &str = "bootstrap::DiagnosticReporter";

pub struct DiagnosticReporter;

impl DiagnosticReporter {
    /// Read every stored message, oldest first, then clear the queue
    ///
    /// Each message is sized before it is fetched into a buffer of exactly
    /// that size. Messages that fail either call are skipped.
    ///
    /// # Returns
    ///
    /// Empty when `sink` is `None`
    pub fn drain(sink: Option<&dyn DiagnosticQueue>) -> Vec<String> {
        let Some(sink) = sink else {
            return Vec::new();
        };

        let count = sink.stored_message_count();
        let mut messages = Vec::with_capacity(count);

        for index in 0..count {
            let size = match sink.message_size(index) {
                Ok(size) => size,
                Err(e) => {
                    boot_warn!(SOURCE, "Skipping message {}: size query failed: {}", index, e);
                    continue;
                }
            };

            let mut buffer = vec![0u8; size];
            let written = match sink.fetch_message(index, &mut buffer) {
                Ok(written) => written,
                Err(e) => {
                    boot_warn!(SOURCE, "Skipping message {}: fetch failed: {}", index, e);
                    continue;
                }
            };
            buffer.truncate(written);

            let message = String::from_utf8_lossy(&buffer);
            messages.push(message.trim_end_matches('\0').to_string());
        }

        sink.clear();
        messages
    }
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
