/// Diagnostic queue trait - driver-side message store

use crate::error::Result;

/// Driver message queue
///
/// Messages are fetched with a two-phase protocol: query the size of a
/// message, then fetch it into a buffer of exactly that size. Sizes are
/// driver-determined and not known in advance.
pub trait DiagnosticQueue {
    /// Number of messages currently stored
    fn stored_message_count(&self) -> usize;

    /// Size in bytes of the message at `index`
    fn message_size(&self, index: usize) -> Result<usize>;

    /// Copy the message at `index` into `buffer`
    ///
    /// # Returns
    ///
    /// Number of bytes written. Fails if `buffer` is smaller than
    /// `message_size(index)`.
    fn fetch_message(&self, index: usize, buffer: &mut [u8]) -> Result<usize>;

    /// Drop every stored message
    fn clear(&self);
}
