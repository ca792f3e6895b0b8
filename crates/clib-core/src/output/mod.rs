//! Bounded output delivery.
//!
//! The host hands the bridge a fixed-size buffer on every call. Responses
//! that do not fit are split on a UTF-8 character boundary; the tail is kept
//! as the single outstanding overflow until the host asks for it with `ACK`.

use tracing::trace;

/// Tracing target for output chunking.
const OUTPUT_TARGET: &str = "clib_core::output";

/// Holds the unsent tail of the last oversized response.
///
/// # Example
///
/// ```
/// use clib_core::OutputChannel;
///
/// let mut channel = OutputChannel::new();
/// assert_eq!(channel.deliver("hello world".to_owned(), 5), "hello");
/// assert_eq!(channel.take_overflow(), " world");
/// ```
#[derive(Debug, Default)]
pub struct OutputChannel {
    overflow: Option<String>,
}

impl OutputChannel {
    /// Creates a channel with no pending overflow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the longest prefix of `full` that fits in `max_len` bytes.
    ///
    /// Whatever does not fit replaces the stored overflow. A response that
    /// fits clears it. When `max_len` is smaller than the first character the
    /// returned chunk is empty and the whole text is kept.
    ///
    /// Draining with `ACK` therefore only makes progress when `max_len` is
    /// at least the width of the next character: any `max_len >= 1` for
    /// ASCII, `max_len >= 4` for arbitrary UTF-8. A host with a smaller
    /// buffer receives empty chunks until it retries with a larger one.
    pub fn deliver(&mut self, mut full: String, max_len: usize) -> String {
        if full.len() <= max_len {
            self.overflow = None;
            return full;
        }

        let split = floor_char_boundary(&full, max_len);
        let tail = full.split_off(split);
        trace!(
            target: OUTPUT_TARGET,
            sent = full.len(),
            retained = tail.len(),
            "response exceeds host buffer"
        );
        self.overflow = Some(tail);
        full
    }

    /// Removes and returns the stored overflow, or an empty string.
    pub fn take_overflow(&mut self) -> String {
        self.overflow.take().unwrap_or_default()
    }

    /// Returns `true` while a tail is waiting to be collected.
    #[must_use]
    pub const fn has_overflow(&self) -> bool {
        self.overflow.is_some()
    }

    /// Length in bytes of the stored overflow.
    #[must_use]
    pub fn overflow_len(&self) -> usize {
        self.overflow.as_ref().map_or(0, String::len)
    }
}

/// Largest character boundary of `text` that is not past `index`.
#[must_use]
pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut split = index.min(text.len());
    while !text.is_char_boundary(split) {
        split -= 1;
    }
    split
}

#[cfg(test)]
mod tests;
