//! Reassembly of request frames split across several host calls.

use tracing::{trace, warn};

use crate::control::ETX;
use crate::error::ParseError;

/// Tracing target for input reassembly.
const INPUT_TARGET: &str = "clib_core::input";

/// Default bound on a buffered request, terminator included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Accumulates request fragments until a frame terminator arrives.
///
/// # Example
///
/// ```
/// use clib_core::InputBuffer;
///
/// let mut buffer = InputBuffer::new();
/// assert_eq!(buffer.push("\u{1}2\u{1f}Ext\u{1f}"), Ok(None));
/// let frame = buffer.push("Act\u{2}data\u{3}").expect("within limit");
/// assert_eq!(frame.as_deref(), Some("\u{1}2\u{1f}Ext\u{1f}Act\u{2}data\u{3}"));
/// assert!(buffer.is_empty());
/// ```
#[derive(Debug)]
pub struct InputBuffer {
    pending: String,
    limit: usize,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_REQUEST_BYTES)
    }
}

impl InputBuffer {
    /// Creates an empty buffer bounded by [`MAX_REQUEST_BYTES`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer that rejects frames longer than `limit` bytes.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            pending: String::new(),
            limit,
        }
    }

    /// Appends a fragment and returns the whole frame once it ends in `ETX`.
    ///
    /// Returning a frame empties the buffer, so a malformed frame can never
    /// block the frames that follow it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::RequestTooLarge`] and discards the buffered
    /// fragments once they exceed the limit.
    pub fn push(&mut self, fragment: &str) -> Result<Option<String>, ParseError> {
        self.pending.push_str(fragment);
        let size = self.pending.len();
        if size > self.limit {
            self.pending.clear();
            warn!(target: INPUT_TARGET, size, limit = self.limit, "oversized request discarded");
            return Err(ParseError::RequestTooLarge {
                size,
                limit: self.limit,
            });
        }
        if self.pending.ends_with(ETX) {
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        trace!(
            target: INPUT_TARGET,
            buffered = size,
            "awaiting remainder of request frame"
        );
        Ok(None)
    }

    /// Largest frame accepted, in bytes.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Returns `true` when no partial frame is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Length in bytes of the buffered partial frame.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Discards any buffered partial frame.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
