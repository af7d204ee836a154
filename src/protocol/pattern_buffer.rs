//! Text buffer with suspend-until-match reads.
//!
//! Decoded text is appended as it arrives. A single pending request holds a
//! regex; as soon as the buffered text matches, everything up to and
//! including the match is handed out and only the remainder is kept.
//!
//! # Example
//!
//! ```
//! use horizons_client::protocol::PatternBuffer;
//! use regex::Regex;
//!
//! let mut buffer = PatternBuffer::new();
//! assert!(buffer.request_until(Regex::new("Horizons> ").unwrap()).unwrap().is_none());
//!
//! assert!(buffer.append("Welcome\nHori").is_none());
//! let captured = buffer.append("zons> tail").unwrap();
//!
//! assert_eq!(captured, "Welcome\nHorizons> ");
//! assert_eq!(buffer.as_str(), " tail");
//! ```

use regex::Regex;

use crate::error::{HorizonsError, Result};

/// Default upper bound for buffered text (1 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// Accumulates decoded text and resolves one pending pattern read at a time.
#[derive(Debug)]
pub struct PatternBuffer {
    /// Text not yet consumed by a match.
    buffer: String,
    /// Pattern of the outstanding read, if any.
    pending: Option<Regex>,
    /// Appends beyond this size are still accepted but logged.
    max_len: usize,
}

impl PatternBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_BUFFER)
    }

    /// Create an empty buffer that warns once it grows past `max_len`.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buffer: String::new(),
            pending: None,
            max_len,
        }
    }

    /// Append decoded text and try to satisfy the pending read.
    ///
    /// Returns the captured prefix when the pending pattern now matches.
    pub fn append(&mut self, text: &str) -> Option<String> {
        let before = self.buffer.len();
        self.buffer.push_str(text);
        if before <= self.max_len && self.buffer.len() > self.max_len {
            tracing::warn!(
                "Pattern buffer holds {} bytes without a match (limit {})",
                self.buffer.len(),
                self.max_len
            );
        }
        self.try_resolve()
    }

    /// Register a pending read for `pattern`.
    ///
    /// Resolves immediately when the buffered text already matches.
    ///
    /// # Errors
    ///
    /// Returns [`HorizonsError::ReadPending`] if a read is already registered.
    pub fn request_until(&mut self, pattern: Regex) -> Result<Option<String>> {
        if let Some(existing) = &self.pending {
            return Err(HorizonsError::ReadPending(existing.as_str().to_string()));
        }
        self.pending = Some(pattern);
        Ok(self.try_resolve())
    }

    /// Resolve the pending read against the whole buffer (leftmost match).
    fn try_resolve(&mut self) -> Option<String> {
        let end = self.pending.as_ref()?.find(&self.buffer)?.end();

        let remainder = self.buffer.split_off(end);
        let captured = std::mem::replace(&mut self.buffer, remainder);
        self.pending = None;
        Some(captured)
    }

    /// Drop the pending read without touching buffered text.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Whether a read is outstanding.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take all buffered text, leaving the buffer empty.
    ///
    /// Also drops the pending read.
    pub fn take_remaining(&mut self) -> String {
        self.pending = None;
        std::mem::take(&mut self.buffer)
    }

    /// Buffered text not yet consumed.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer and any pending read.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending = None;
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_request_resolves_from_buffered_text() {
        let mut buffer = PatternBuffer::new();
        assert!(buffer.append("Horizons> ").is_none());

        let captured = buffer.request_until(re("Horizons> ")).unwrap();

        assert_eq!(captured.as_deref(), Some("Horizons> "));
        assert!(buffer.is_empty());
        assert!(!buffer.has_pending());
    }

    #[test]
    fn test_request_resolves_on_later_append() {
        let mut buffer = PatternBuffer::new();
        assert!(buffer.request_until(re("<cr>: ")).unwrap().is_none());
        assert!(buffer.has_pending());

        assert!(buffer.append("object data\n<cr").is_none());
        let captured = buffer.append(">: ").unwrap();

        assert_eq!(captured, "object data\n<cr>: ");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_remainder_excludes_match_exactly() {
        let mut buffer = PatternBuffer::new();
        buffer.append("a] : b] : c");

        let first = buffer.request_until(re(r"\] : ")).unwrap();
        assert_eq!(first.as_deref(), Some("a] : "));
        assert_eq!(buffer.as_str(), "b] : c");

        let second = buffer.request_until(re(r"\] : ")).unwrap();
        assert_eq!(second.as_deref(), Some("b] : "));
        assert_eq!(buffer.as_str(), "c");
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_leftmost_match_wins() {
        let mut buffer = PatternBuffer::new();
        buffer.append("x1 y2 x3");

        let captured = buffer.request_until(re(r"x\d")).unwrap();
        assert_eq!(captured.as_deref(), Some("x1"));
        assert_eq!(buffer.as_str(), " y2 x3");
    }

    #[test]
    fn test_second_request_is_rejected() {
        let mut buffer = PatternBuffer::new();
        buffer.request_until(re("first")).unwrap();

        let result = buffer.request_until(re("second"));
        assert!(matches!(result, Err(HorizonsError::ReadPending(p)) if p == "first"));

        // First request still pending
        assert_eq!(buffer.append("first").as_deref(), Some("first"));
    }

    #[test]
    fn test_cancel_allows_new_request() {
        let mut buffer = PatternBuffer::new();
        buffer.request_until(re("never")).unwrap();
        buffer.append("text");
        buffer.cancel();

        let captured = buffer.request_until(re("ex")).unwrap();
        assert_eq!(captured.as_deref(), Some("tex"));
        assert_eq!(buffer.as_str(), "t");
    }

    #[test]
    fn test_append_without_request_only_buffers() {
        let mut buffer = PatternBuffer::new();
        assert!(buffer.append("Horizons> ").is_none());
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_take_remaining_and_clear() {
        let mut buffer = PatternBuffer::new();
        buffer.request_until(re("never")).unwrap();
        buffer.append("partial ephemeris");

        assert_eq!(buffer.take_remaining(), "partial ephemeris");
        assert!(buffer.is_empty());
        assert!(!buffer.has_pending());

        buffer.append("more");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
