//! Wire-level constants, the bounded response buffer, and response
//! classification for CR/LF-terminated command protocols.
//!
//! Every command sent to the modem is ASCII text followed by `\r\n`, and every
//! response is a single line terminated the same way. While a line is being
//! accumulated, `\r` bytes are discarded and only `\n` ends the line.

use std::borrow::Cow;

use bytes::{BufMut, BytesMut};
use rn2903_core::types::ResponseStatus;

/// The byte that terminates every response line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Carriage return, discarded while accumulating a response.
pub const CARRIAGE_RETURN: u8 = b'\r';

/// The byte sequence written after every command.
pub const COMMAND_TERMINATOR: &[u8] = b"\r\n";

/// Capacity of the response buffer. At most `MAX_RESPONSE - 1` bytes of
/// response text are kept.
pub const MAX_RESPONSE: usize = 512;

/// Marker the modem returns for a rejected command or argument.
pub const PHRASE_INVALID_PARAM: &str = "invalid_param";

/// Bounded accumulator for one response line.
///
/// Holds at most [`MAX_RESPONSE`]` - 1` bytes; [`push`](Self::push) refuses
/// further bytes rather than growing.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    buf: BytesMut,
}

impl ResponseBuffer {
    /// Create an empty buffer with [`MAX_RESPONSE`] capacity.
    pub fn new() -> Self {
        ResponseBuffer {
            buf: BytesMut::with_capacity(MAX_RESPONSE),
        }
    }

    /// Discard the current contents.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Append one byte. Returns `false`, leaving the buffer unchanged, once
    /// the buffer already holds `MAX_RESPONSE - 1` bytes.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.buf.len() >= MAX_RESPONSE - 1 {
            return false;
        }
        self.buf.put_u8(byte);
        true
    }

    /// The raw response bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The response as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Whether the next [`push`](Self::push) would be refused.
    pub fn is_full(&self) -> bool {
        self.buf.len() >= MAX_RESPONSE - 1
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-sensitive substring search over response bytes.
///
/// An empty `phrase` is always found.
pub fn contains_phrase(haystack: &[u8], phrase: &str) -> bool {
    let needle = phrase.as_bytes();
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Classify a terminal response state.
///
/// Priority: a timeout wins over everything, then `invalid_param`, and any
/// other line (data, `ok`, or empty) is a success.
pub fn classify(response: &[u8], timed_out: bool) -> ResponseStatus {
    if timed_out {
        ResponseStatus::Timeout
    } else if contains_phrase(response, PHRASE_INVALID_PARAM) {
        ResponseStatus::InvalidParam
    } else {
        ResponseStatus::Ok
    }
}
