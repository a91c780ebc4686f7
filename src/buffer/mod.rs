//! Buffering of process output between reads and matches

mod ansi;

pub use ansi::strip_ansi;

use bytes::{Buf, BytesMut};

/// Accumulates bytes read from the controlled process until a pattern
/// consumes them.
///
/// Bytes are never reordered. They leave the buffer in exactly two ways:
/// `consume` after a successful match, or the oldest-first discard when the
/// configured limit is exceeded, in which case an overflow flag is latched
/// so the condition is reported rather than silently truncated.
pub(crate) struct OutputBuffer {
    buf: BytesMut,
    limit: usize,
    overflowed: bool,
    strip_ansi: bool,
}

impl OutputBuffer {
    pub(crate) fn new(limit: usize, strip_ansi: bool) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit.min(64 * 1024)),
            limit,
            overflowed: false,
            strip_ansi,
        }
    }

    /// Append one read increment. Returns the number of oldest bytes
    /// discarded to honor the limit, so callers can rebase scan offsets.
    pub(crate) fn append(&mut self, data: &[u8]) -> usize {
        if self.strip_ansi {
            let stripped = strip_ansi(data);
            self.buf.extend_from_slice(&stripped);
        } else {
            self.buf.extend_from_slice(data);
        }

        if self.buf.len() > self.limit {
            let excess = self.buf.len() - self.limit;
            self.buf.advance(excess);
            self.overflowed = true;
            excess
        } else {
            0
        }
    }

    /// The unconsumed bytes, oldest first.
    pub(crate) fn view(&self) -> &[u8] {
        &self.buf
    }

    /// Drop `[0, upto)` after a successful match.
    pub(crate) fn consume(&mut self, upto: usize) {
        self.buf.advance(upto.min(self.buf.len()));
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Latched when the limit forced a discard; cleared on report.
    pub(crate) fn take_overflow(&mut self) -> bool {
        std::mem::replace(&mut self.overflowed, false)
    }

    pub(crate) fn limit(&self) -> usize {
        self.limit
    }
}
