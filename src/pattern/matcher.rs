//! Matcher implementations for buffer scanning

use memchr::memmem;
use regex::bytes::Regex;

/// A located match within the buffer window.
#[derive(Debug, Clone)]
pub(crate) struct Found {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) captures: Vec<String>,
}

/// Scans the buffer for one pattern kind.
///
/// `find` never considers positions before `from`: the engine advances that
/// floor after failed scans so streaming evaluation stays amortized linear
/// instead of rescanning the whole buffer on every read increment.
pub(crate) trait Matcher: Send + Sync {
    fn find(&self, hay: &[u8], from: usize) -> Option<Found>;

    /// Lowest offset at which a future match could still start after a
    /// failed scan over `hay_len` bytes.
    fn next_floor(&self, _hay_len: usize) -> usize {
        0
    }
}

/// Literal byte-sequence matcher backed by `memchr::memmem`.
pub(crate) struct LiteralMatcher {
    finder: memmem::Finder<'static>,
    len: usize,
}

impl LiteralMatcher {
    pub(crate) fn new(pattern: &[u8]) -> Self {
        Self {
            finder: memmem::Finder::new(pattern).into_owned(),
            len: pattern.len(),
        }
    }
}

impl Matcher for LiteralMatcher {
    fn find(&self, hay: &[u8], from: usize) -> Option<Found> {
        let from = from.min(hay.len());
        self.finder.find(&hay[from..]).map(|pos| Found {
            start: from + pos,
            end: from + pos + self.len,
            captures: Vec::new(),
        })
    }

    fn next_floor(&self, hay_len: usize) -> usize {
        // a failed scan rules out every start except where a suffix of the
        // buffer is a proper prefix of the pattern
        hay_len.saturating_sub(self.len.saturating_sub(1))
    }
}

/// Regex matcher over raw bytes.
///
/// Matching on bytes rather than `&str` keeps a partial UTF-8 sequence at
/// the end of the buffer from suppressing matches earlier in the window.
pub(crate) struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    pub(crate) fn new(regex: Regex) -> Self {
        Self { regex }
    }
}

impl Matcher for RegexMatcher {
    fn find(&self, hay: &[u8], from: usize) -> Option<Found> {
        let captures = self.regex.captures_at(hay, from.min(hay.len()))?;
        let full = captures.get(0)?;

        let capture_strings = captures
            .iter()
            .flatten()
            .map(|c| String::from_utf8_lossy(c.as_bytes()).into_owned())
            .collect();

        Some(Found {
            start: full.start(),
            end: full.end(),
            captures: capture_strings,
        })
    }

    // A regex that fails over the current window may still match starting
    // anywhere once more data arrives, so no position can be excluded.
}
