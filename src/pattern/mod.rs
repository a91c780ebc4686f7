//! Pattern types for expect operations

pub(crate) mod matcher;
pub(crate) mod set;

use crate::result::PatternError;
use regex::bytes::Regex;

/// What an `expect` call can wait for.
///
/// The matcher kinds form a closed set and are handled exhaustively:
///
/// - **Exact / Bytes**: literal sequences, found at their earliest
///   occurrence with `memchr`-backed substring search.
/// - **Regex**: a compiled regular expression, evaluated against the raw
///   byte window (capture groups are reported in the
///   [`MatchResult`](crate::MatchResult)).
/// - **Eof**: resolves when the process has exited and every buffered byte
///   has been drained.
/// - **Timeout**: resolves when the call's deadline expires, turning what
///   would be a [`Timeout`](crate::Error::Timeout) error into a match.
///
/// # Examples
///
/// ```
/// use uexpect::Pattern;
///
/// let prompt = Pattern::exact("password: ");
/// let number = Pattern::regex(r"\d+").unwrap();
/// let ctrl = Pattern::bytes([0x07]);
/// let done = Pattern::Eof;
/// ```
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Literal string match.
    Exact(String),

    /// Literal byte-sequence match, for output that is not text.
    Bytes(Vec<u8>),

    /// Regular expression match over the raw output bytes.
    Regex(Regex),

    /// Matches once the process has exited and all output is drained.
    Eof,

    /// Matches when the expect deadline expires; the buffer is left
    /// unconsumed, exactly as for the `Timeout` error.
    Timeout,
}

impl Pattern {
    /// Literal string pattern. The cheapest kind; prefer it when the
    /// expected output is known exactly.
    ///
    /// ```
    /// use uexpect::Pattern;
    ///
    /// let pattern = Pattern::exact("$ ");
    /// ```
    pub fn exact(s: impl Into<String>) -> Self {
        Pattern::Exact(s.into())
    }

    /// Literal byte-sequence pattern.
    pub fn bytes(b: impl Into<Vec<u8>>) -> Self {
        Pattern::Bytes(b.into())
    }

    /// Regex pattern over the output bytes.
    ///
    /// # Errors
    ///
    /// Fails if the expression does not compile.
    ///
    /// ```
    /// use uexpect::Pattern;
    ///
    /// let pattern = Pattern::regex(r"login: $").unwrap();
    /// let case_insensitive = Pattern::regex(r"(?i)warning").unwrap();
    /// ```
    pub fn regex(pattern: &str) -> Result<Self, PatternError> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Whether this is a sentinel resolved by stream state or the deadline
    /// rather than by buffer contents.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Pattern::Eof | Pattern::Timeout)
    }
}
