//! Error types for uexpect

use std::time::Duration;
use thiserror::Error;

/// Errors returned by session operations.
///
/// Failures that interrupt an `expect` (`Timeout`, `UnexpectedEof`,
/// `BufferOverflow`) carry the unmatched buffer contents in `before` so the
/// caller can see why a pattern did not match.
///
/// # Examples
///
/// ```no_run
/// use uexpect::{Error, Pattern, Session};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(5))
///     .spawn_command("some-command")?;
///
/// match session.expect(Pattern::exact("done")).await {
///     Ok(result) => println!("Matched: {}", result.matched),
///     Err(Error::Timeout { duration, before }) => {
///         eprintln!("No match after {duration:?}; saw: {before:?}");
///     }
///     Err(e) => return Err(e.into()),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The process could not be started.
    ///
    /// Fatal for the session; nothing was spawned. Not retried automatically.
    #[error("Failed to spawn process: {0}")]
    Spawn(String),

    /// PTY allocation or manipulation failed.
    #[error("PTY error: {0}")]
    Pty(String),

    /// Read or write failure on a live transport.
    ///
    /// The session remains usable unless the transport is confirmed broken.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pattern could not be compiled.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    /// Output could not be decoded under [`Encoding::Utf8Strict`].
    ///
    /// [`Encoding::Utf8Strict`]: crate::Encoding::Utf8Strict
    #[error("Invalid UTF-8 in output: {0}")]
    Decode(#[source] std::str::Utf8Error),

    /// No pattern matched within the timeout.
    ///
    /// Recoverable: the buffer is left unconsumed and the caller may retry
    /// `expect`. Declaring [`Pattern::Timeout`](crate::Pattern::Timeout)
    /// turns this into a normal match instead.
    #[error("Timeout waiting for pattern (after {duration:?})")]
    Timeout {
        /// Duration waited before giving up.
        duration: Duration,
        /// Unmatched buffer contents at expiry.
        before: String,
    },

    /// The process ended before any pattern matched.
    ///
    /// Returned when no [`Pattern::Eof`](crate::Pattern::Eof) matcher was
    /// registered. Session-terminal: no further output will arrive.
    #[error("Process ended before pattern matched")]
    UnexpectedEof {
        /// Buffer contents drained before end of stream.
        before: String,
    },

    /// Output exceeded the configured buffer limit before matching.
    ///
    /// The oldest bytes beyond the limit were discarded; widen the limit or
    /// refine the patterns.
    #[error("Output exceeded buffer limit of {limit} bytes")]
    BufferOverflow {
        /// The configured limit.
        limit: usize,
        /// The retained (newest) buffer contents.
        before: String,
    },

    /// Another `expect` is already in flight on this session.
    ///
    /// Caller error; the call fails immediately and is never queued.
    #[error("Another expect is in flight on this session")]
    SessionBusy,

    /// The session was closed.
    ///
    /// Returned by operations attempted after `close`, and by an in-flight
    /// `expect` when the session is closed underneath it.
    #[error("Session is closed")]
    SessionClosed,
}

/// Errors from pattern compilation.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Invalid regex syntax.
    #[error("Invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// Literal patterns must be non-empty.
    #[error("Pattern cannot be empty")]
    EmptyPattern,
}
