//! Result types for expect operations

mod error;

pub use error::{Error, PatternError};

/// Result of a successful pattern match.
///
/// Carries which pattern matched, the exact matched byte range, and the
/// buffer contents preceding the match. After an `expect` resolves, the
/// match and everything before it are consumed from the session's output
/// buffer; bytes after the match remain for the next call.
///
/// # Examples
///
/// ```no_run
/// use uexpect::{Session, Pattern};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let session = Session::spawn("sh")?;
/// session.send_line("uptime").await?;
/// let result = session.expect(Pattern::exact("$ ")).await?;
///
/// // result.before holds the command output that preceded the prompt
/// println!("{}", result.before);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Index of the pattern that matched (0-based, into the set passed to
    /// `expect_any`; always 0 for single-pattern `expect`).
    pub pattern_index: usize,

    /// The matched text.
    pub matched: String,

    /// Start of the matched range (byte offset into the buffer as it stood
    /// when the match resolved).
    pub start: usize,

    /// End of the matched range (exclusive byte offset).
    pub end: usize,

    /// Everything that appeared before the match.
    ///
    /// For prompt-driven programs this is usually the interesting part: the
    /// output emitted between the previous match and this one.
    pub before: String,

    /// Capture groups, for regex patterns.
    ///
    /// Index 0 is the full match, then one entry per group. Empty for
    /// literal patterns and sentinels.
    pub captures: Vec<String>,
}
