//! Byte-to-text decoding for match results and error payloads

use crate::result::Error;

/// How raw process output decodes into the `String`s carried by
/// [`MatchResult`](crate::MatchResult) and error payloads.
///
/// Matching itself always runs over raw bytes; the mode only affects
/// decoding of the matched/before ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Replace invalid UTF-8 sequences with U+FFFD. The default.
    #[default]
    Utf8Lossy,

    /// Reject invalid UTF-8 with [`Error::Decode`].
    Utf8Strict,
}

impl Encoding {
    pub(crate) fn decode(self, bytes: &[u8]) -> Result<String, Error> {
        match self {
            Self::Utf8Lossy => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Self::Utf8Strict => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(Error::Decode),
        }
    }
}
