//! Compiled ordered pattern sets

use crate::pattern::matcher::{LiteralMatcher, Matcher, RegexMatcher};
use crate::pattern::Pattern;
use crate::result::PatternError;

/// The winning matcher from one evaluation pass.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub(crate) index: usize,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) captures: Vec<String>,
}

struct Entry {
    index: usize,
    matcher: Box<dyn Matcher>,
    floor: usize,
}

/// One `expect` call's patterns, compiled and ordered.
///
/// Sentinels (`Eof`, `Timeout`) carry no matcher; the engine resolves them
/// from stream state and the deadline. Among content matchers the earliest
/// starting offset wins; equal offsets fall back to declaration order.
pub(crate) struct CompiledSet {
    entries: Vec<Entry>,
    eof_index: Option<usize>,
    timeout_index: Option<usize>,
}

impl CompiledSet {
    pub(crate) fn compile(patterns: &[Pattern]) -> Result<Self, PatternError> {
        let mut entries = Vec::new();
        let mut eof_index = None;
        let mut timeout_index = None;

        for (index, pattern) in patterns.iter().enumerate() {
            match pattern {
                Pattern::Exact(s) => {
                    if s.is_empty() {
                        return Err(PatternError::EmptyPattern);
                    }
                    entries.push(Entry {
                        index,
                        matcher: Box::new(LiteralMatcher::new(s.as_bytes())),
                        floor: 0,
                    });
                }
                Pattern::Bytes(b) => {
                    if b.is_empty() {
                        return Err(PatternError::EmptyPattern);
                    }
                    entries.push(Entry {
                        index,
                        matcher: Box::new(LiteralMatcher::new(b)),
                        floor: 0,
                    });
                }
                Pattern::Regex(r) => entries.push(Entry {
                    index,
                    matcher: Box::new(RegexMatcher::new(r.clone())),
                    floor: 0,
                }),
                Pattern::Eof => {
                    eof_index.get_or_insert(index);
                }
                Pattern::Timeout => {
                    timeout_index.get_or_insert(index);
                }
            }
        }

        Ok(Self {
            entries,
            eof_index,
            timeout_index,
        })
    }

    /// Scan the buffer window; `None` means no matcher currently satisfies
    /// and the engine should keep reading.
    pub(crate) fn evaluate(&mut self, hay: &[u8]) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;

        for entry in &mut self.entries {
            match entry.matcher.find(hay, entry.floor) {
                Some(found) => {
                    // strictly-earlier only: declaration order breaks ties
                    if best.as_ref().map_or(true, |b| found.start < b.start) {
                        best = Some(Candidate {
                            index: entry.index,
                            start: found.start,
                            end: found.end,
                            captures: found.captures,
                        });
                    }
                }
                None => entry.floor = entry.matcher.next_floor(hay.len()),
            }
        }

        best
    }

    /// Rebase scan floors after the buffer discarded `n` leading bytes.
    pub(crate) fn shift(&mut self, n: usize) {
        for entry in &mut self.entries {
            entry.floor = entry.floor.saturating_sub(n);
        }
    }

    pub(crate) fn eof_index(&self) -> Option<usize> {
        self.eof_index
    }

    pub(crate) fn timeout_index(&self) -> Option<usize> {
        self.timeout_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earliest_offset_wins_across_patterns() {
        // "later" is declared first but "early" starts sooner
        let mut set = CompiledSet::compile(&[
            Pattern::exact("later"),
            Pattern::exact("early"),
        ])
        .unwrap();

        let candidate = set.evaluate(b"xx early then later").unwrap();
        assert_eq!(candidate.index, 1);
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // both match at offset 0; the first declared must win
        let mut set = CompiledSet::compile(&[
            Pattern::exact("abc"),
            Pattern::exact("abcdef"),
        ])
        .unwrap();

        let candidate = set.evaluate(b"abcdef").unwrap();
        assert_eq!(candidate.index, 0);
        assert_eq!((candidate.start, candidate.end), (0, 3));
    }

    #[test]
    fn no_match_yet_is_not_an_error() {
        let mut set = CompiledSet::compile(&[Pattern::exact("prompt")]).unwrap();
        assert!(set.evaluate(b"nothing here").is_none());
    }

    #[test]
    fn incremental_floor_does_not_miss_boundary_match() {
        let mut set = CompiledSet::compile(&[Pattern::exact("password:")]).unwrap();

        assert!(set.evaluate(b"Please enter pass").is_none());
        // pattern completes across the read boundary
        let candidate = set.evaluate(b"Please enter password: ").unwrap();
        assert_eq!((candidate.start, candidate.end), (13, 22));
    }

    #[test]
    fn shift_rebases_floors() {
        let mut set = CompiledSet::compile(&[Pattern::exact("marker")]).unwrap();
        assert!(set.evaluate(b"0123456789").is_none());

        // buffer dropped 4 leading bytes; the same data now sits 4 earlier
        set.shift(4);
        let candidate = set.evaluate(b"456789marker").unwrap();
        assert_eq!(candidate.start, 6);
    }

    #[test]
    fn sentinels_are_recorded_not_matched() {
        let mut set = CompiledSet::compile(&[
            Pattern::exact("done"),
            Pattern::Eof,
            Pattern::Timeout,
        ])
        .unwrap();

        assert_eq!(set.eof_index(), Some(1));
        assert_eq!(set.timeout_index(), Some(2));
        assert!(set.evaluate(b"nothing").is_none());
    }

    #[test]
    fn first_sentinel_declaration_wins() {
        let set = CompiledSet::compile(&[Pattern::Eof, Pattern::Eof]).unwrap();
        assert_eq!(set.eof_index(), Some(0));
    }

    #[test]
    fn empty_literal_rejected() {
        assert!(matches!(
            CompiledSet::compile(&[Pattern::exact("")]),
            Err(PatternError::EmptyPattern)
        ));
        assert!(matches!(
            CompiledSet::compile(&[Pattern::bytes([])]),
            Err(PatternError::EmptyPattern)
        ));
    }

    #[test]
    fn regex_beats_later_literal_at_same_offset() {
        let mut set = CompiledSet::compile(&[
            Pattern::regex(r"\d+").unwrap(),
            Pattern::exact("42"),
        ])
        .unwrap();

        let candidate = set.evaluate(b"code 42").unwrap();
        assert_eq!(candidate.index, 0);
    }
}
