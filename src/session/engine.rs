//! The expect state machine: reads, evaluation, deadlines

use crate::buffer::OutputBuffer;
use crate::encoding::Encoding;
use crate::pattern::set::CompiledSet;
use crate::result::{Error, MatchResult};
use crate::session::proc::ProcessHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    AwaitingPattern,
    Resolved,
    TimedOut,
    StreamClosed,
}

/// Drives one session's output stream against pattern sets.
///
/// Owns the output buffer and the receiving end of the reader thread's
/// chunk channel. Within a session everything here runs sequentially
/// inside the `expect` call; the caller's busy flag guarantees no two
/// cycles overlap.
pub(crate) struct ExpectEngine {
    buffer: OutputBuffer,
    chunks: mpsc::Receiver<std::io::Result<Vec<u8>>>,
    eof: bool,
    state: EngineState,
    encoding: Encoding,
    poll_interval: Duration,
}

impl ExpectEngine {
    pub(crate) fn new(
        chunks: mpsc::Receiver<std::io::Result<Vec<u8>>>,
        buffer_limit: usize,
        strip_ansi: bool,
        encoding: Encoding,
        poll_interval: Duration,
    ) -> Self {
        Self {
            buffer: OutputBuffer::new(buffer_limit, strip_ansi),
            chunks,
            eof: false,
            state: EngineState::Idle,
            encoding,
            poll_interval,
        }
    }

    /// Run one expect cycle to resolution.
    ///
    /// Each iteration: check for cancellation, scan the buffer, then the
    /// overflow / end-of-stream / deadline conditions, and finally await
    /// the next chunk for at most one poll quantum so cancellation and the
    /// deadline are observed promptly. The deadline is never overshot by
    /// more than one quantum.
    pub(crate) async fn run(
        &mut self,
        set: &mut CompiledSet,
        timeout: Option<Duration>,
        closed: &AtomicBool,
        proc: &ProcessHandle,
    ) -> Result<MatchResult, Error> {
        self.transition(EngineState::AwaitingPattern);
        let started = Instant::now();

        loop {
            if closed.load(Ordering::Acquire) {
                return self.finish(EngineState::StreamClosed, Err(Error::SessionClosed));
            }

            if let Some(candidate) = set.evaluate(self.buffer.view()) {
                let view = self.buffer.view();
                let matched = self.encoding.decode(&view[candidate.start..candidate.end])?;
                let before = self.encoding.decode(&view[..candidate.start])?;
                let result = MatchResult {
                    pattern_index: candidate.index,
                    matched,
                    start: candidate.start,
                    end: candidate.end,
                    before,
                    captures: candidate.captures,
                };
                self.buffer.consume(candidate.end);
                return self.finish(EngineState::Resolved, Ok(result));
            }

            if self.buffer.take_overflow() {
                let before = self.decode_view()?;
                return self.finish(
                    EngineState::Idle,
                    Err(Error::BufferOverflow {
                        limit: self.buffer.limit(),
                        before,
                    }),
                );
            }

            if self.eof {
                let before = self.decode_view()?;
                return match set.eof_index() {
                    Some(index) => {
                        let end = self.buffer.len();
                        self.buffer.consume(end);
                        self.finish(
                            EngineState::Resolved,
                            Ok(MatchResult {
                                pattern_index: index,
                                matched: String::new(),
                                start: end,
                                end,
                                before,
                                captures: Vec::new(),
                            }),
                        )
                    }
                    None => self.finish(
                        EngineState::StreamClosed,
                        Err(Error::UnexpectedEof { before }),
                    ),
                };
            }

            let remaining = match timeout {
                Some(limit) => {
                    let elapsed = started.elapsed();
                    if elapsed >= limit {
                        let before = self.decode_view()?;
                        return match set.timeout_index() {
                            // the soft timeout: buffer stays unconsumed
                            Some(index) => {
                                let len = self.buffer.len();
                                self.finish(
                                    EngineState::Resolved,
                                    Ok(MatchResult {
                                        pattern_index: index,
                                        matched: String::new(),
                                        start: len,
                                        end: len,
                                        before,
                                        captures: Vec::new(),
                                    }),
                                )
                            }
                            None => self.finish(
                                EngineState::TimedOut,
                                Err(Error::Timeout {
                                    duration: limit,
                                    before,
                                }),
                            ),
                        };
                    }
                    Some(limit - elapsed)
                }
                None => None,
            };

            let wait = remaining.map_or(self.poll_interval, |r| r.min(self.poll_interval));
            match tokio::time::timeout(wait, self.chunks.recv()).await {
                // quantum elapsed; loop to re-check cancellation and deadline
                Err(_) => {}
                Ok(None) => self.eof = true,
                Ok(Some(Ok(chunk))) => {
                    let discarded = self.buffer.append(&chunk);
                    if discarded > 0 {
                        set.shift(discarded);
                    }
                }
                Ok(Some(Err(e))) => {
                    if proc.poll().is_alive() {
                        return self.finish(EngineState::StreamClosed, Err(Error::Io(e)));
                    }
                    // read errors after exit are the PTY's end-of-stream
                    tracing::trace!(error = %e, "read error after exit, treating as EOF");
                    self.eof = true;
                }
            }
        }
    }

    fn decode_view(&self) -> Result<String, Error> {
        self.encoding.decode(self.buffer.view())
    }

    fn finish(
        &mut self,
        terminal: EngineState,
        outcome: Result<MatchResult, Error>,
    ) -> Result<MatchResult, Error> {
        self.transition(terminal);
        self.transition(EngineState::Idle);
        outcome
    }

    fn transition(&mut self, next: EngineState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "engine transition");
            self.state = next;
        }
    }
}
