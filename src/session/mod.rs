//! Session management for PTY-based process automation

mod builder;
mod engine;
mod proc;
mod registry;

pub use builder::SessionBuilder;
pub use proc::{LifecycleState, Signal};
pub use registry::SessionRegistry;

use crate::encoding::Encoding;
use crate::pattern::set::CompiledSet;
use crate::pattern::Pattern;
use crate::result::{Error, MatchResult};
use engine::ExpectEngine;
use proc::{ProcessHandle, SpawnSpec};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct RuntimeConfig {
    pub(crate) timeout: Option<Duration>,
    pub(crate) buffer_limit: usize,
    pub(crate) encoding: Encoding,
    pub(crate) close_grace_period: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) strip_ansi: bool,
    pub(crate) line_separator: String,
}

struct SessionInner {
    id: u64,
    created_at: Instant,
    proc: ProcessHandle,
    engine: Mutex<ExpectEngine>,
    /// One expect in flight per session; CAS-guarded, never queued.
    busy: AtomicBool,
    /// Set first by `close` so an in-flight expect resolves promptly.
    closed: AtomicBool,
    config: RuntimeConfig,
}

/// A running process with an attached PTY.
///
/// Provides the expect/send contract: write input, wait for output
/// patterns with bounded timeouts, observe the process lifecycle. The
/// handle is cheaply cloneable; all clones drive the same process, so one
/// task can `close` a session while another is inside `expect` (the
/// expect resolves with [`Error::SessionClosed`]).
///
/// Only one `expect` may be in flight at a time; a concurrent call fails
/// immediately with [`Error::SessionBusy`]. Sending is an independent
/// path and is permitted while an expect is pending.
///
/// # Examples
///
/// ```no_run
/// use uexpect::{Session, Pattern};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(30))
///     .arg("-i")
///     .spawn("python3")?;
///
/// session.expect(Pattern::exact(">>> ")).await?;
/// session.send_line("print('Hello')").await?;
/// let result = session.expect(Pattern::exact(">>> ")).await?;
/// println!("Output: {}", result.before);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create a session builder. The recommended entry point; see
    /// [`SessionBuilder`] for the configuration surface.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Spawn a whitespace-split command line with default configuration.
    ///
    /// Shorthand for `Session::builder().spawn_command(command)`.
    ///
    /// ```no_run
    /// use uexpect::Session;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::spawn("cat -u")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(command: &str) -> Result<Self, Error> {
        SessionBuilder::new().spawn_command(command)
    }

    pub(crate) fn spawn_with(spec: SpawnSpec, config: RuntimeConfig) -> Result<Self, Error> {
        let (proc, chunks) = ProcessHandle::spawn(spec)?;
        let engine = ExpectEngine::new(
            chunks,
            config.buffer_limit,
            config.strip_ansi,
            config.encoding,
            config.poll_interval,
        );

        let inner = SessionInner {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            created_at: Instant::now(),
            proc,
            engine: Mutex::new(engine),
            busy: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            config,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Send raw bytes to the process.
    ///
    /// The payload is written in full and flushed; the call may block
    /// briefly on OS pipe backpressure. Control characters go through
    /// verbatim:
    ///
    /// ```no_run
    /// use uexpect::Session;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let session = Session::spawn("bash")?;
    /// session.send(&[0x03]).await?;        // Ctrl-C
    /// session.send(b"\x1b[A").await?;      // up arrow
    /// session.send(b"password\r").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(&self, data: &[u8]) -> Result<(), Error> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::SessionClosed);
        }
        self.inner.proc.write_all(data).await
    }

    /// Send text followed by the configured line separator.
    pub async fn send_line(&self, line: &str) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(self.inner.config.line_separator.as_bytes());
        self.send(&payload).await
    }

    /// Wait for a single pattern using the session's default timeout.
    ///
    /// Resolves with a [`MatchResult`] whose `before` field holds
    /// everything that preceded the match; match and preceding bytes are
    /// consumed, trailing bytes stay for the next call.
    pub async fn expect(&self, pattern: Pattern) -> Result<MatchResult, Error> {
        self.expect_any(std::slice::from_ref(&pattern)).await
    }

    /// Wait for any of the given patterns.
    ///
    /// Priority follows the earliest starting offset in the output; among
    /// equal offsets, declaration order wins. `pattern_index` on the
    /// result tells which pattern resolved.
    ///
    /// ```no_run
    /// use uexpect::{Session, Pattern};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let session = Session::spawn("some-job")?;
    /// let patterns = [
    ///     Pattern::exact("success"),
    ///     Pattern::exact("error"),
    ///     Pattern::Eof,
    /// ];
    /// let result = session.expect_any(&patterns).await?;
    /// match result.pattern_index {
    ///     0 => println!("Success!"),
    ///     1 => println!("Failed: {}", result.before),
    ///     2 => println!("Process ended"),
    ///     _ => unreachable!(),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn expect_any(&self, patterns: &[Pattern]) -> Result<MatchResult, Error> {
        self.expect_any_with_timeout(patterns, self.inner.config.timeout)
            .await
    }

    /// [`expect`](Self::expect) with a per-call timeout override.
    pub async fn expect_with_timeout(
        &self,
        pattern: Pattern,
        timeout: Option<Duration>,
    ) -> Result<MatchResult, Error> {
        self.expect_any_with_timeout(std::slice::from_ref(&pattern), timeout)
            .await
    }

    /// [`expect_any`](Self::expect_any) with a per-call timeout override.
    /// `None` waits indefinitely.
    pub async fn expect_any_with_timeout(
        &self,
        patterns: &[Pattern],
        timeout: Option<Duration>,
    ) -> Result<MatchResult, Error> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::SessionClosed);
        }
        let mut set = CompiledSet::compile(patterns)?;

        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::SessionBusy);
        }
        let _busy = BusyGuard(&self.inner.busy);

        let mut engine = self.inner.engine.lock().await;
        engine
            .run(&mut set, timeout, &self.inner.closed, &self.inner.proc)
            .await
    }

    /// Current lifecycle state. Non-blocking.
    pub fn status(&self) -> LifecycleState {
        if self.inner.closed.load(Ordering::Acquire) {
            return LifecycleState::Closed;
        }
        self.inner.proc.poll()
    }

    /// Whether the process may still produce output.
    pub fn is_alive(&self) -> bool {
        self.status().is_alive()
    }

    /// Deliver a signal to the process.
    pub fn terminate(&self, signal: Signal) -> Result<(), Error> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(Error::SessionClosed);
        }
        self.inner.proc.terminate(signal)
    }

    /// Block until the process reaches a terminal state and return it.
    pub async fn wait(&self) -> Result<LifecycleState, Error> {
        loop {
            let state = self.status();
            if state.is_terminal() {
                return Ok(state);
            }
            tokio::time::sleep(self.inner.config.poll_interval).await;
        }
    }

    /// Close the session: shut the input side, give the process the
    /// configured grace period to exit, escalate to a kill, and release
    /// the OS handles.
    ///
    /// Idempotent; closing an already-closed session is a no-op. An
    /// in-flight `expect` on another clone of this handle resolves with
    /// [`Error::SessionClosed`] within one poll quantum.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner
            .proc
            .close(
                self.inner.config.close_grace_period,
                self.inner.config.poll_interval,
            )
            .await;
    }

    /// Unique id of this session within the process.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// When the session was spawned.
    pub fn created_at(&self) -> Instant {
        self.inner.created_at
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
