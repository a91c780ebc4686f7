//! Session configuration and spawning

use crate::encoding::Encoding;
use crate::result::Error;
use crate::session::proc::SpawnSpec;
use crate::session::{RuntimeConfig, Session};
use portable_pty::PtySize;
use std::path::PathBuf;
use std::time::Duration;

/// Default timeout for expect operations (in seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum output buffer size (in bytes)
const DEFAULT_BUFFER_LIMIT: usize = 8192;

/// Default grace period before close escalates to a kill (in seconds)
const DEFAULT_CLOSE_GRACE_SECS: u64 = 5;

/// Default engine poll quantum (in milliseconds)
const DEFAULT_POLL_INTERVAL_MS: u64 = 20;

/// Default PTY rows
const DEFAULT_PTY_ROWS: u16 = 24;

/// Default PTY columns
const DEFAULT_PTY_COLS: u16 = 80;

/// Builder for configuring and spawning sessions.
///
/// # Defaults
///
/// - Timeout: 30 seconds per expect
/// - Buffer limit: 8192 bytes
/// - Close grace period: 5 seconds
/// - Poll quantum: 20 ms
/// - Encoding: lossy UTF-8
/// - ANSI stripping: disabled
/// - Line separator: `"\n"`
/// - PTY size: 24 rows × 80 columns
///
/// # Examples
///
/// ```no_run
/// use uexpect::Session;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::builder()
///     .timeout(Duration::from_secs(60))
///     .buffer_limit(16384)
///     .strip_ansi(true)
///     .arg("-i")
///     .spawn("python3")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    timeout: Option<Duration>,
    buffer_limit: usize,
    encoding: Encoding,
    close_grace_period: Duration,
    poll_interval: Duration,
    strip_ansi: bool,
    pty_size: PtySize,
    line_separator: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            encoding: Encoding::default(),
            close_grace_period: Duration::from_secs(DEFAULT_CLOSE_GRACE_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            strip_ansi: false,
            pty_size: PtySize {
                rows: DEFAULT_PTY_ROWS,
                cols: DEFAULT_PTY_COLS,
                pixel_width: 0,
                pixel_height: 0,
            },
            line_separator: "\n".to_string(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    /// Default duration an `expect` waits before failing with
    /// [`Error::Timeout`](crate::Error::Timeout). Overridable per call via
    /// the `_with_timeout` variants.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely: `expect` only resolves by match or end of stream.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Maximum bytes of unmatched output retained. Growth past the limit
    /// discards the oldest bytes and surfaces
    /// [`Error::BufferOverflow`](crate::Error::BufferOverflow).
    pub fn buffer_limit(mut self, bytes: usize) -> Self {
        self.buffer_limit = bytes;
        self
    }

    /// How matched output decodes into `String`s; see [`Encoding`].
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// How long `close` waits for the process to exit after the input side
    /// is shut, before escalating to a kill.
    pub fn close_grace_period(mut self, grace: Duration) -> Self {
        self.close_grace_period = grace;
        self
    }

    /// The engine's poll quantum: the upper bound on how late a timeout or
    /// a cancellation is observed. Smaller is more precise, larger is
    /// cheaper while idle.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Remove ANSI escape sequences from output before matching.
    pub fn strip_ansi(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Terminal dimensions the process sees.
    pub fn pty_size(mut self, rows: u16, cols: u16) -> Self {
        self.pty_size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        self
    }

    /// The terminator [`Session::send_line`](crate::Session::send_line)
    /// appends. Programs reading a raw PTY often want `"\r"`.
    pub fn line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }

    /// Append one argument for the spawned program.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments for the spawned program.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the spawned program.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Working directory for the spawned program.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Spawn `program` (with any arguments given via [`arg`](Self::arg) /
    /// [`args`](Self::args)) attached to a fresh PTY.
    ///
    /// # Errors
    ///
    /// [`Error::Pty`] if the PTY cannot be allocated, [`Error::Spawn`] if
    /// the executable cannot be resolved or the OS spawn call fails.
    pub fn spawn(self, program: impl Into<String>) -> Result<Session, Error> {
        let program = program.into();
        if program.is_empty() {
            return Err(Error::Spawn("empty command".to_string()));
        }

        let spec = SpawnSpec {
            program,
            args: self.args.clone(),
            env: self.env.clone(),
            cwd: self.cwd.clone(),
            pty_size: self.pty_size,
        };
        Session::spawn_with(
            spec,
            RuntimeConfig {
                timeout: self.timeout,
                buffer_limit: self.buffer_limit,
                encoding: self.encoding,
                close_grace_period: self.close_grace_period,
                poll_interval: self.poll_interval,
                strip_ansi: self.strip_ansi,
                line_separator: self.line_separator,
            },
        )
    }

    /// Split a command line on whitespace and spawn it: the first token is
    /// the program, the rest are arguments (no shell quoting).
    ///
    /// ```no_run
    /// use uexpect::Session;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let session = Session::builder().spawn_command("python3 -i")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn_command(self, command: &str) -> Result<Session, Error> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| Error::Spawn("empty command".to_string()))?
            .to_string();
        self.args(parts).spawn(program)
    }
}
