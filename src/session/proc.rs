//! Process ownership: PTY endpoints, lifecycle tracking, raw I/O

use crate::result::Error;
use portable_pty::{native_pty_system, Child, CommandBuilder, PtyPair, PtySize};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const READ_CHUNK: usize = 4096;
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of a controlled process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Spawned, not yet observed running.
    Starting,
    /// Alive at the last poll.
    Running,
    /// Exited on its own with this code.
    Exited(u32),
    /// Ended by a signal this session delivered.
    Signaled(i32),
    /// The session was closed and its OS handles released.
    Closed,
}

impl LifecycleState {
    /// Whether the process may still produce output.
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    /// Whether this state is final.
    pub fn is_terminal(&self) -> bool {
        !self.is_alive()
    }
}

/// Signals deliverable via [`Session::terminate`](crate::Session::terminate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGHUP.
    Hangup,
    /// SIGTERM.
    Terminate,
    /// SIGKILL, non-catchable.
    Kill,
}

impl Signal {
    pub(crate) const fn number(self) -> i32 {
        match self {
            Self::Hangup => 1,
            Self::Interrupt => 2,
            Self::Kill => 9,
            Self::Terminate => 15,
        }
    }
}

/// Everything needed to start a process under a PTY.
pub(crate) struct SpawnSpec {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(String, String)>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) pty_size: PtySize,
}

struct StateCell {
    current: LifecycleState,
    /// Signal number we delivered, if any; used to classify the exit.
    delivered: Option<i32>,
}

/// Exclusive owner of one spawned process and its PTY endpoints.
///
/// A dedicated blocking thread drains the PTY master into a bounded channel
/// of chunks the moment they arrive, so a timed-out `expect` never loses
/// the read it abandoned.
pub(crate) struct ProcessHandle {
    pty: StdMutex<Option<PtyPair>>,
    child: StdMutex<Option<Box<dyn Child + Send>>>,
    writer: Arc<tokio::sync::Mutex<Option<Box<dyn Write + Send>>>>,
    state: StdMutex<StateCell>,
    pid: Option<u32>,
}

impl ProcessHandle {
    /// Allocate a PTY pair, spawn the command attached to its slave side,
    /// and start the reader thread. Returns the handle and the receiving
    /// end of the output stream.
    pub(crate) fn spawn(
        spec: SpawnSpec,
    ) -> Result<(Self, mpsc::Receiver<std::io::Result<Vec<u8>>>), Error> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(spec.pty_size)
            .map_err(|e| Error::Pty(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&spec.program);
        cmd.args(&spec.args);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &spec.cwd {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::Spawn(e.to_string()))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Pty(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::Pty(e.to_string()))?;

        let pid = child.process_id();
        tracing::debug!(program = %spec.program, pid = ?pid, "spawned process");

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        // detached; it exits when the stream ends or the receiver is dropped
        let _ = std::thread::Builder::new()
            .name("uexpect-reader".into())
            .spawn(move || read_loop(reader, tx))
            .map_err(Error::Io)?;

        let handle = Self {
            pty: StdMutex::new(Some(pair)),
            child: StdMutex::new(Some(child)),
            writer: Arc::new(tokio::sync::Mutex::new(Some(writer))),
            state: StdMutex::new(StateCell {
                current: LifecycleState::Starting,
                delivered: None,
            }),
            pid,
        };
        Ok((handle, rx))
    }

    /// Write the full payload and flush. Partial writes are retried by
    /// `write_all`; a broken pipe surfaces as `Error::Io`.
    pub(crate) async fn write_all(&self, data: &[u8]) -> Result<(), Error> {
        let writer = Arc::clone(&self.writer);
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut guard = writer.blocking_lock();
            match guard.as_mut() {
                None => Err(Error::SessionClosed),
                Some(w) => {
                    w.write_all(&data)?;
                    w.flush()?;
                    Ok(())
                }
            }
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    /// Non-blocking lifecycle check; reaps the child if it has exited.
    pub(crate) fn poll(&self) -> LifecycleState {
        let mut state = self.state.lock().unwrap();
        if state.current.is_terminal() {
            return state.current;
        }

        let mut child = self.child.lock().unwrap();
        let next = match child.as_mut() {
            None => LifecycleState::Closed,
            Some(child) => match child.try_wait() {
                Ok(None) => LifecycleState::Running,
                Ok(Some(status)) => match state.delivered {
                    Some(sig) if !status.success() => LifecycleState::Signaled(sig),
                    _ => LifecycleState::Exited(status.exit_code()),
                },
                // keep the last known state on a failed wait
                Err(_) => state.current,
            },
        };
        state.current = next;
        next
    }

    /// Deliver a signal to the process.
    pub(crate) fn terminate(&self, signal: Signal) -> Result<(), Error> {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            // SAFETY: plain syscall on a pid we spawned and still track
            let rc = unsafe { libc::kill(pid as libc::pid_t, signal.number()) };
            if rc != 0 {
                return Err(Error::Io(std::io::Error::last_os_error()));
            }
            self.record_delivery(signal);
            tracing::debug!(pid, signal = signal.number(), "delivered signal");
            return Ok(());
        }

        let mut child = self.child.lock().unwrap();
        if let Some(child) = child.as_mut() {
            child.kill()?;
            self.record_delivery(Signal::Kill);
        }
        Ok(())
    }

    fn record_delivery(&self, signal: Signal) {
        let mut state = self.state.lock().unwrap();
        state.delivered.get_or_insert(signal.number());
    }

    /// Signal EOF on the input side, give the process `grace` to exit,
    /// escalate to kill, and release the OS handles. Safe to call twice.
    pub(crate) async fn close(&self, grace: Duration, poll_interval: Duration) {
        self.writer.lock().await.take();

        let deadline = Instant::now() + grace;
        let mut killed = false;
        while self.poll().is_alive() {
            if !killed && Instant::now() >= deadline {
                tracing::debug!(pid = ?self.pid, "grace period expired, killing process");
                if let Err(e) = self.terminate(Signal::Kill) {
                    tracing::warn!(error = %e, "failed to kill process on close");
                    break;
                }
                killed = true;
            }
            tokio::time::sleep(poll_interval).await;
        }

        self.pty.lock().unwrap().take();
        self.child.lock().unwrap().take();
        self.state.lock().unwrap().current = LifecycleState::Closed;
        tracing::debug!(pid = ?self.pid, "session closed");
    }
}

fn read_loop(mut reader: Box<dyn Read + Send>, tx: mpsc::Sender<std::io::Result<Vec<u8>>>) {
    loop {
        let mut chunk = vec![0u8; READ_CHUNK];
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                chunk.truncate(n);
                if tx.blocking_send(Ok(chunk)).is_err() {
                    // session dropped the receiver
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_numbers() {
        assert_eq!(Signal::Hangup.number(), 1);
        assert_eq!(Signal::Interrupt.number(), 2);
        assert_eq!(Signal::Kill.number(), 9);
        assert_eq!(Signal::Terminate.number(), 15);
    }

    #[test]
    fn lifecycle_classification() {
        assert!(LifecycleState::Starting.is_alive());
        assert!(LifecycleState::Running.is_alive());
        assert!(LifecycleState::Exited(0).is_terminal());
        assert!(LifecycleState::Signaled(9).is_terminal());
        assert!(LifecycleState::Closed.is_terminal());
    }
}
