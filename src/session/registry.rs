//! Explicit session tracking for cleanup-on-exit

use crate::session::{Session, SessionInner};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// An explicit collection of weak session back-references.
///
/// For callers juggling several sessions that must not outlive a scope
/// (test harnesses, fixtures): register each session, then `close_all`
/// during teardown. Holding only weak references, the registry never keeps
/// a session alive, and a session dropped elsewhere simply disappears on
/// the next [`prune`](Self::prune).
///
/// # Examples
///
/// ```no_run
/// use uexpect::{Session, SessionRegistry};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = SessionRegistry::new();
///
/// let shell = Session::spawn("bash")?;
/// registry.register(&shell);
///
/// // ... drive the sessions ...
///
/// registry.close_all().await;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SessionRegistry {
    entries: Mutex<HashMap<u64, Weak<SessionInner>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a session by its id.
    pub fn register(&self, session: &Session) {
        self.entries
            .lock()
            .unwrap()
            .insert(session.id(), Arc::downgrade(&session.inner));
    }

    /// Stop tracking a session. Returns whether it was registered.
    pub fn unregister(&self, session: &Session) -> bool {
        self.entries.lock().unwrap().remove(&session.id()).is_some()
    }

    /// Drop entries whose sessions are gone.
    pub fn prune(&self) {
        self.entries
            .lock()
            .unwrap()
            .retain(|_, weak| weak.strong_count() > 0);
    }

    /// Number of tracked entries (including stale ones; call
    /// [`prune`](Self::prune) first for a live count).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether the registry tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Close every still-living registered session and clear the registry.
    pub async fn close_all(&self) {
        let sessions: Vec<Session> = {
            let mut entries = self.entries.lock().unwrap();
            entries
                .drain()
                .filter_map(|(_, weak)| weak.upgrade().map(|inner| Session { inner }))
                .collect()
        };

        for session in sessions {
            session.close().await;
        }
    }
}
