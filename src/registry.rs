use crate::message::Message;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::UnboundedSender;

pub type SessionId = u64;

/// Shared state for all live sessions: the reserved-username set and each
/// active session's outbound queue handle. Constructed once by the server and
/// handed to every session task behind an `Arc`, never reachable as a global.
pub struct Registry {
    next_id: AtomicU64,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    live: HashMap<SessionId, UnboundedSender<Message>>,
    reserved: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            next_id: AtomicU64::new(0),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn next_session_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Claims `username` for one session. The membership check and the insert
    /// are a single step under the lock, so two logins racing on the same
    /// name can never both succeed.
    pub fn try_reserve(&self, username: &str) -> bool {
        self.lock().reserved.insert(username.to_string())
    }

    /// Idempotent; releasing a name that was never reserved is a no-op.
    pub fn release(&self, username: &str) {
        self.lock().reserved.remove(username);
    }

    pub fn add_live(&self, id: SessionId, sender: UnboundedSender<Message>) {
        self.lock().live.insert(id, sender);
    }

    /// Idempotent; removing an absent session is a no-op.
    pub fn remove_live(&self, id: SessionId) {
        self.lock().live.remove(&id);
    }

    /// Calls `f` with every live session's outbound sender except the
    /// originator's. Runs under the lock over non-blocking sends only, so the
    /// iteration is a consistent snapshot and never waits on a recipient.
    pub fn for_each_live_except(
        &self,
        sender_id: SessionId,
        mut f: impl FnMut(&UnboundedSender<Message>),
    ) {
        let inner = self.lock();
        for (id, tx) in &inner.live {
            if *id != sender_id {
                f(tx);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoning panic cannot leave the maps half-updated; keep serving.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
