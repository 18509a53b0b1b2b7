use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use super::state::SessionState;

pub type SessionId = Uuid;

/// Where per-session state lives between actions.
pub trait SessionStore: Send + Sync {
    fn create(&self) -> SessionId;
    fn load(&self, id: &SessionId) -> Option<SessionState>;
    /// Returns `false` when the session no longer exists.
    fn save(&self, id: &SessionId, state: SessionState) -> bool;
    fn remove(&self, id: &SessionId) -> bool;
}

#[derive(Debug)]
struct Entry {
    state: SessionState,
    touched: Instant,
}

/// In-process store. With an idle TTL, sessions untouched for that long are
/// dropped the next time a session is created.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Entry>>,
    idle_ttl: Option<Duration>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            idle_ttl: Some(idle_ttl),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_idle(&self, sessions: &mut HashMap<SessionId, Entry>) {
        let Some(ttl) = self.idle_ttl else {
            return;
        };
        let before = sessions.len();
        sessions.retain(|_, entry| entry.touched.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("evicted {} idle sessions", evicted);
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> SessionId {
        let id = Uuid::new_v4();
        let mut sessions = self.sessions();
        self.evict_idle(&mut sessions);
        sessions.insert(
            id,
            Entry {
                state: SessionState::default(),
                touched: Instant::now(),
            },
        );
        id
    }

    fn load(&self, id: &SessionId) -> Option<SessionState> {
        let mut sessions = self.sessions();
        let entry = sessions.get_mut(id)?;
        entry.touched = Instant::now();
        Some(entry.state.clone())
    }

    fn save(&self, id: &SessionId, state: SessionState) -> bool {
        let mut sessions = self.sessions();
        match sessions.get_mut(id) {
            Some(entry) => {
                entry.state = state;
                entry.touched = Instant::now();
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: &SessionId) -> bool {
        self.sessions().remove(id).is_some()
    }
}
