use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::conversation_state::ConversationState;

pub type SessionId = Uuid;

/// Handle to a session. Holding the lock serializes the actions of one user.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Conversation owned by a single user.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    state: ConversationState,
}

impl Session {
    pub fn new(id: SessionId, window_size: usize) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            state: ConversationState::new(window_size),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConversationState {
        &mut self.state
    }
}

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry").field("last_seen", &self.last_seen).finish()
    }
}

/// Live sessions keyed by id.
///
/// Sessions untouched for longer than the idle timeout are dropped by
/// [`SessionStore::sweep_idle`].
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, Entry>>,
    window_size: usize,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(window_size: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            window_size,
            idle_timeout,
        }
    }

    /// Returns the session for `id`, creating an empty one on first use.
    pub async fn get_or_create(&self, id: SessionId) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(id).or_insert_with(|| {
            info!(session = %id, "Created session");
            Entry {
                handle: Arc::new(Mutex::new(Session::new(id, self.window_size))),
                last_seen: Instant::now(),
            }
        });
        entry.last_seen = Instant::now();
        entry.handle.clone()
    }

    /// Returns the session for `id` if one exists, without creating it.
    pub async fn get(&self, id: SessionId) -> Option<SessionHandle> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(&id).map(|entry| {
            entry.last_seen = Instant::now();
            entry.handle.clone()
        })
    }

    /// Drops a session. Handles already given out stay usable but are no
    /// longer reachable through the store.
    pub async fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(&id).is_some();
        if removed {
            debug!(session = %id, live = sessions.len(), "Removed session");
        }
        removed
    }

    /// Drops every session idle for longer than the timeout. Sessions whose
    /// handle is still held elsewhere (a turn in flight) are kept.
    pub async fn sweep_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() <= self.idle_timeout || Arc::strong_count(&entry.handle) > 1
        });
        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, live = sessions.len(), "Expired idle sessions");
        }
        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
