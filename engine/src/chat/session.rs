//! Per-session conversation state
//!
//! Sessions are created on first use and each one sits behind its own
//! async mutex. Requests in the same session queue up on that mutex while
//! different sessions proceed in parallel. The outer map lock is only held
//! long enough to look up or insert an entry.
//!
//! Callers that omit a session id get a fresh session per request, so the
//! store bounds itself: inserting a session first drops every session idle
//! for longer than the idle timeout, then the least recently used ones
//! while the store is full.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use super::memory::ConversationMemory;

/// Idle time after which a session may be dropped
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Sessions held before the least recently used one is dropped
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Mutable state of one conversation
#[derive(Debug, Clone)]
pub struct Session {
    pub memory: ConversationMemory,

    /// Order text waiting for confirmation
    pub pending_order: Option<String>,
}

impl Session {
    pub fn new(max_history_chars: usize) -> Self {
        Self {
            memory: ConversationMemory::with_budget(max_history_chars),
            pending_order: None,
        }
    }
}

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    /// Milliseconds since the store was created
    last_seen: AtomicU64,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    max_history_chars: usize,
    idle_timeout: Duration,
    max_sessions: usize,
    epoch: Instant,
}

impl SessionStore {
    pub fn new(max_history_chars: usize) -> Self {
        Self::with_limits(max_history_chars, DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }

    /// Store that drops sessions idle for `idle_timeout` and never holds
    /// more than `max_sessions` (at least one)
    pub fn with_limits(max_history_chars: usize, idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history_chars,
            idle_timeout,
            max_sessions: max_sessions.max(1),
            epoch: Instant::now(),
        }
    }

    fn now_millis(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Handle to the session `id`, creating an empty one if needed
    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<Session>> {
        let now = self.now_millis();
        {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = sessions.get(id) {
                entry.last_seen.store(now, Ordering::Relaxed);
                return Arc::clone(&entry.session);
            }
        }

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = sessions.get(id) {
            entry.last_seen.store(now, Ordering::Relaxed);
            return Arc::clone(&entry.session);
        }

        self.evict(&mut sessions, now);

        let session = Arc::new(Mutex::new(Session::new(self.max_history_chars)));
        sessions.insert(
            id.to_string(),
            SessionEntry {
                session: Arc::clone(&session),
                last_seen: AtomicU64::new(now),
            },
        );
        session
    }

    /// Make room for one more session
    fn evict(&self, sessions: &mut HashMap<String, SessionEntry>, now: u64) {
        let idle_millis = u64::try_from(self.idle_timeout.as_millis()).unwrap_or(u64::MAX);
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.saturating_sub(entry.last_seen.load(Ordering::Relaxed)) < idle_millis
        });

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen.load(Ordering::Relaxed))
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!("Dropped {} idle session(s), {} remain", dropped, sessions.len());
        }
    }

    /// Drop a session. Returns true if it existed.
    pub fn remove(&self, id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(id)
    }
}
