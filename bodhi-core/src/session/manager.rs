//! Session manager for handling multiple sessions

use super::store::{Persona, Session};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;

/// Shared handle to one session; held across the upstream round trip
pub type SessionHandle = Arc<AsyncMutex<Session>>;

/// Bounds on the live session registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Most sessions kept at once
    pub max_sessions: usize,
    /// Sessions untouched for longer than this are evicted
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: 1000,
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct Entry {
    handle: SessionHandle,
    last_used: Instant,
}

impl Entry {
    /// Another caller still holds the handle
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.handle) > 1
    }
}

/// Manages conversation sessions keyed by session id
///
/// Session ids come from callers, so the registry is bounded: idle sessions
/// are evicted on insert, and when the cap is reached the least recently used
/// session that nobody holds makes room.
#[derive(Debug)]
pub struct SessionManager {
    /// Seed pair for newly created sessions
    persona: Persona,
    limits: SessionLimits,
    /// Live sessions
    sessions: Mutex<HashMap<String, Entry>>,
}

impl SessionManager {
    /// Create a new session manager with default limits
    pub fn new(persona: Persona) -> Self {
        Self::with_limits(persona, SessionLimits::default())
    }

    pub fn with_limits(persona: Persona, limits: SessionLimits) -> Self {
        Self {
            persona,
            limits,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create a session
    pub fn get_or_create(&self, key: &str) -> SessionHandle {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();

        if let Some(entry) = sessions.get_mut(key) {
            entry.last_used = now;
            return entry.handle.clone();
        }

        self.evict(&mut sessions, now);

        tracing::debug!(session = %key, "Creating session");
        let handle = Arc::new(AsyncMutex::new(Session::new(key, &self.persona)));
        sessions.insert(
            key.to_string(),
            Entry {
                handle: handle.clone(),
                last_used: now,
            },
        );
        handle
    }

    /// Drop a session that never completed an exchange and nobody holds.
    ///
    /// Returns whether it was removed.
    pub fn discard_if_unused(&self, key: &str) -> bool {
        let mut sessions = self.sessions.lock();
        let unused = sessions.get(key).is_some_and(|entry| {
            !entry.in_use()
                && entry
                    .handle
                    .try_lock()
                    .is_ok_and(|session| session.exchange_turns() == 0)
        });
        if unused {
            sessions.remove(key);
        }
        unused
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    fn evict(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        let idle_timeout = self.limits.idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.in_use() || now.duration_since(entry.last_used) <= idle_timeout
        });

        while sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .filter(|(_, entry)| !entry.in_use())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    sessions.remove(&key);
                }
                // Every session is mid-request; allow a temporary overshoot
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = sessions.len(), "Evicted sessions");
        }
    }
}
