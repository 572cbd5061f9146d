use crate::core_driver::{SessionId, SessionInfo};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Snapshot of one live session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub info: SessionInfo,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub started_at: DateTime<Local>,
    pub active_sessions: usize,
    pub total_sessions: u64,
    pub passive_listeners_opened: usize,
}

/// Removes its session from the registry on drop.
pub struct Departure<'a> {
    registry: &'a SessionRegistry,
    id: SessionId,
}

impl Drop for Departure<'_> {
    fn drop(&mut self) {
        self.registry.depart(self.id);
    }
}

/// Tracks the live sessions of one server.
///
/// Sessions arrive when their control connection is accepted and depart when the
/// session task ends, so membership never outlives a connection.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    max_connections: usize,
    next_id: AtomicU64,
    passive_listeners: AtomicUsize,
    started_at: DateTime<Local>,
}

impl SessionRegistry {
    /// `max_connections` of 0 means no limit.
    pub fn new(max_connections: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            max_connections,
            next_id: AtomicU64::new(1),
            passive_listeners: AtomicUsize::new(0),
            started_at: Local::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn next_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a session. Returns false when the server is full.
    pub fn arrive(&self, info: SessionInfo) -> bool {
        let mut sessions = self.lock();
        if self.max_connections > 0 && sessions.len() >= self.max_connections {
            return false;
        }
        sessions.insert(
            info.id,
            SessionEntry {
                info,
                username: None,
            },
        );
        true
    }

    pub fn depart(&self, id: SessionId) {
        self.lock().remove(&id);
    }

    /// Departs `id` when the returned guard is dropped, unwinding included.
    pub fn depart_on_drop(&self, id: SessionId) -> Departure<'_> {
        Departure { registry: self, id }
    }

    pub fn set_username(&self, id: SessionId, username: Option<String>) {
        if let Some(entry) = self.lock().get_mut(&id) {
            entry.username = username;
        }
    }

    pub fn record_passive_listener(&self) {
        self.passive_listeners.fetch_add(1, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<SessionEntry> {
        let mut entries: Vec<SessionEntry> = self.lock().values().cloned().collect();
        entries.sort_by_key(|entry| entry.info.id);
        entries
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            started_at: self.started_at,
            active_sessions: self.len(),
            total_sessions: self.next_id.load(Ordering::Relaxed) - 1,
            passive_listeners_opened: self.passive_listeners.load(Ordering::Relaxed),
        }
    }
}
