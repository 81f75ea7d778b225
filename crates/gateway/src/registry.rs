//! ConnectionRegistry - sessions currently logged in

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A logged-in session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: u64,
    pub peer: String,
    pub connected_at: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(id: u64, peer: impl Into<String>) -> Self {
        Self {
            id,
            peer: peer.into(),
            connected_at: Utc::now(),
        }
    }
}

/// Thread-safe id -> session map shared by every dispatcher
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: RwLock<HashMap<u64, SessionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session. Returns false if the id was already present,
    /// in which case the existing entry is kept.
    pub async fn put(&self, id: u64, session: SessionHandle) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return false;
        }
        sessions.insert(id, session);
        true
    }

    pub async fn remove(&self, id: u64) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn size(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Ids of the sessions online right now, ascending
    pub async fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.sessions.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
