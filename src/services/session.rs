//! Editor sessions
//!
//! The editor content a client is working on lives server-side, keyed by a
//! server-issued session id. Sessions expire after a period of inactivity;
//! a background sweep (see the server module) removes the expired ones so
//! abandoned tabs do not pile up.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One client's editor state.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            id: format!("sess_{}", Uuid::new_v4()),
            code: String::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Whether the session has been idle longer than the TTL.
    pub fn is_expired(&self, ttl_seconds: u64) -> bool {
        let idle = Utc::now().signed_duration_since(self.last_activity);
        idle.num_seconds().max(0) as u64 > ttl_seconds
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// In-memory session store with idle expiry.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl_seconds: u64,
}

impl SessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl_seconds,
        }
    }

    /// Create a fresh session and return it.
    pub async fn create(&self) -> Session {
        let session = Session::new();
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());

        tracing::debug!(session_id = %session.id, "created editor session");
        session
    }

    /// Look up a session, refreshing its activity timestamp.
    ///
    /// An expired session is treated as missing and removed on the spot, so
    /// lookups never have to wait for the background sweep.
    pub async fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.is_expired(self.ttl_seconds) => {
                sessions.remove(id);
                None
            }
            Some(session) => {
                session.touch();
                Some(session.clone())
            }
            None => None,
        }
    }

    /// Replace the stored code for a session. Returns false for an unknown
    /// or expired session.
    pub async fn set_code(&self, id: &str, code: String) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(session) if session.is_expired(self.ttl_seconds) => {
                sessions.remove(id);
                false
            }
            Some(session) => {
                session.code = code;
                session.touch();
                true
            }
            None => false,
        }
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Remove all expired sessions, returning how many went away.
    pub async fn remove_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl_seconds));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let store = SessionStore::new(3600);
        let session = store.create().await;

        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.id, session.id);
        assert_eq!(fetched.code, "");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let store = SessionStore::new(3600);
        let a = store.create().await;
        let b = store.create().await;
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("sess_"));
    }

    #[tokio::test]
    async fn set_code_persists_and_touches() {
        let store = SessionStore::new(3600);
        let session = store.create().await;

        assert!(store.set_code(&session.id, "print('hi')".to_string()).await);

        let fetched = store.get(&session.id).await.unwrap();
        assert_eq!(fetched.code, "print('hi')");
        assert!(fetched.last_activity >= session.last_activity);
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let store = SessionStore::new(3600);
        assert!(store.get("sess_missing").await.is_none());
        assert!(!store.set_code("sess_missing", "x = 1".to_string()).await);
        assert!(!store.remove("sess_missing").await);
    }

    #[tokio::test]
    async fn remove_drops_the_session() {
        let store = SessionStore::new(3600);
        let session = store.create().await;

        assert!(store.remove(&session.id).await);
        assert!(store.get(&session.id).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn expiry_follows_idle_time() {
        let mut session = Session::new();
        assert!(!session.is_expired(3600));

        session.last_activity = Utc::now() - chrono::Duration::seconds(10);
        assert!(session.is_expired(5));
        assert!(!session.is_expired(60));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_sessions() {
        let store = SessionStore::new(1);
        let stale = store.create().await;
        let fresh = store.create().await;

        // Backdate the stale session past the TTL
        {
            let mut sessions = store.sessions.write().await;
            if let Some(session) = sessions.get_mut(&stale.id) {
                session.last_activity = Utc::now() - chrono::Duration::seconds(30);
            }
        }

        assert_eq!(store.remove_expired().await, 1);
        assert!(store.get(&fresh.id).await.is_some());
        assert!(store.get(&stale.id).await.is_none());
    }

    #[tokio::test]
    async fn expired_session_vanishes_on_lookup() {
        let store = SessionStore::new(1);
        let session = store.create().await;

        {
            let mut sessions = store.sessions.write().await;
            if let Some(s) = sessions.get_mut(&session.id) {
                s.last_activity = Utc::now() - chrono::Duration::seconds(30);
            }
        }

        assert!(store.get(&session.id).await.is_none());
        assert_eq!(store.len().await, 0);
    }
}
