//! In-memory conversation sessions.
//!
//! Sessions belong to one teacher and expire after a period without
//! updates. Expired sessions are removed lazily on access and by
//! [`SessionStore::purge_expired`].

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Structured output that came with the turn, e.g. worksheets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl HistoryEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

impl Session {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::days(DEFAULT_SESSION_TTL_DAYS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn create(&self, user_id: &str) -> Session {
        let now = Utc::now();
        let session = Session {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            expires_at: now + self.ttl,
            history: Vec::new(),
        };
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        debug!(session_id = %session.session_id, user_id, "Session created");
        session
    }

    /// A live session owned by `user_id`.
    pub fn get(&self, session_id: &str, user_id: &str) -> Option<Session> {
        let now = Utc::now();
        {
            let session = self.sessions.get(session_id)?;
            if session.user_id != user_id {
                return None;
            }
            if !session.is_expired(now) {
                return Some(session.clone());
            }
        }

        // Read guard must be gone before removing.
        self.sessions.remove(session_id);
        None
    }

    /// Append turns and refresh the expiry. `None` when the session is
    /// missing, expired or owned by someone else.
    pub fn append(
        &self,
        session_id: &str,
        user_id: &str,
        entries: impl IntoIterator<Item = HistoryEntry>,
    ) -> Option<Session> {
        let now = Utc::now();
        let mut session = self.sessions.get_mut(session_id)?;
        if session.user_id != user_id || session.is_expired(now) {
            return None;
        }

        session.history.extend(entries);
        session.updated_at = now;
        session.expires_at = now + self.ttl;
        Some(session.clone())
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = !session.is_expired(now);
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new();
        let session = store.create("asha");

        let fetched = store.get(&session.session_id, "asha").unwrap();
        assert!(fetched.history.is_empty());
        assert!(store.get(&session.session_id, "ravi").is_none());

        let updated = store
            .append(
                &session.session_id,
                "asha",
                [
                    HistoryEntry::new(Role::User, "Explain rain"),
                    HistoryEntry::new(Role::Assistant, "Clouds get heavy"),
                ],
            )
            .unwrap();
        assert_eq!(updated.history.len(), 2);
        assert!(updated.expires_at >= session.expires_at);
        assert!(store
            .append(&session.session_id, "ravi", [HistoryEntry::new(Role::User, "x")])
            .is_none());
    }

    #[test]
    fn test_expired_sessions_removed() {
        let store = SessionStore::with_ttl(Duration::zero());
        let session = store.create("asha");

        assert!(store.get(&session.session_id, "asha").is_none());
        assert!(store.is_empty());

        store.create("asha");
        store.create("ravi");
        assert_eq!(store.purge_expired(), 2);
    }

    #[test]
    fn test_purge_counts_while_sessions_are_created() {
        let store = SessionStore::with_ttl(Duration::zero());
        let mut removed = 0;

        std::thread::scope(|scope| {
            for teacher in ["asha", "ravi", "meena"] {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..200 {
                        store.create(teacher);
                    }
                });
            }
            for _ in 0..50 {
                removed += store.purge_expired();
            }
        });
        removed += store.purge_expired();

        assert_eq!(removed, 600);
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_payload_serialized() {
        let entry = HistoryEntry::new(Role::System, "Generated worksheets")
            .with_payload(serde_json::json!({"worksheets": 2}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["role"], "system");
        assert_eq!(value["payload"]["worksheets"], 2);
    }
}
