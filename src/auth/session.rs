use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Session {
    identity_id: String,
    issued_at: Instant,
}

/// Opaque bearer tokens mapped to identity ids. Sessions live in memory only
/// and end on logout, expiry or restart.
pub struct SessionStore {
    tokens: DashMap<String, Session>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Issues a fresh token. Expired sessions are swept here so the table
    /// stays bounded by the logins of one TTL window.
    pub fn issue(&self, identity_id: &str) -> String {
        self.purge_expired();

        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(
            token.clone(),
            Session {
                identity_id: identity_id.to_string(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    pub fn resolve(&self, token: &str) -> Option<String> {
        let session = self.tokens.get(token)?;
        if session.issued_at.elapsed() < self.ttl {
            return Some(session.identity_id.clone());
        }
        // Release the shard read lock before removing.
        drop(session);
        self.tokens.remove(token);
        None
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let before = self.tokens.len();
        self.tokens
            .retain(|_, session| session.issued_at.elapsed() < self.ttl);
        before.saturating_sub(self.tokens.len())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SessionStore;

    #[test]
    fn issued_token_resolves_until_revoked() {
        let sessions = SessionStore::new();
        let token = sessions.issue("user1");

        assert_eq!(sessions.resolve(&token).as_deref(), Some("user1"));
        assert!(sessions.revoke(&token));
        assert!(sessions.resolve(&token).is_none());
        assert!(!sessions.revoke(&token));
    }

    #[test]
    fn tokens_are_unique_per_login() {
        let sessions = SessionStore::new();
        let first = sessions.issue("user1");
        let second = sessions.issue("user1");

        assert_ne!(first, second);
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn expired_token_no_longer_resolves() {
        let sessions = SessionStore::with_ttl(Duration::ZERO);
        let token = sessions.issue("user1");

        assert!(sessions.resolve(&token).is_none());
        assert!(sessions.is_empty());
    }

    #[test]
    fn repeated_logins_do_not_accumulate_expired_sessions() {
        let sessions = SessionStore::with_ttl(Duration::ZERO);
        for _ in 0..50 {
            sessions.issue("user1");
        }

        assert_eq!(sessions.len(), 1);
    }
}
