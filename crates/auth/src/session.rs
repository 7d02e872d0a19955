//! Session entity and the session failure model.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use depscope_core::{Entity, SessionId, SessionToken, Username};

/// Failure of a session operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unknown session")]
    UnknownSession,

    #[error("session expired")]
    SessionExpired,

    /// Backing store failed (e.g. a poisoned lock).
    #[error("session storage error: {0}")]
    Storage(String),
}

impl SessionError {
    /// Whether the caller failed to authenticate, as opposed to the service failing.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidCredentials
                | SessionError::UnknownSession
                | SessionError::SessionExpired
        )
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// An authenticated session.
///
/// # Invariants
/// - `created_at <= expires_at`
/// - the token never changes; refreshing only moves `expires_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub token: SessionToken,
    pub username: Username,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn open(token: SessionToken, username: Username, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: SessionId::new(),
            token,
            username,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn refresh(&mut self, now: DateTime<Utc>, ttl: Duration) {
        self.expires_at = now + ttl;
    }
}

impl Entity for Session {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(now: DateTime<Utc>) -> Session {
        Session::open(
            SessionToken::generate(),
            Username::new("alice").unwrap(),
            now,
            Duration::minutes(5),
        )
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let s = session(now);
        assert!(!s.is_expired(now));
        assert!(!s.is_expired(now + Duration::minutes(5) - Duration::seconds(1)));
        assert!(s.is_expired(now + Duration::minutes(5)));
    }

    #[test]
    fn refresh_moves_expiry_only() {
        let now = Utc::now();
        let mut s = session(now);
        let token = s.token.clone();
        s.refresh(now + Duration::minutes(4), Duration::minutes(5));
        assert_eq!(s.token, token);
        assert_eq!(s.created_at, now);
        assert_eq!(s.expires_at, now + Duration::minutes(9));
        assert_eq!(Entity::id(&s), &s.id);
    }

    #[test]
    fn auth_classification() {
        assert!(SessionError::InvalidCredentials.is_auth());
        assert!(SessionError::UnknownSession.is_auth());
        assert!(SessionError::SessionExpired.is_auth());
        assert!(!SessionError::storage("lock poisoned").is_auth());
    }
}
