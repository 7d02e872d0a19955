//! Session authority: the asynchronous operation behind `POST /sessions`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info, warn};

use depscope_core::{Password, SessionToken, Username};

use crate::clock::{Clock, SystemClock};
use crate::credentials::CredentialStore;
use crate::session::{Session, SessionError};

/// Creates, resolves and ends sessions.
#[async_trait]
pub trait SessionAuthority: Send + Sync + core::fmt::Debug {
    /// Authenticate `username`/`password` and return a live session.
    ///
    /// When `existing` names a live session of the same user, that session is
    /// refreshed and returned instead of minting a new token. An unknown,
    /// expired or foreign `existing` token is ignored.
    async fn create_session(
        &self,
        existing: Option<SessionToken>,
        username: Username,
        password: Password,
    ) -> Result<Session, SessionError>;

    /// Look up a live session by token.
    async fn resolve(&self, token: &SessionToken) -> Result<Session, SessionError>;

    /// End a session; returns the removed session.
    async fn revoke(&self, token: &SessionToken) -> Result<Session, SessionError>;

    /// Drop every expired session; returns how many were removed.
    async fn purge_expired(&self) -> Result<usize, SessionError>;
}

/// Type alias for Arc-wrapped SessionAuthority trait objects.
pub type SessionAuthorityRef = Arc<dyn SessionAuthority>;

/// Process-local authority backed by a [`CredentialStore`] and a token map.
#[derive(Debug)]
pub struct InMemorySessionAuthority {
    credentials: Arc<CredentialStore>,
    sessions: RwLock<HashMap<SessionToken, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionAuthority {
    pub fn new(credentials: Arc<CredentialStore>, ttl: Duration) -> Self {
        Self::with_clock(credentials, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(credentials: Arc<CredentialStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn write_lock_error<E: core::fmt::Display>(e: E) -> SessionError {
        SessionError::storage(format!("failed to acquire write lock: {e}"))
    }
}

#[async_trait]
impl SessionAuthority for InMemorySessionAuthority {
    async fn create_session(
        &self,
        existing: Option<SessionToken>,
        username: Username,
        password: Password,
    ) -> Result<Session, SessionError> {
        if !self.credentials.verify(&username, &password)? {
            warn!(username = %username, "rejected session request: invalid credentials");
            return Err(SessionError::InvalidCredentials);
        }

        let now = self.clock.now();
        let mut sessions = self.sessions.write().map_err(Self::write_lock_error)?;

        if let Some(token) = existing {
            match sessions.get_mut(&token) {
                Some(session) if session.username == username && !session.is_expired(now) => {
                    session.refresh(now, self.ttl);
                    debug!(username = %username, session_id = %session.id, "refreshed session");
                    return Ok(session.clone());
                }
                Some(session) if session.is_expired(now) => {
                    debug!(session_id = %session.id, "presented session had expired");
                    sessions.remove(&token);
                }
                Some(_) => {
                    warn!(username = %username, "presented session belongs to another user; ignoring it");
                }
                None => debug!("presented session token is unknown; ignoring it"),
            }
        }

        let session = Session::open(SessionToken::generate(), username, now, self.ttl);
        sessions.insert(session.token.clone(), session.clone());
        info!(username = %session.username, session_id = %session.id, "created session");
        Ok(session)
    }

    async fn resolve(&self, token: &SessionToken) -> Result<Session, SessionError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().map_err(Self::write_lock_error)?;

        match sessions.get(token) {
            None => Err(SessionError::UnknownSession),
            Some(session) if session.is_expired(now) => {
                sessions.remove(token);
                Err(SessionError::SessionExpired)
            }
            Some(session) => Ok(session.clone()),
        }
    }

    async fn revoke(&self, token: &SessionToken) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().map_err(Self::write_lock_error)?;
        let session = sessions.remove(token).ok_or(SessionError::UnknownSession)?;
        info!(username = %session.username, session_id = %session.id, "revoked session");
        Ok(session)
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().map_err(Self::write_lock_error)?;

        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let purged = before - sessions.len();

        if purged > 0 {
            info!(purged, remaining = sessions.len(), "purged expired sessions");
        }
        Ok(purged)
    }
}
