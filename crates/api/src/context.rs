use chrono::{DateTime, Utc};

use depscope_auth::Session;
use depscope_core::{SessionToken, Username};

/// Session context for a request (resolved from the session-token header).
///
/// Inserted by `middleware::session_middleware`; present on every route behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn token(&self) -> &SessionToken {
        &self.session.token
    }

    pub fn username(&self) -> &Username {
        &self.session.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.session.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.session.expires_at
    }
}
