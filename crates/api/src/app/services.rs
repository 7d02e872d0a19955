//! Service wiring shared by all handlers.

use std::sync::Arc;
use std::time::Duration;

use depscope_auth::{CredentialError, CredentialStore, InMemorySessionAuthority, SessionAuthorityRef};
use depscope_edn::ParseOptions;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::ApiConfig;

/// Everything a handler needs beyond the request itself.
#[derive(Debug, Clone)]
pub struct AppServices {
    /// The asynchronous session operation behind `/sessions`.
    pub authority: SessionAuthorityRef,
    /// Limits for reading EDN request bodies.
    pub edn_options: ParseOptions,
}

impl AppServices {
    pub fn new(authority: SessionAuthorityRef) -> Self {
        Self {
            authority,
            edn_options: ParseOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("failed to seed accounts: {0}")]
    Credentials(#[from] CredentialError),

    #[error("session ttl out of range: {0}")]
    SessionTtl(String),
}

/// In-process wiring: credential store seeded from config + in-memory sessions.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, ServicesError> {
    let credentials = Arc::new(CredentialStore::new());
    for user in &config.users {
        credentials.register(user.username.clone(), &user.password)?;
    }
    if credentials.is_empty() {
        tracing::warn!("no accounts configured; every session request will be rejected");
    } else {
        tracing::info!(accounts = credentials.len(), "credential store ready");
    }

    let ttl = chrono::Duration::from_std(config.session_ttl)
        .map_err(|e| ServicesError::SessionTtl(e.to_string()))?;
    let authority: SessionAuthorityRef = Arc::new(InMemorySessionAuthority::new(credentials, ttl));

    Ok(AppServices::new(authority))
}

/// Background task: drop expired sessions every `every`.
pub fn spawn_session_purger(authority: SessionAuthorityRef, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately; nothing can have expired yet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = authority.purge_expired().await {
                tracing::warn!(error = %e, "session purge failed");
            }
        }
    })
}
