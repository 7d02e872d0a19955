//! Username → salted password digest registry.
//!
//! Digests are `SHA-256(salt || password)` with a random 16-byte salt per
//! account, compared in constant time.

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use depscope_core::{Password, Username};

use crate::session::SessionError;

/// Failure to add an account.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("user '{0}' is already registered")]
    AlreadyRegistered(Username),

    #[error("credential store unavailable: {0}")]
    Storage(String),
}

#[derive(Debug, Clone)]
struct Credential {
    salt: [u8; 16],
    digest: [u8; 32],
}

impl Credential {
    fn new(secret: &[u8]) -> Self {
        let salt = Uuid::new_v4().into_bytes();
        Self {
            salt,
            digest: digest(&salt, secret),
        }
    }

    fn matches(&self, secret: &[u8]) -> bool {
        let candidate = digest(&self.salt, secret);
        candidate[..].ct_eq(&self.digest[..]).into()
    }
}

fn digest(salt: &[u8; 16], secret: &[u8]) -> [u8; 32] {
    Sha256::new()
        .chain_update(salt)
        .chain_update(secret)
        .finalize()
        .into()
}

/// Thread-safe credential registry.
#[derive(Debug)]
pub struct CredentialStore {
    accounts: RwLock<HashMap<Username, Credential>>,
    /// Checked against when the username is unknown, so both paths cost one digest.
    decoy: Credential,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            decoy: Credential::new(Uuid::new_v4().as_bytes()),
        }
    }

    /// Add an account. Registering the same username twice is an error.
    pub fn register(&self, username: Username, password: &Password) -> Result<(), CredentialError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|e| CredentialError::Storage(format!("failed to acquire write lock: {e}")))?;

        if accounts.contains_key(&username) {
            return Err(CredentialError::AlreadyRegistered(username));
        }
        tracing::debug!(username = %username, "registered account");
        accounts.insert(username, Credential::new(password.expose()));
        Ok(())
    }

    /// Check a username/password pair.
    pub fn verify(&self, username: &Username, password: &Password) -> Result<bool, SessionError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|e| SessionError::storage(format!("failed to acquire read lock: {e}")))?;

        Ok(match accounts.get(username) {
            Some(credential) => credential.matches(password.expose()),
            None => {
                let _ = self.decoy.matches(password.expose());
                false
            }
        })
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn pw(raw: &str) -> Password {
        Password::new(raw).unwrap()
    }

    #[test]
    fn verify_accepts_only_the_registered_password() {
        let store = CredentialStore::new();
        store.register(user("alice"), &pw("correct horse")).unwrap();

        assert!(store.verify(&user("alice"), &pw("correct horse")).unwrap());
        assert!(!store.verify(&user("alice"), &pw("Correct horse")).unwrap());
        assert!(!store.verify(&user("bob"), &pw("correct horse")).unwrap());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let store = CredentialStore::new();
        store.register(user("alice"), &pw("one")).unwrap();
        let err = store.register(user("alice"), &pw("two")).unwrap_err();
        assert_eq!(err, CredentialError::AlreadyRegistered(user("alice")));
        assert_eq!(store.len(), 1);
        assert!(store.verify(&user("alice"), &pw("one")).unwrap());
    }

    #[test]
    fn poisoned_store_reports_storage_errors() {
        let store = CredentialStore::new();
        store.register(user("alice"), &pw("one")).unwrap();

        std::thread::scope(|s| {
            let poisoner = s.spawn(|| {
                let _guard = store.accounts.write().unwrap();
                panic!("poison the lock");
            });
            assert!(poisoner.join().is_err());
        });

        assert!(matches!(
            store.register(user("bob"), &pw("two")),
            Err(CredentialError::Storage(_))
        ));
        assert!(matches!(
            store.verify(&user("alice"), &pw("one")),
            Err(SessionError::Storage(_))
        ));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = Credential::new(pw("same").expose());
        let b = Credential::new(pw("same").expose());
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.digest, b.digest);
    }
}
