//! Validated value objects carried by session requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

const USERNAME_MAX_CHARS: usize = 64;
const PASSWORD_MAX_CHARS: usize = 1024;
const TOKEN_MAX_LEN: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Username
// ─────────────────────────────────────────────────────────────────────────────

/// Login name of an account.
///
/// Surrounding whitespace is trimmed; the remainder must be 1..=64 chars with
/// no control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn new(raw: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }
        if trimmed.chars().count() > USERNAME_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "username must be at most {USERNAME_MAX_CHARS} characters"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(DomainError::validation(
                "username must not contain control characters",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl core::fmt::Display for Username {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Username {}

// ─────────────────────────────────────────────────────────────────────────────
// Password
// ─────────────────────────────────────────────────────────────────────────────

/// Plaintext password as received from a client.
///
/// Not trimmed (whitespace is significant). `Debug` is redacted and there is no
/// `Display` or `Serialize`, so a password cannot end up in a log line by accident.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Password(String);

impl Password {
    pub fn new(raw: impl Into<String>) -> DomainResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("password must not be empty"));
        }
        if raw.chars().count() > PASSWORD_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "password must be at most {PASSWORD_MAX_CHARS} characters"
            )));
        }
        Ok(Self(raw))
    }

    /// Raw bytes, for digesting only.
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for Password {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl core::fmt::Debug for Password {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl ValueObject for Password {}

// ─────────────────────────────────────────────────────────────────────────────
// Session token
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque bearer string identifying an authenticated session.
///
/// Tokens minted by this service are 32 lowercase hex characters. Tokens
/// presented by clients only need to be non-empty printable ASCII without
/// spaces, at most 256 bytes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Mint a fresh random token (UUIDv4, simple form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn parse(raw: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("session token must not be empty"));
        }
        if trimmed.len() > TOKEN_MAX_LEN {
            return Err(DomainError::validation(format!(
                "session token must be at most {TOKEN_MAX_LEN} bytes"
            )));
        }
        if !trimmed.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(DomainError::validation(
                "session token must be printable ASCII without spaces",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionToken> for String {
    fn from(value: SessionToken) -> Self {
        value.0
    }
}

impl core::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// Only a prefix is shown so tokens can be correlated in logs without leaking them.
impl core::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionToken({prefix}…)")
    }
}

impl ValueObject for SessionToken {}
