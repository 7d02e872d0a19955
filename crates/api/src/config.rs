//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use depscope_core::{Password, Username};

pub const ENV_BIND_ADDR: &str = "DEPSCOPE_BIND_ADDR";
pub const ENV_SESSION_TTL_SECS: &str = "DEPSCOPE_SESSION_TTL_SECS";
pub const ENV_MAX_BODY_BYTES: &str = "DEPSCOPE_MAX_BODY_BYTES";
pub const ENV_PURGE_INTERVAL_SECS: &str = "DEPSCOPE_PURGE_INTERVAL_SECS";
pub const ENV_USERS: &str = "DEPSCOPE_USERS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8888";
const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("DEPSCOPE_USERS: duplicate user '{0}'")]
    DuplicateUser(String),
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Account seeded into the credential store at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: Username,
    pub password: Password,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub max_body_bytes: usize,
    pub purge_interval: Duration,
    pub users: Vec<SeedUser>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8888)),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            purge_interval: Duration::from_secs(DEFAULT_PURGE_INTERVAL_SECS),
            users: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (the environment in production, a
    /// map in tests). Unset or blank variables fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr_raw = get(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid(ENV_BIND_ADDR, &bind_addr_raw, e.to_string()))?;

        let session_ttl = Duration::from_secs(positive(
            ENV_SESSION_TTL_SECS,
            get(ENV_SESSION_TTL_SECS),
            DEFAULT_SESSION_TTL_SECS,
        )?);
        let purge_interval = Duration::from_secs(positive(
            ENV_PURGE_INTERVAL_SECS,
            get(ENV_PURGE_INTERVAL_SECS),
            DEFAULT_PURGE_INTERVAL_SECS,
        )?);
        let max_body_bytes = positive(
            ENV_MAX_BODY_BYTES,
            get(ENV_MAX_BODY_BYTES),
            DEFAULT_MAX_BODY_BYTES as u64,
        )?;
        let max_body_bytes = usize::try_from(max_body_bytes).map_err(|e| {
            ConfigError::invalid(ENV_MAX_BODY_BYTES, &max_body_bytes.to_string(), e.to_string())
        })?;

        let users = match get(ENV_USERS) {
            Some(raw) => parse_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bind_addr,
            session_ttl,
            max_body_bytes,
            purge_interval,
            users,
        })
    }
}

fn positive(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(var, &raw, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::invalid(var, &raw, e.to_string())),
    }
}

/// `user:password[,user:password...]`. The password is everything after the
/// first colon, so it may itself contain colons (but not commas).
fn parse_users(raw: &str) -> Result<Vec<SeedUser>, ConfigError> {
    let mut users: Vec<SeedUser> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, password)) = entry.split_once(':') else {
            return Err(ConfigError::invalid(ENV_USERS, "<redacted>", "expected user:password"));
        };
        let username = Username::new(name)
            .map_err(|e| ConfigError::invalid(ENV_USERS, name, e.to_string()))?;
        let password = Password::new(password).map_err(|e| {
            ConfigError::invalid(ENV_USERS, &format!("{name}:<redacted>"), e.to_string())
        })?;
        if users.iter().any(|u| u.username == username) {
            return Err(ConfigError::DuplicateUser(username.to_string()));
        }
        users.push(SeedUser { username, password });
    }
    Ok(users)
}
