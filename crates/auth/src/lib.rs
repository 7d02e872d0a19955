//! `depscope-auth`: credential checks and session lifecycle.
//!
//! This crate is intentionally decoupled from HTTP: the API layer only sees
//! [`SessionAuthority`] and classifies its failures with [`SessionError::is_auth`].

pub mod authority;
pub mod clock;
pub mod credentials;
pub mod session;

pub use authority::{InMemorySessionAuthority, SessionAuthority, SessionAuthorityRef};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::{CredentialError, CredentialStore};
pub use session::{Session, SessionError};
