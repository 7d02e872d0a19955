//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;

/// Header carrying the caller's session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";
