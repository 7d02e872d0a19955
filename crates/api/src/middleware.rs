use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use depscope_core::SessionToken;

use crate::SESSION_TOKEN_HEADER;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SessionContext;

/// Require a live session; inserts [`SessionContext`] for downstream handlers.
pub async fn session_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let session = services
        .authority
        .resolve(&token)
        .await
        .map_err(|e| errors::session_failure_status(&e))?;

    req.extensions_mut().insert(SessionContext::new(session));
    Ok(next.run(req).await)
}

/// Session token from the request headers, if present and well-formed.
pub fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let raw = headers.get(SESSION_TOKEN_HEADER)?.to_str().ok()?;
    SessionToken::parse(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_trimmed_token() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_TOKEN_HEADER, HeaderValue::from_static(" abc123 "));
        assert_eq!(session_token(&headers).unwrap().as_str(), "abc123");
    }

    #[test]
    fn missing_or_blank_header_yields_none() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());
        headers.insert(SESSION_TOKEN_HEADER, HeaderValue::from_static("   "));
        assert!(session_token(&headers).is_none());
    }
}
