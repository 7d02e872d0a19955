//! Session routes.
//!
//! `POST /sessions` answers exactly once per request: 200 with the token,
//! 401 for authentication failures, 500 for anything else.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};

use depscope_core::{Password, Username};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SessionContext;
use crate::middleware;

/// Routes that run behind `session_middleware`.
pub fn current_router() -> Router {
    Router::new().route("/sessions/current", get(current_session).delete(end_session))
}

pub async fn create_session(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Result<Json<dto::CreateSessionRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            let status = if status == StatusCode::PAYLOAD_TOO_LARGE
                || status == StatusCode::UNSUPPORTED_MEDIA_TYPE
            {
                status
            } else {
                StatusCode::BAD_REQUEST
            };
            return errors::json_error(status, "invalid_request", rejection.body_text());
        }
    };

    let username = match Username::new(&body.username) {
        Ok(u) => u,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_username", e.to_string()),
    };
    let password = match Password::new(body.password) {
        Ok(p) => p,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_password", e.to_string()),
    };

    // The presented token is only a hint for reuse; a malformed one is ignored.
    let existing = middleware::session_token(&headers);

    match services.authority.create_session(existing, username, password).await {
        Ok(session) => (
            StatusCode::OK,
            Json(dto::CreateSessionResponse {
                session_response: session.token.into(),
            }),
        )
            .into_response(),
        Err(e) => errors::session_failure_status(&e).into_response(),
    }
}

pub async fn current_session(Extension(ctx): Extension<SessionContext>) -> axum::response::Response {
    Json(dto::CurrentSessionResponse {
        username: ctx.username().to_string(),
        created_at: ctx.created_at(),
        expires_at: ctx.expires_at(),
    })
    .into_response()
}

pub async fn end_session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> axum::response::Response {
    match services.authority.revoke(ctx.token()).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::session_failure_status(&e).into_response(),
    }
}
