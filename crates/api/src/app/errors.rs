use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use depscope_auth::SessionError;
use depscope_edn::ParseError;

/// Status for a failed session operation: 401 for authentication failures,
/// 500 for everything else.
pub fn session_failure_status(err: &SessionError) -> StatusCode {
    if err.is_auth() {
        StatusCode::UNAUTHORIZED
    } else {
        tracing::error!(error = %err, "session operation failed");
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

pub fn edn_error_to_response(err: &ParseError) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "invalid_edn",
            "message": err.kind.to_string(),
            "line": err.line(),
            "column": err.column(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
