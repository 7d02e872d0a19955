//! `POST /write-dependencies`: accept an EDN dependency description and log it.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::app::errors;
use crate::app::services::AppServices;

pub const EDN_MEDIA_TYPE: &str = "application/edn";

pub async fn write_dependencies(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    if !is_edn(&headers) {
        return errors::json_error(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            format!("content-type must be {EDN_MEDIA_TYPE}"),
        );
    }

    let text = match String::from_utf8(body.to_vec()) {
        Ok(text) => text,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_encoding", e.to_string());
        }
    };

    // Reading a large body is CPU-bound; keep it off the async workers.
    let options = services.edn_options;
    let parsed = tokio::task::spawn_blocking(move || depscope_edn::parse_with(&text, options)).await;

    let deps = match parsed {
        Ok(Ok(v)) => v,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "rejected malformed dependency payload");
            return errors::edn_error_to_response(&e);
        }
        Err(e) => {
            tracing::error!(error = %e, "dependency reader task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        kind = deps.kind(),
        entries = ?deps.count(),
        dependencies = %depscope_edn::to_json(&deps),
        "received dependencies"
    );

    StatusCode::OK.into_response()
}

/// `application/edn`, ignoring parameters such as `charset`.
fn is_edn(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(EDN_MEDIA_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn edn_media_type_detection() {
        assert!(is_edn(&with_content_type("application/edn")));
        assert!(is_edn(&with_content_type("Application/EDN; charset=utf-8")));
        assert!(!is_edn(&with_content_type("application/json")));
        assert!(!is_edn(&with_content_type("application/edn+xml")));
        assert!(!is_edn(&HeaderMap::new()));
    }
}
