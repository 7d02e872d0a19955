//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: session authority and reader settings shared by handlers
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Full HTTP router over already-built services (tests plug in their own authority here).
pub fn router(services: Arc<AppServices>, max_body_bytes: usize) -> Router {
    // Routes that need a live session.
    let protected = routes::sessions::current_router().layer(
        axum::middleware::from_fn_with_state(services.clone(), middleware::session_middleware),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/write-dependencies", post(routes::dependencies::write_dependencies))
        .route("/sessions", post(routes::sessions::create_session))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
}
