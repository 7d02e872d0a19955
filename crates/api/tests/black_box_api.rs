use std::sync::Arc;

use async_trait::async_trait;
use depscope_api::app::{self, services::AppServices};
use depscope_api::config::{ApiConfig, ENV_USERS};
use depscope_api::SESSION_TOKEN_HEADER;
use depscope_auth::{Session, SessionAuthority, SessionError};
use depscope_core::{Password, SessionToken, Username};
use reqwest::StatusCode;
use serde_json::json;

const EDN: &str = "application/edn";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, seeded with `alice:wonderland` and `bob:builder`.
    async fn spawn() -> Self {
        let config = ApiConfig::from_lookup(|key| {
            (key == ENV_USERS).then(|| "alice:wonderland,bob:builder".to_string())
        })
        .expect("valid test config");
        let services = app::services::build_services(&config).expect("failed to build services");
        Self::serve(app::router(Arc::new(services), config.max_body_bytes)).await
    }

    async fn spawn_with(services: AppServices, max_body_bytes: usize) -> Self {
        Self::serve(app::router(Arc::new(services), max_body_bytes)).await
    }

    async fn serve(router: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Authority whose backing store is always down.
#[derive(Debug)]
struct FailingAuthority;

#[async_trait]
impl SessionAuthority for FailingAuthority {
    async fn create_session(
        &self,
        _existing: Option<SessionToken>,
        _username: Username,
        _password: Password,
    ) -> Result<Session, SessionError> {
        Err(SessionError::storage("backing store unreachable"))
    }

    async fn resolve(&self, _token: &SessionToken) -> Result<Session, SessionError> {
        Err(SessionError::storage("backing store unreachable"))
    }

    async fn revoke(&self, _token: &SessionToken) -> Result<Session, SessionError> {
        Err(SessionError::storage("backing store unreachable"))
    }

    async fn purge_expired(&self) -> Result<usize, SessionError> {
        Err(SessionError::storage("backing store unreachable"))
    }
}

async fn login(client: &reqwest::Client, srv: &TestServer, username: &str, password: &str) -> String {
    let res = client
        .post(srv.url("/sessions"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["sessionResponse"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn well_formed_edn_is_accepted_with_empty_body() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for body in [
        r#"{"express" "4.16.2" "lodash" "^4.17.4"}"#,
        r#"{:dependencies [[org.clojure/clojure "1.9.0"]] :dev #{:midje}}"#,
        "[1 2.5 \\a nil true #inst \"2018-01-01T00:00:00Z\"]",
        "nil",
        "; only a comment\n{}",
    ] {
        let res = client
            .post(srv.url("/write-dependencies"))
            .header("content-type", EDN)
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "body: {body}");
        assert!(res.text().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn malformed_edn_is_a_bad_request_with_position() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/write-dependencies"))
        .header("content-type", EDN)
        .body("{\"express\"\n  \"4.16.2\"")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_edn");
    assert_eq!(body["line"], 2);
    assert!(body["column"].is_u64());
}

#[tokio::test]
async fn non_edn_content_type_is_unsupported() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/write-dependencies"))
        .header("content-type", "application/json")
        .body(r#"{"express": "4.16.2"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = client
        .post(srv.url("/write-dependencies"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let config = ApiConfig::default();
    let services = app::services::build_services(&config).unwrap();
    let srv = TestServer::spawn_with(services, 64).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/write-dependencies"))
        .header("content-type", EDN)
        .body(format!("[{}]", "1 ".repeat(100)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn non_utf8_edn_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/write-dependencies"))
        .header("content-type", EDN)
        .body(b"\xff\xfe".to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_encoding");
}

#[tokio::test]
async fn large_edn_collections_are_accepted() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let body = format!(
        "#{{{}}}",
        (0..100_000).map(|i| i.to_string()).collect::<Vec<_>>().join(" ")
    );
    let res = client
        .post(srv.url("/write-dependencies"))
        .header("content-type", EDN)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_session_requests_are_rejected() {
    let config = ApiConfig::default();
    let services = app::services::build_services(&config).unwrap();
    let srv = TestServer::spawn_with(services, 64).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/sessions"))
        .json(&json!({ "username": "alice", "password": "x".repeat(200) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn valid_credentials_open_a_session() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let token = login(&client, &srv, "alice", "wonderland").await;
    assert_eq!(token.len(), 32);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn bad_credentials_are_unauthorized_with_empty_body() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for (username, password) in [("alice", "looking-glass"), ("mallory", "wonderland")] {
        let res = client
            .post(srv.url("/sessions"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.text().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn authority_failures_are_internal_errors() {
    let srv = TestServer::spawn_with(AppServices::new(Arc::new(FailingAuthority)), 1024).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/sessions"))
        .json(&json!({ "username": "alice", "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(res.text().await.unwrap().is_empty());

    let res = client
        .get(srv.url("/sessions/current"))
        .header(SESSION_TOKEN_HEADER, "whatever")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn malformed_session_requests_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/sessions"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/sessions"))
        .json(&json!({ "username": "alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/sessions"))
        .json(&json!({ "username": "   ", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(srv.url("/sessions"))
        .header("content-type", "text/plain")
        .body(r#"{"username":"alice","password":"wonderland"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn presenting_a_live_token_reuses_it() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let token = login(&client, &srv, "alice", "wonderland").await;

    let res = client
        .post(srv.url("/sessions"))
        .header(SESSION_TOKEN_HEADER, &token)
        .json(&json!({ "username": "alice", "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sessionResponse"], token);

    // Another user's token is not handed over.
    let res = client
        .post(srv.url("/sessions"))
        .header(SESSION_TOKEN_HEADER, &token)
        .json(&json!({ "username": "bob", "password": "builder" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_ne!(body["sessionResponse"], token);
}

#[tokio::test]
async fn current_session_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/sessions/current")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(srv.url("/sessions/current"))
        .header(SESSION_TOKEN_HEADER, "not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = login(&client, &srv, "bob", "builder").await;

    let res = client
        .get(srv.url("/sessions/current"))
        .header(SESSION_TOKEN_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "bob");
    assert!(body["expires_at"].is_string());

    let res = client
        .delete(srv.url("/sessions/current"))
        .header(SESSION_TOKEN_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(srv.url("/sessions/current"))
        .header(SESSION_TOKEN_HEADER, &token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
