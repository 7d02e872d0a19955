use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /sessions`. Fields are validated into domain types by the handler.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub username: String,
    pub password: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateSessionResponse {
    #[serde(rename = "sessionResponse")]
    pub session_response: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentSessionResponse {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_uses_camel_case_key() {
        let body = serde_json::to_value(CreateSessionResponse {
            session_response: "tok".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "sessionResponse": "tok" }));
    }
}
