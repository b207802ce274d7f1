use serde::{Deserialize, Serialize};

/// `POST /login` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// `POST /login/google` body: where to send the user agent.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleLoginUrl {
    pub url: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /auth/google/verify` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: VerifiedUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let json = r#"{"access_token": "eyJ.abc.def", "token_type": "bearer"}"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "eyJ.abc.def");
        assert_eq!(resp.token_type.as_deref(), Some("bearer"));
    }

    #[test]
    fn test_parse_verify_response() {
        let json = r#"{"access_token": "t", "token_type": "bearer", "user": {"id": "u-1", "email": "a@example.com"}}"#;
        let resp: VerifyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.user.id, "u-1");
        assert_eq!(resp.user.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn test_health_status() {
        let ok: HealthStatus = serde_json::from_str(r#"{"status": "ok"}"#).unwrap();
        assert!(ok.is_ok());
        let down: HealthStatus = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(!down.is_ok());
    }
}
