use thiserror::Error;

/// Every way an authentication flow or a protected fetch can fail.
///
/// All variants are recovered at the page boundary and rendered as a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    SignupError(String),

    #[error("Unable to reach the server: {0}")]
    NetworkError(String),

    #[error("No authentication data found in the redirect")]
    NoAuthData,

    #[error("{0}")]
    ExchangeError(String),

    #[error("Failed to start OAuth login: {0}")]
    OAuthInitError(String),

    #[error("Unauthorized - session may have expired")]
    Unauthorized,
}

impl AuthError {
    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => {
                "Login failed. Please check your credentials.".to_string()
            }
            AuthError::SignupError(detail) => detail.clone(),
            AuthError::NetworkError(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::NoAuthData => {
                "Authentication incomplete. Please try logging in again.".to_string()
            }
            AuthError::ExchangeError(message) if message.trim().is_empty() => {
                "Failed to complete authentication".to_string()
            }
            AuthError::ExchangeError(message) => message.clone(),
            AuthError::OAuthInitError(_) => "Failed to initiate Google login.".to_string(),
            AuthError::Unauthorized => {
                "Failed to fetch service data. Your session may have expired.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_detail_is_verbatim() {
        let err = AuthError::SignupError("User already registered".to_string());
        assert_eq!(err.user_message(), "User already registered");
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn test_exchange_error_fallback_message() {
        assert_eq!(
            AuthError::ExchangeError(String::new()).user_message(),
            "Failed to complete authentication"
        );
        assert_eq!(
            AuthError::ExchangeError("invalid flow state".to_string()).user_message(),
            "invalid flow state"
        );
    }

    #[test]
    fn test_network_message_hides_transport_detail() {
        let err = AuthError::NetworkError("connection refused (os error 111)".to_string());
        assert!(!err.user_message().contains("os error"));
    }
}
