use std::fmt;

use thiserror::Error;
use url::Url;

/// Social login providers the client can start a flow for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session as reported by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl ProviderSession {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }
}

impl fmt::Debug for ProviderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSession")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Identity provider is not configured: {0}")]
    Misconfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Message supplied by the provider.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Client-side surface of the identity provider.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    /// URL to send the user agent to. PKCE state, if any, stays in the client.
    async fn initiate_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
    ) -> Result<Url, ProviderError>;

    /// Trade an authorization code for a session. `Ok(None)` means the
    /// provider answered without a session and without an error.
    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> Result<Option<ProviderSession>, ProviderError>;

    /// Session the provider client already holds, if any.
    async fn current_session(&self) -> Option<ProviderSession>;
}
