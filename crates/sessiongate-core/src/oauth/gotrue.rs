//! Identity provider client for GoTrue-compatible auth servers.
//!
//! Authorization-code logins use PKCE: the verifier generated by
//! `initiate_oauth` is held in memory and consumed by the next code exchange,
//! so both halves of the flow must run in the same process.

use std::sync::{Mutex, MutexGuard};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::IdentityProviderConfig;

use super::pkce::Pkce;
use super::provider::{IdentityProvider, OAuthProvider, ProviderError, ProviderSession};

/// Header carrying the project's public API key.
const API_KEY_HEADER: &str = "apikey";

#[derive(Debug, Deserialize)]
struct TokenGrantResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// The different error shapes GoTrue answers with.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

pub struct GoTrueProvider {
    client: Client,
    base_url: Option<String>,
    anon_key: String,
    pending: Mutex<Option<Pkce>>,
    session: Mutex<Option<ProviderSession>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl GoTrueProvider {
    pub fn new(client: Client, config: &IdentityProviderConfig) -> Self {
        Self {
            client,
            base_url: Some(config.url.trim_end_matches('/').to_string()),
            anon_key: config.anon_key.clone(),
            pending: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    /// A provider with no server behind it: initiation and exchange fail as
    /// misconfigured, and there is never a current session.
    pub fn unconfigured(client: Client) -> Self {
        Self {
            client,
            base_url: None,
            anon_key: String::new(),
            pending: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    pub fn from_config(client: Client, config: Option<&IdentityProviderConfig>) -> Self {
        match config {
            Some(config) => Self::new(client, config),
            None => Self::unconfigured(client),
        }
    }

    fn base_url(&self) -> Result<&str, ProviderError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| ProviderError::Misconfigured("no identity provider URL".to_string()))?;
        if self.anon_key.trim().is_empty() {
            return Err(ProviderError::Misconfigured(
                "no identity provider API key".to_string(),
            ));
        }
        Ok(base)
    }

    fn error_message(body: &str) -> Option<String> {
        serde_json::from_str::<GoTrueErrorBody>(body)
            .ok()
            .and_then(GoTrueErrorBody::into_message)
    }
}

impl IdentityProvider for GoTrueProvider {
    async fn initiate_oauth(
        &self,
        provider: OAuthProvider,
        redirect_url: &Url,
    ) -> Result<Url, ProviderError> {
        let base = self.base_url()?;
        let mut url = Url::parse(&format!("{}/auth/v1/authorize", base))
            .map_err(|e| ProviderError::Misconfigured(format!("invalid provider URL: {}", e)))?;

        let pkce = Pkce::generate();
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_url.as_str())
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "s256");

        *lock(&self.pending) = Some(pkce);
        info!(provider = %provider, "OAuth flow initiated");
        Ok(url)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
    ) -> Result<Option<ProviderSession>, ProviderError> {
        #[derive(Serialize)]
        struct PkceGrant<'a> {
            auth_code: &'a str,
            code_verifier: &'a str,
        }

        let base = self.base_url()?;
        let pkce = lock(&self.pending).take().ok_or_else(|| {
            ProviderError::Rejected(
                "No pending login for this authorization code. Please start the login again."
                    .to_string(),
            )
        })?;

        let url = format!("{}/auth/v1/token?grant_type=pkce", base);
        debug!(url = %url, "Exchanging authorization code");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.anon_key)
            .json(&PkceGrant {
                auth_code: code,
                code_verifier: &pkce.verifier,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, "Authorization code exchange rejected");
            let message = Self::error_message(&body)
                .unwrap_or_else(|| format!("Code exchange failed with status {}", status));
            return Err(ProviderError::Rejected(message));
        }

        let grant: TokenGrantResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let session = grant
            .access_token
            .filter(|t| !t.is_empty())
            .map(|access_token| ProviderSession {
                access_token,
                refresh_token: grant.refresh_token,
            });

        if let Some(ref session) = session {
            *lock(&self.session) = Some(session.clone());
        }
        Ok(session)
    }

    async fn current_session(&self) -> Option<ProviderSession> {
        lock(&self.session).clone()
    }
}
