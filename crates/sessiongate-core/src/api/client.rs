//! API client for communicating with the authentication backend.
//!
//! This module provides the `ApiClient` struct for password login, signup,
//! the public and protected page payloads, and the backend's OAuth helpers.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::config::Config;
use crate::models::{
    GoogleLoginUrl, HealthStatus, HomeData, ServiceData, TokenResponse, VerifyResponse,
};

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The backend calls the auth gateway and the pages depend on.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// `POST /login`
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;

    /// `POST /signup`
    async fn signup(&self, credentials: &Credentials) -> Result<(), ApiError>;

    /// `GET /home`, sent without credentials.
    async fn home(&self) -> Result<HomeData, ApiError>;

    /// `GET /service` with `Authorization: Bearer <token>`.
    async fn service(&self, token: &str) -> Result<ServiceData, ApiError>;
}

/// API client for the authentication backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given backend.
    pub fn new(base_url: &Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client, base_url))
    }

    /// Create a client for the configured backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_base_url()?)
    }

    /// Reuse an existing connection pool.
    pub fn with_client(client: Client, base_url: &Url) -> Self {
        Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    /// Shared HTTP client, for collaborators that talk to other hosts.
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        response.json().await.map_err(|e| {
            warn!(url = url, error = %e, "Failed to parse JSON response");
            ApiError::InvalidResponse(format!("{}: {}", url, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(url = %url, authenticated = token.is_some(), "GET");

        let mut request = self.client.get(&url).header(header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        Self::parse(response, &url).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> Result<reqwest::Response, ApiError> {
        let url = self.endpoint(path);
        debug!(url = %url, "POST");

        let mut request = self.client.post(&url).header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        Self::check_response(response).await
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health", None).await
    }

    /// Ask the backend for a Google authorization URL (implicit flow).
    pub async fn google_login_url(&self) -> Result<Url, ApiError> {
        let response = self.post::<()>("/login/google", None).await?;
        let body: GoogleLoginUrl = Self::parse(response, "/login/google").await?;
        Url::parse(&body.url)
            .map_err(|e| ApiError::InvalidResponse(format!("OAuth URL {}: {}", body.url, e)))
    }

    /// Have the backend validate an access token and describe its user.
    pub async fn verify_token(&self, token: &str) -> Result<VerifyResponse, ApiError> {
        #[derive(Serialize)]
        struct VerifyRequest<'a> {
            access_token: &'a str,
        }

        let response = self
            .post("/auth/google/verify", Some(&VerifyRequest { access_token: token }))
            .await?;
        Self::parse(response, "/auth/google/verify").await
    }
}

impl Backend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError> {
        let response = self.post("/login", Some(credentials)).await?;
        Self::parse(response, "/login").await
    }

    async fn signup(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post("/signup", Some(credentials)).await?;
        Ok(())
    }

    async fn home(&self) -> Result<HomeData, ApiError> {
        self.get("/home", None).await
    }

    async fn service(&self, token: &str) -> Result<ServiceData, ApiError> {
        self.get("/service", Some(token)).await
    }
}
