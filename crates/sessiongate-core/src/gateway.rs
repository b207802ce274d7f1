//! Credential exchange: password login, signup, and OAuth completion.
//!
//! The gateway only produces sessions; persisting them is up to the caller
//! (see `session::SessionContext`).

use tracing::{debug, info, warn};
use url::Url;

use crate::api::{ApiError, Backend};
use crate::auth::{Credentials, Session};
use crate::error::AuthError;
use crate::oauth::extract::{existing_session, grants, OAuthGrant, RedirectContext};
use crate::oauth::{IdentityProvider, OAuthProvider, ProviderError};

/// Result of a successful signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The follow-up login worked; the user is signed in.
    LoggedIn(Session),
    /// The account exists but the follow-up login failed; the user should
    /// log in manually.
    LoginRequired,
}

pub struct AuthGateway<B, P> {
    backend: B,
    provider: P,
    redirect_url: Url,
}

impl<B: Backend, P: IdentityProvider> AuthGateway<B, P> {
    pub fn new(backend: B, provider: P, redirect_url: Url) -> Self {
        Self {
            backend,
            provider,
            redirect_url,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn redirect_url(&self) -> &Url {
        &self.redirect_url
    }

    pub async fn login_with_password(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        match self.backend.login(credentials).await {
            Ok(response) => {
                info!("Password login succeeded");
                Ok(Session::new(response.access_token))
            }
            Err(ApiError::NetworkError(reason)) => {
                warn!(error = %reason, "Password login could not reach the backend");
                Err(AuthError::NetworkError(reason))
            }
            Err(e) => {
                debug!(error = %e, "Password login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Create the account, then try to log in with the same credentials.
    pub async fn signup(&self, credentials: &Credentials) -> Result<SignupOutcome, AuthError> {
        match self.backend.signup(credentials).await {
            Ok(()) => info!("Signup succeeded"),
            Err(ApiError::NetworkError(reason)) => {
                warn!(error = %reason, "Signup could not reach the backend");
                return Err(AuthError::NetworkError(reason));
            }
            Err(e) => {
                debug!(error = %e, "Signup rejected");
                let detail = e.detail().unwrap_or("Signup failed").to_string();
                return Err(AuthError::SignupError(detail));
            }
        }

        match self.login_with_password(credentials).await {
            Ok(session) => Ok(SignupOutcome::LoggedIn(session)),
            Err(e) => {
                warn!(error = %e, "Login after signup failed, manual login required");
                Ok(SignupOutcome::LoginRequired)
            }
        }
    }

    /// Authorization URL the user agent should be sent to.
    pub async fn initiate_oauth(&self, provider: OAuthProvider) -> Result<Url, AuthError> {
        self.provider
            .initiate_oauth(provider, &self.redirect_url)
            .await
            .map_err(|e| {
                warn!(provider = %provider, error = %e, "OAuth initiation failed");
                AuthError::OAuthInitError(e.to_string())
            })
    }

    /// Turn the URL the provider redirected back to into a session.
    pub async fn complete_oauth_redirect(&self, url: &str) -> Result<Session, AuthError> {
        let url = Url::parse(url).map_err(|e| {
            warn!(error = %e, "Unparseable OAuth redirect URL");
            AuthError::NoAuthData
        })?;

        let ctx = RedirectContext {
            url: &url,
            existing_session: None,
        };
        for grant in grants(&ctx) {
            if let Some(result) = self.redeem(grant).await {
                return result;
            }
        }

        // Only ask the provider once the redirect itself carried nothing usable.
        let existing = self.provider.current_session().await;
        let fallback = RedirectContext {
            url: &url,
            existing_session: existing.as_ref(),
        };
        if let Some(grant) = existing_session(&fallback) {
            if let Some(result) = self.redeem(grant).await {
                return result;
            }
        }

        warn!("No authentication data found in redirect");
        Err(AuthError::NoAuthData)
    }

    /// `None` when the grant yields no session and the next source should
    /// be tried.
    async fn redeem(&self, grant: OAuthGrant) -> Option<Result<Session, AuthError>> {
        match grant {
            OAuthGrant::AuthorizationCode(code) => {
                debug!("Authorization code found, exchanging");
                match self.provider.exchange_code_for_session(&code).await {
                    Ok(Some(session)) => {
                        info!("Authorization code exchanged for session");
                        Some(Ok(Session::new(session.access_token)))
                    }
                    Ok(None) => {
                        debug!("Code exchange returned no session, trying next source");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "Authorization code exchange failed");
                        Some(Err(exchange_error(e)))
                    }
                }
            }
            OAuthGrant::ImplicitToken(token) => {
                info!("Implicit-flow token found in redirect");
                Some(Ok(Session::new(token)))
            }
            OAuthGrant::ExistingSession(session) => {
                info!("Reusing active identity provider session");
                Some(Ok(Session::new(session.access_token)))
            }
        }
    }
}

fn exchange_error(err: ProviderError) -> AuthError {
    match err {
        ProviderError::Rejected(message) => AuthError::ExchangeError(message),
        other => AuthError::ExchangeError(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted collaborators shared by the gateway and page tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::models::{HomeData, ServiceData, TokenResponse};
    use crate::oauth::ProviderSession;

    pub struct MockBackend {
        pub login: Mutex<Vec<Result<TokenResponse, ApiError>>>,
        pub signup: Result<(), ApiError>,
        pub home: Result<HomeData, ApiError>,
        pub service: Result<ServiceData, ApiError>,
        pub login_calls: AtomicUsize,
        pub home_calls: AtomicUsize,
        pub service_calls: AtomicUsize,
        pub service_tokens: Mutex<Vec<String>>,
    }

    pub fn token(value: &str) -> TokenResponse {
        TokenResponse {
            access_token: value.to_string(),
            token_type: Some("bearer".to_string()),
        }
    }

    pub fn home_data() -> HomeData {
        HomeData {
            message: "Welcome to the home page!".to_string(),
            description: "This is a public endpoint accessible to everyone.".to_string(),
        }
    }

    pub fn service_data() -> ServiceData {
        ServiceData {
            message: "Welcome to the service page, a@example.com!".to_string(),
            description: "This is a protected endpoint. You are authenticated.".to_string(),
            user_id: "user-1".to_string(),
        }
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self {
                login: Mutex::new(vec![Ok(token("backend-token"))]),
                signup: Ok(()),
                home: Ok(home_data()),
                service: Ok(service_data()),
                login_calls: AtomicUsize::new(0),
                home_calls: AtomicUsize::new(0),
                service_calls: AtomicUsize::new(0),
                service_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockBackend {
        pub fn with_login(result: Result<TokenResponse, ApiError>) -> Self {
            Self {
                login: Mutex::new(vec![result]),
                ..Self::default()
            }
        }
    }

    impl Backend for MockBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<TokenResponse, ApiError> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.login.lock().unwrap();
            if script.len() > 1 {
                script.remove(0)
            } else {
                script[0].clone()
            }
        }

        async fn signup(&self, _credentials: &Credentials) -> Result<(), ApiError> {
            self.signup.clone()
        }

        async fn home(&self) -> Result<HomeData, ApiError> {
            self.home_calls.fetch_add(1, Ordering::SeqCst);
            self.home.clone()
        }

        async fn service(&self, token: &str) -> Result<ServiceData, ApiError> {
            self.service_calls.fetch_add(1, Ordering::SeqCst);
            self.service_tokens.lock().unwrap().push(token.to_string());
            self.service.clone()
        }
    }

    #[derive(Default)]
    pub struct MockProvider {
        pub exchange: Option<Result<Option<ProviderSession>, ProviderError>>,
        pub current: Option<ProviderSession>,
        pub initiate_error: Option<ProviderError>,
        pub exchanged_codes: Mutex<Vec<String>>,
        pub session_lookups: AtomicUsize,
    }

    impl IdentityProvider for MockProvider {
        async fn initiate_oauth(
            &self,
            provider: OAuthProvider,
            redirect_url: &Url,
        ) -> Result<Url, ProviderError> {
            if let Some(ref e) = self.initiate_error {
                return Err(e.clone());
            }
            let mut url = Url::parse("https://idp.example.com/auth/v1/authorize").unwrap();
            url.query_pairs_mut()
                .append_pair("provider", provider.as_str())
                .append_pair("redirect_to", redirect_url.as_str());
            Ok(url)
        }

        async fn exchange_code_for_session(
            &self,
            code: &str,
        ) -> Result<Option<ProviderSession>, ProviderError> {
            self.exchanged_codes.lock().unwrap().push(code.to_string());
            self.exchange
                .clone()
                .unwrap_or_else(|| Ok(Some(ProviderSession::new(format!("exchanged-{}", code)))))
        }

        async fn current_session(&self) -> Option<ProviderSession> {
            self.session_lookups.fetch_add(1, Ordering::SeqCst);
            self.current.clone()
        }
    }

    pub fn redirect_url() -> Url {
        Url::parse("http://localhost:3000/auth/callback").unwrap()
    }

    pub fn gateway(backend: MockBackend, provider: MockProvider) -> AuthGateway<MockBackend, MockProvider> {
        AuthGateway::new(backend, provider, redirect_url())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testing::*;
    use super::*;
    use crate::oauth::ProviderSession;

    fn creds() -> Credentials {
        Credentials::new("a@example.com", "correct horse")
    }

    #[tokio::test]
    async fn test_login_success() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        let session = gw.login_with_password(&creds()).await.unwrap();
        assert_eq!(session.token, "backend-token");
    }

    #[tokio::test]
    async fn test_login_rejected_is_invalid_credentials() {
        let gw = gateway(
            MockBackend::with_login(Err(ApiError::Unauthorized)),
            MockProvider::default(),
        );
        assert_eq!(
            gw.login_with_password(&creds()).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_login_unreadable_body_is_invalid_credentials() {
        let gw = gateway(
            MockBackend::with_login(Err(ApiError::InvalidResponse("eof".to_string()))),
            MockProvider::default(),
        );
        assert_eq!(
            gw.login_with_password(&creds()).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_login_transport_failure() {
        let gw = gateway(
            MockBackend::with_login(Err(ApiError::NetworkError("refused".to_string()))),
            MockProvider::default(),
        );
        assert_eq!(
            gw.login_with_password(&creds()).await,
            Err(AuthError::NetworkError("refused".to_string()))
        );
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        match gw.signup(&creds()).await.unwrap() {
            SignupOutcome::LoggedIn(session) => assert_eq!(session.token, "backend-token"),
            other => panic!("expected LoggedIn, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signup_succeeds_when_followup_login_fails() {
        let gw = gateway(
            MockBackend::with_login(Err(ApiError::Unauthorized)),
            MockProvider::default(),
        );
        assert_eq!(gw.signup(&creds()).await, Ok(SignupOutcome::LoginRequired));
        assert_eq!(gw.backend().login_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_signup_error_detail_is_verbatim() {
        let backend = MockBackend {
            signup: Err(ApiError::Rejected {
                status: 400,
                body: r#"{"detail": "User already registered"}"#.to_string(),
                detail: Some("User already registered".to_string()),
            }),
            ..MockBackend::default()
        };
        let gw = gateway(backend, MockProvider::default());
        assert_eq!(
            gw.signup(&creds()).await,
            Err(AuthError::SignupError("User already registered".to_string()))
        );
        assert_eq!(gw.backend().login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signup_error_without_detail() {
        let backend = MockBackend {
            signup: Err(ApiError::ServerError("boom".to_string())),
            ..MockBackend::default()
        };
        let gw = gateway(backend, MockProvider::default());
        assert_eq!(
            gw.signup(&creds()).await,
            Err(AuthError::SignupError("Signup failed".to_string()))
        );
    }

    #[tokio::test]
    async fn test_oauth_code_takes_priority_over_fragment() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback?code=abc#access_token=xyz")
            .await
            .unwrap();
        assert_eq!(session.token, "exchanged-abc");
        assert_eq!(*gw.provider().exchanged_codes.lock().unwrap(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_oauth_implicit_token_skips_exchange() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback#access_token=xyz&token_type=bearer")
            .await
            .unwrap();
        assert_eq!(session.token, "xyz");
        assert!(gw.provider().exchanged_codes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oauth_existing_session_fallback() {
        let provider = MockProvider {
            current: Some(ProviderSession::new("already-here")),
            ..MockProvider::default()
        };
        let gw = gateway(MockBackend::default(), provider);
        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback")
            .await
            .unwrap();
        assert_eq!(session.token, "already-here");
    }

    #[tokio::test]
    async fn test_oauth_provider_session_not_consulted_when_redirect_has_grant() {
        let provider = MockProvider {
            current: Some(ProviderSession::new("already-here")),
            ..MockProvider::default()
        };
        let gw = gateway(MockBackend::default(), provider);

        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback?code=abc")
            .await
            .unwrap();
        assert_eq!(session.token, "exchanged-abc");
        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback#access_token=xyz")
            .await
            .unwrap();
        assert_eq!(session.token, "xyz");
        assert_eq!(gw.provider().session_lookups.load(Ordering::SeqCst), 0);

        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback")
            .await
            .unwrap();
        assert_eq!(session.token, "already-here");
        assert_eq!(gw.provider().session_lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oauth_no_auth_data() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        assert_eq!(
            gw.complete_oauth_redirect("http://localhost:3000/auth/callback").await,
            Err(AuthError::NoAuthData)
        );
        assert_eq!(
            gw.complete_oauth_redirect("not a url").await,
            Err(AuthError::NoAuthData)
        );
    }

    #[tokio::test]
    async fn test_oauth_exchange_error_uses_provider_message() {
        let provider = MockProvider {
            exchange: Some(Err(ProviderError::Rejected("invalid flow state".to_string()))),
            ..MockProvider::default()
        };
        let gw = gateway(MockBackend::default(), provider);
        assert_eq!(
            gw.complete_oauth_redirect("http://localhost:3000/auth/callback?code=abc#access_token=xyz")
                .await,
            Err(AuthError::ExchangeError("invalid flow state".to_string()))
        );
    }

    #[tokio::test]
    async fn test_oauth_empty_exchange_falls_through() {
        let provider = MockProvider {
            exchange: Some(Ok(None)),
            ..MockProvider::default()
        };
        let gw = gateway(MockBackend::default(), provider);
        let session = gw
            .complete_oauth_redirect("http://localhost:3000/auth/callback?code=abc#access_token=xyz")
            .await
            .unwrap();
        assert_eq!(session.token, "xyz");
    }

    #[tokio::test]
    async fn test_initiate_oauth_passes_redirect_url() {
        let gw = gateway(MockBackend::default(), MockProvider::default());
        let url = gw.initiate_oauth(OAuthProvider::Google).await.unwrap();
        assert!(url.as_str().contains("provider=google"));
        assert!(url.as_str().contains("redirect_to=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
    }

    #[tokio::test]
    async fn test_initiate_oauth_failure() {
        let provider = MockProvider {
            initiate_error: Some(ProviderError::Misconfigured("no key".to_string())),
            ..MockProvider::default()
        };
        let gw = gateway(MockBackend::default(), provider);
        assert!(matches!(
            gw.initiate_oauth(OAuthProvider::Google).await,
            Err(AuthError::OAuthInitError(_))
        ));
    }
}
