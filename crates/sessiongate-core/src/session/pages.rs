//! The application's pages, each a thin shell around a `SessionController`.
//!
//! Home is public, Service is protected. Login, Signup and Callback run the
//! auth flows and persist whatever session the gateway produces.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::Backend;
use crate::auth::Credentials;
use crate::gateway::{AuthGateway, SignupOutcome};
use crate::models::{HomeData, ServiceData};
use crate::oauth::{IdentityProvider, OAuthProvider};

use super::context::SessionContext;
use super::controller::SessionController;
use super::navigation::{Navigator, Route};
use super::state::PageState;

const CREDENTIALS_REQUIRED_MESSAGE: &str = "Email and password are required";

/// Public landing page (`/home`).
pub struct HomePage<'a, B> {
    backend: &'a B,
    controller: SessionController<HomeData>,
}

impl<'a, B: Backend> HomePage<'a, B> {
    pub fn new(context: SessionContext, navigator: Arc<dyn Navigator>, backend: &'a B) -> Self {
        Self {
            backend,
            controller: SessionController::new(context, navigator),
        }
    }

    pub async fn mount(&mut self) -> &PageState<HomeData> {
        let backend = self.backend;
        self.controller.mount_public(|| backend.home()).await
    }

    pub fn state(&self) -> &PageState<HomeData> {
        self.controller.state()
    }

    /// Logged-in visitors get a logout control, everyone else login/signup.
    pub fn offers_logout(&self) -> bool {
        self.controller.offers_logout()
    }

    pub fn logout(&mut self) -> bool {
        self.controller.logout()
    }
}

/// Token-protected page (`/service`).
pub struct ServicePage<'a, B> {
    backend: &'a B,
    controller: SessionController<ServiceData>,
}

impl<'a, B: Backend> ServicePage<'a, B> {
    pub fn new(context: SessionContext, navigator: Arc<dyn Navigator>, backend: &'a B) -> Self {
        Self {
            backend,
            controller: SessionController::new(context, navigator),
        }
    }

    pub async fn mount(&mut self) -> &PageState<ServiceData> {
        let backend = self.backend;
        self.controller
            .mount_protected(|token| async move { backend.service(&token).await })
            .await
    }

    pub fn state(&self) -> &PageState<ServiceData> {
        self.controller.state()
    }

    pub fn pending_redirect(&self) -> Option<Route> {
        self.controller.pending_redirect()
    }

    pub fn logout(&mut self) -> bool {
        self.controller.logout()
    }
}

/// Email/password and social login (`/login`).
pub struct LoginPage<'a, B, P> {
    gateway: &'a AuthGateway<B, P>,
    controller: SessionController<()>,
}

impl<'a, B: Backend, P: IdentityProvider> LoginPage<'a, B, P> {
    pub fn new(
        context: SessionContext,
        navigator: Arc<dyn Navigator>,
        gateway: &'a AuthGateway<B, P>,
    ) -> Self {
        Self {
            gateway,
            controller: SessionController::new(context, navigator),
        }
    }

    pub fn state(&self) -> &PageState<()> {
        self.controller.state()
    }

    /// On success the session is stored and the user lands on `/service`.
    /// Failures stay on this page with a message.
    pub async fn submit(&mut self, credentials: &Credentials) -> &PageState<()> {
        if !credentials.is_complete() {
            self.controller
                .set_state(PageState::error(CREDENTIALS_REQUIRED_MESSAGE));
            return self.controller.state();
        }

        self.controller.set_state(PageState::loading());
        match self.gateway.login_with_password(credentials).await {
            Ok(session) => {
                self.controller.context().establish(&session);
                self.controller.set_state(PageState::ready(()));
                self.controller.navigate(Route::Service);
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.controller.set_state(PageState::error(e.user_message()));
            }
        }
        self.controller.state()
    }

    /// Send the user agent to the provider. Nothing else happens here; the
    /// flow resumes on the callback page.
    pub async fn start_oauth(&mut self, provider: OAuthProvider) -> &PageState<()> {
        self.controller.set_state(PageState::loading());
        match self.gateway.initiate_oauth(provider).await {
            Ok(url) => {
                info!(provider = %provider, "Redirecting to identity provider");
                self.controller.set_state(
                    PageState::loading()
                        .with_message(format!("Redirecting to {}...", provider.display_name())),
                );
                self.controller.open_external(&url);
            }
            Err(e) => {
                self.controller.set_state(PageState::error(e.user_message()));
            }
        }
        self.controller.state()
    }
}

/// Account creation (`/signup`).
pub struct SignupPage<'a, B, P> {
    gateway: &'a AuthGateway<B, P>,
    controller: SessionController<()>,
}

impl<'a, B: Backend, P: IdentityProvider> SignupPage<'a, B, P> {
    pub fn new(
        context: SessionContext,
        navigator: Arc<dyn Navigator>,
        gateway: &'a AuthGateway<B, P>,
    ) -> Self {
        Self {
            gateway,
            controller: SessionController::new(context, navigator),
        }
    }

    pub fn state(&self) -> &PageState<()> {
        self.controller.state()
    }

    pub async fn submit(&mut self, credentials: &Credentials) -> &PageState<()> {
        if !credentials.is_complete() {
            self.controller
                .set_state(PageState::error(CREDENTIALS_REQUIRED_MESSAGE));
            return self.controller.state();
        }

        self.controller.set_state(PageState::loading());
        match self.gateway.signup(credentials).await {
            Ok(SignupOutcome::LoggedIn(session)) => {
                self.controller.context().establish(&session);
                self.controller.set_state(PageState::ready(()));
                self.controller.navigate(Route::Service);
            }
            Ok(SignupOutcome::LoginRequired) => {
                self.controller.set_state(
                    PageState::ready(()).with_message("Account created. Please log in."),
                );
                self.controller.navigate(Route::Login);
            }
            Err(e) => {
                warn!(error = %e, "Signup failed");
                self.controller.set_state(PageState::error(e.user_message()));
            }
        }
        self.controller.state()
    }
}

/// Where the identity provider sends the user back (`/auth/callback`).
pub struct CallbackPage<'a, B, P> {
    gateway: &'a AuthGateway<B, P>,
    controller: SessionController<()>,
}

impl<'a, B: Backend, P: IdentityProvider> CallbackPage<'a, B, P> {
    pub fn new(
        context: SessionContext,
        navigator: Arc<dyn Navigator>,
        gateway: &'a AuthGateway<B, P>,
    ) -> Self {
        Self {
            gateway,
            controller: SessionController::new(context, navigator),
        }
    }

    pub fn state(&self) -> &PageState<()> {
        self.controller.state()
    }

    pub fn pending_redirect(&self) -> Option<Route> {
        self.controller.pending_redirect()
    }

    /// Complete the OAuth flow from the URL this page was loaded with.
    pub async fn mount(&mut self, url: &str) -> &PageState<()> {
        if self.controller.state().is_settled() {
            return self.controller.state();
        }

        self.controller.set_state(
            PageState::loading().with_message("Processing authentication..."),
        );
        let delays = *self.controller.context().delays();

        match self.gateway.complete_oauth_redirect(url).await {
            Ok(session) => {
                self.controller.context().establish(&session);
                self.controller
                    .set_state(PageState::ready(()).with_message("Login successful! Redirecting..."));
                self.controller
                    .redirect_after(Route::Service, delays.callback_success());
            }
            Err(e) => {
                warn!(error = %e, "OAuth completion failed");
                self.controller.set_state(PageState::error(e.user_message()));
                self.controller
                    .redirect_after(Route::Login, delays.callback_failure());
            }
        }
        self.controller.state()
    }
}
