//! The per-page state machine.
//!
//! `Idle -> Loading -> {Ready, Unauthorized, Error}`. A controller serves one
//! page mount: once settled it stays settled, and dropping it cancels any
//! redirect it scheduled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::ApiError;

use super::context::SessionContext;
use super::navigation::{Navigator, Route, ScheduledRedirect};
use super::state::{PageState, PageStatus};

/// Shown when a protected page is opened without a stored token.
const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to view this page.";

/// Shown when the protected fetch fails for any reason.
const SESSION_EXPIRED_MESSAGE: &str = "Failed to fetch service data. Your session may have expired.";

pub struct SessionController<T> {
    context: SessionContext,
    navigator: Arc<dyn Navigator>,
    state: PageState<T>,
    redirect: Option<ScheduledRedirect>,
}

impl<T> SessionController<T> {
    pub fn new(context: SessionContext, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            context,
            navigator,
            state: PageState::idle(),
            redirect: None,
        }
    }

    pub fn state(&self) -> &PageState<T> {
        &self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Route of a redirect that is scheduled and has not fired yet.
    pub fn pending_redirect(&self) -> Option<Route> {
        self.redirect
            .as_ref()
            .filter(|r| !r.has_fired())
            .map(ScheduledRedirect::route)
    }

    /// Call-to-action choice for public pages: logout iff a token is stored.
    pub fn offers_logout(&self) -> bool {
        self.context.is_authenticated()
    }

    fn already_mounted(&self) -> bool {
        if self.state.status != PageStatus::Idle {
            debug!(status = ?self.state.status, "Page already mounted, ignoring");
            return true;
        }
        false
    }

    /// Mount a public page: always fetch, never gated on the token.
    pub async fn mount_public<F, Fut>(&mut self, fetch: F) -> &PageState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.already_mounted() {
            return &self.state;
        }

        self.state = PageState::loading();
        self.state = match fetch().await {
            Ok(data) => PageState::ready(data),
            Err(e) => {
                warn!(error = %e, "Public page fetch failed");
                PageState::error(public_failure_message(&e))
            }
        };
        &self.state
    }

    /// Mount a protected page: no token means no request at all; a failed
    /// fetch, whatever the cause, ends the session.
    pub async fn mount_protected<F, Fut>(&mut self, fetch: F) -> &PageState<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.already_mounted() {
            return &self.state;
        }

        let Some(token) = self.context.token() else {
            info!("No stored token, redirecting to login");
            self.state = PageState::unauthorized(LOGIN_REQUIRED_MESSAGE);
            self.navigate(Route::Login);
            return &self.state;
        };

        self.state = PageState::loading();
        match fetch(token).await {
            Ok(data) => {
                self.state = PageState::ready(data);
            }
            Err(e) => {
                if e.is_auth_failure() {
                    info!(error = %e, "Backend rejected the stored token");
                } else {
                    warn!(error = %e, "Protected fetch failed, treating as unauthorized");
                }
                self.state = PageState::unauthorized(SESSION_EXPIRED_MESSAGE);
                self.context.end();
                let delay = self.context.delays().unauthorized();
                self.redirect_after(Route::Login, delay);
            }
        }
        &self.state
    }

    /// Drop the local session and go to the public landing page.
    /// Only available once the page is `Ready`.
    pub fn logout(&mut self) -> bool {
        if !self.state.is_ready() {
            debug!(status = ?self.state.status, "Logout ignored, page not ready");
            return false;
        }
        self.context.end();
        self.navigate(Route::Home);
        true
    }

    pub(crate) fn set_state(&mut self, state: PageState<T>) {
        self.state = state;
    }

    pub(crate) fn navigate(&self, route: Route) {
        debug!(route = %route, "Navigating");
        self.navigator.navigate(route);
    }

    pub(crate) fn open_external(&self, url: &url::Url) {
        debug!(host = ?url.host_str(), "Opening external page");
        self.navigator.open_external(url);
    }

    /// Replaces any redirect scheduled earlier.
    pub(crate) fn redirect_after(&mut self, route: Route, delay: Duration) {
        if delay.is_zero() {
            self.redirect = None;
            self.navigate(route);
            return;
        }
        debug!(route = %route, delay_ms = delay.as_millis() as u64, "Scheduling redirect");
        self.redirect = Some(ScheduledRedirect::schedule(
            Arc::clone(&self.navigator),
            route,
            delay,
        ));
    }
}

fn public_failure_message(err: &ApiError) -> String {
    if err.is_network() {
        "Unable to connect to server. Check your internet connection.".to_string()
    } else {
        "Failed to load page data.".to_string()
    }
}
