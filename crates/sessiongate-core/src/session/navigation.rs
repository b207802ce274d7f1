//! Where pages send the user, and redirects that fire later.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

/// In-app navigation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Route {
    Home,
    Service,
    Login,
    Signup,
    Callback,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/home",
            Route::Service => "/service",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Callback => "/auth/callback",
        }
    }

    /// Pages that require a stored token.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Service)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Moves the user agent.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);

    /// Leave the application for an external page (OAuth providers).
    fn open_external(&self, url: &Url);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Route(Route),
    External(Url),
}

/// Navigator that reports every navigation on a channel; the front end
/// decides what to do with it.
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationEvent>,
}

impl ChannelNavigator {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<NavigationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }

    fn send(&self, event: NavigationEvent) {
        if self.tx.send(event).is_err() {
            debug!("Navigation receiver gone, dropping event");
        }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        self.send(NavigationEvent::Route(route));
    }

    fn open_external(&self, url: &Url) {
        self.send(NavigationEvent::External(url.clone()));
    }
}

/// A navigation that fires after a delay unless cancelled first.
/// Dropping it cancels it.
pub struct ScheduledRedirect {
    route: Route,
    handle: JoinHandle<()>,
}

impl ScheduledRedirect {
    /// Must be called from within a tokio runtime.
    pub fn schedule(navigator: Arc<dyn Navigator>, route: Route, delay: Duration) -> Self {
        let sleep = tokio::time::sleep(delay);
        let handle = tokio::spawn(async move {
            sleep.await;
            debug!(route = %route, "Scheduled redirect firing");
            navigator.navigate(route);
        });
        Self { route, handle }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn has_fired(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(route = %self.route, "Cancelling scheduled redirect");
            self.handle.abort();
        }
    }
}

impl Drop for ScheduledRedirect {
    fn drop(&mut self) {
        self.cancel();
    }
}
