//! Subcommand handlers.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use sessiongate_core::{
    ApiClient, AuthGateway, CallbackPage, ChannelNavigator, Config, Credentials, GoTrueProvider,
    HomePage, LoginPage, NavigationEvent, Navigator, OAuthProvider, PageStatus, Route, ServicePage,
    SessionContext, SignupPage,
};

use crate::render;

pub struct App {
    context: SessionContext,
    gateway: AuthGateway<ApiClient, GoTrueProvider>,
    navigator: Arc<ChannelNavigator>,
    events: UnboundedReceiver<NavigationEvent>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let context = SessionContext::from_config(config);
        let api = ApiClient::from_config(config)?;
        let provider =
            GoTrueProvider::from_config(api.http().clone(), config.identity_provider.as_ref());
        let gateway = AuthGateway::new(api, provider, config.oauth_redirect_url()?);
        let (navigator, events) = ChannelNavigator::new();

        Ok(Self {
            context,
            gateway,
            navigator,
            events,
        })
    }

    fn navigator(&self) -> Arc<dyn Navigator> {
        self.navigator.clone()
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub async fn home(&mut self) -> Result<()> {
        let mut page = HomePage::new(self.context.clone(), self.navigator(), self.gateway.backend());
        render::home(page.mount().await);

        if page.offers_logout() {
            println!("\nLogged in. Run `sessiongate service` or `sessiongate logout`.");
        } else {
            println!("\nRun `sessiongate login` or `sessiongate signup` to get started.");
        }
        settled(page.state().status)
    }

    pub async fn service(&mut self) -> Result<()> {
        let mut page =
            ServicePage::new(self.context.clone(), self.navigator(), self.gateway.backend());
        render::service(page.mount().await);

        follow(&mut self.events, page.pending_redirect()).await;
        settled(page.state().status)
    }

    pub async fn login_password(&mut self, email: Option<String>) -> Result<()> {
        let credentials = prompt_credentials(email)?;
        println!("\nAuthenticating...");

        let mut page = LoginPage::new(self.context.clone(), self.navigator(), &self.gateway);
        let state = page.submit(&credentials).await;
        if state.status == PageStatus::Ready {
            println!("Login successful!");
        }
        render::status(state);

        follow(&mut self.events, None).await;
        settled(page.state().status)
    }

    pub async fn login_google(&mut self, via_backend: bool) -> Result<()> {
        if via_backend {
            let url = self
                .gateway
                .backend()
                .google_login_url()
                .await
                .context("Failed to initiate Google login.")?;
            render::navigation(&NavigationEvent::External(url));
        } else {
            let mut page = LoginPage::new(self.context.clone(), self.navigator(), &self.gateway);
            render::status(page.start_oauth(OAuthProvider::Google).await);
            follow(&mut self.events, None).await;
            settled(page.state().status)?;
        }

        // The code verifier lives in this process, so the redirect has to
        // come back here rather than to a fresh invocation.
        let redirect = prompt("Paste the URL you were redirected to: ")?;
        if redirect.is_empty() {
            bail!("No redirect URL given");
        }
        self.callback(&redirect).await
    }

    pub async fn signup(&mut self, email: Option<String>) -> Result<()> {
        let credentials = prompt_credentials(email)?;
        println!("\nCreating account...");

        let mut page = SignupPage::new(self.context.clone(), self.navigator(), &self.gateway);
        let state = page.submit(&credentials).await;
        if state.status == PageStatus::Ready && state.message.is_none() {
            println!("Account created and logged in!");
        }
        render::status(state);

        follow(&mut self.events, None).await;
        settled(page.state().status)
    }

    pub async fn callback(&mut self, url: &str) -> Result<()> {
        let mut page = CallbackPage::new(self.context.clone(), self.navigator(), &self.gateway);
        render::status(page.mount(url).await);

        follow(&mut self.events, page.pending_redirect()).await;
        settled(page.state().status)
    }

    // ========================================================================
    // Session commands
    // ========================================================================

    pub fn logout(&mut self) -> Result<()> {
        if !self.context.is_authenticated() {
            println!("No session stored.");
            return Ok(());
        }
        self.context.end();
        info!("Session cleared from the command line");
        println!("Logged out.");
        Ok(())
    }

    pub async fn status(&mut self) -> Result<()> {
        if !self.context.store().is_available() {
            println!("Session:  token storage unavailable");
        } else if self.context.is_authenticated() {
            println!("Session:  logged in");
        } else {
            println!("Session:  not logged in");
        }

        let api = self.gateway.backend();
        match api.health().await {
            Ok(health) if health.is_ok() => println!("Backend:  {} (ok)", api.base_url()),
            Ok(health) => println!("Backend:  {} ({})", api.base_url(), health.status),
            Err(e) => {
                warn!(error = %e, "Health check failed");
                println!("Backend:  {} (unreachable: {})", api.base_url(), e);
            }
        }
        Ok(())
    }

    pub async fn verify(&mut self) -> Result<()> {
        let Some(token) = self.context.token() else {
            bail!("Not logged in. Run `sessiongate login` first.");
        };

        let verified = self
            .gateway
            .backend()
            .verify_token(&token)
            .await
            .context("Token verification failed")?;

        println!("Token is valid.");
        println!("User ID: {}", verified.user.id);
        if let Some(email) = verified.user.email {
            println!("Email:   {}", email);
        }
        Ok(())
    }
}

/// Wait for a scheduled redirect, then print every navigation the page made.
/// The page owning the redirect must still be alive while this runs.
async fn follow(events: &mut UnboundedReceiver<NavigationEvent>, pending: Option<Route>) {
    if let Some(route) = pending {
        debug!(route = %route, "Waiting for scheduled redirect");
        match events.recv().await {
            Some(event) => render::navigation(&event),
            None => return,
        }
    }
    while let Ok(event) = events.try_recv() {
        render::navigation(&event);
    }
}

/// Map a final page status to the process outcome. The message has already
/// been printed.
fn settled(status: PageStatus) -> Result<()> {
    match status {
        PageStatus::Error | PageStatus::Unauthorized => bail!("{}", status_label(status)),
        _ => Ok(()),
    }
}

fn status_label(status: PageStatus) -> &'static str {
    match status {
        PageStatus::Unauthorized => "not authorized",
        _ => "request failed",
    }
}

// ============================================================================
// Prompts
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_credentials(email: Option<String>) -> Result<Credentials> {
    let email = match email {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;
    Ok(Credentials::new(email, password))
}
