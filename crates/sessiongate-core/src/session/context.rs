use std::sync::Arc;

use tracing::info;

use crate::auth::{Session, TokenStore};
use crate::config::{Config, RedirectDelays};

/// The one source of truth for authentication state, handed to every page.
///
/// Clones share the same token store.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<TokenStore>,
    delays: RedirectDelays,
}

impl SessionContext {
    pub fn new(store: TokenStore, delays: RedirectDelays) -> Self {
        Self {
            store: Arc::new(store),
            delays,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(TokenStore::from_config(config), config.redirect_delays)
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn delays(&self) -> &RedirectDelays {
        &self.delays
    }

    pub fn token(&self) -> Option<String> {
        self.store.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Persist a freshly obtained session.
    pub fn establish(&self, session: &Session) {
        self.store.set(&session.token);
        info!(obtained_at = %session.obtained_at, "Session established");
    }

    /// Forget the session locally. The backend is not told.
    pub fn end(&self) {
        self.store.clear();
        info!("Session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_store() {
        let ctx = SessionContext::new(TokenStore::in_memory(), RedirectDelays::default());
        let other = ctx.clone();

        ctx.establish(&Session::new("t"));
        assert!(other.is_authenticated());
        assert_eq!(other.token().as_deref(), Some("t"));

        other.end();
        assert!(!ctx.is_authenticated());
    }
}
